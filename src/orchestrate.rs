//! Scrape orchestration
//!
//! Ties the range scraper and the store together for one user-triggered
//! scrape. Each scrape runs on its own background thread and reports
//! progress through a one-directional channel; the foreground only ever
//! consumes events, it never reaches into a running task.

use crate::data::database::Database;
use crate::data::normalize::normalize_standing;
use crate::data::range::{RangeScraper, BATCH_PAUSE};
use crate::data::{MatchWindowSource, StandingsSource};
use crate::registry::CompetitionRegistry;
use crate::Standing;
use chrono::NaiveDate;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

/// Progress events emitted during a scrape, in order of occurrence.
/// `Finished` is always the last event.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeEvent {
    Started {
        competition: String,
        date_from: String,
        date_to: String,
        total_days: Option<i64>,
    },
    Info(String),
    Warn(String),
    MatchesFetched(usize),
    MatchesSaved(usize),
    StandingsUpdated(usize),
    Finished(ScrapeOutcome),
}

/// Final record counts for one scrape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeOutcome {
    pub competition: String,
    pub fetched: usize,
    pub saved: usize,
    pub standings: usize,
}

/// Drives scrape runs against a source and the store.
#[derive(Clone)]
pub struct Orchestrator<S> {
    source: S,
    registry: CompetitionRegistry,
    db: Database,
    batch_pause: Duration,
}

impl<S> Orchestrator<S>
where
    S: MatchWindowSource + StandingsSource + Clone + Send + 'static,
{
    pub fn new(source: S, registry: CompetitionRegistry, db: Database) -> Self {
        Orchestrator {
            source,
            registry,
            db,
            batch_pause: BATCH_PAUSE,
        }
    }

    /// Override the inter-batch pause. Tests set this to zero.
    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Start a scrape on a background thread and return the event
    /// channel. The task runs to completion; there is no cancellation.
    pub fn spawn_scrape(
        &self,
        competition: &str,
        date_from: &str,
        date_to: &str,
        persist: bool,
    ) -> Receiver<ScrapeEvent> {
        let (tx, rx) = mpsc::channel();
        let orchestrator = self.clone();
        let competition = competition.to_string();
        let date_from = date_from.to_string();
        let date_to = date_to.to_string();

        std::thread::spawn(move || {
            orchestrator.run_scrape(&competition, &date_from, &date_to, persist, &tx);
        });

        rx
    }

    /// Run one scrape to completion on the calling thread, emitting
    /// events along the way. Always finishes and reports counts, even
    /// when every stage came back empty.
    pub fn run_scrape(
        &self,
        competition: &str,
        date_from: &str,
        date_to: &str,
        persist: bool,
        events: &Sender<ScrapeEvent>,
    ) -> ScrapeOutcome {
        let total_days = day_count(date_from, date_to);
        send(
            events,
            ScrapeEvent::Started {
                competition: competition.to_string(),
                date_from: date_from.to_string(),
                date_to: date_to.to_string(),
                total_days,
            },
        );

        let mut outcome = ScrapeOutcome {
            competition: competition.to_string(),
            ..Default::default()
        };

        if total_days.is_none() {
            send(
                events,
                ScrapeEvent::Warn(format!(
                    "Invalid date range: {} to {}",
                    date_from, date_to
                )),
            );
            self.db
                .record_scrape(competition, date_from, date_to, 0, "error", Some("invalid dates"));
            send(events, ScrapeEvent::Finished(outcome.clone()));
            return outcome;
        }

        // Stage 1: batched range fetch.
        let scraper = RangeScraper::new(self.source.clone(), self.registry.clone())
            .with_batch_pause(self.batch_pause);
        let matches = scraper.fetch_range(competition, date_from, date_to);
        outcome.fetched = matches.len();
        send(events, ScrapeEvent::MatchesFetched(matches.len()));

        if matches.is_empty() {
            // Same code path as a failed fetch; the guidance text is
            // all the caller gets to tell the two apart.
            send(
                events,
                ScrapeEvent::Warn(
                    "No matches found; possibly off-season or rate-limited".to_string(),
                ),
            );
        }

        // Stage 2: persistence.
        if persist {
            let saved = self.db.upsert_matches(&matches);
            outcome.saved = saved;
            send(events, ScrapeEvent::MatchesSaved(saved));
        }
        self.db
            .record_scrape(competition, date_from, date_to, outcome.fetched, "success", None);

        // Stage 3: standings refresh.
        let standings = self.fetch_standings(competition);
        outcome.standings = standings.len();
        if standings.is_empty() {
            send(events, ScrapeEvent::Warn("Standings not available".to_string()));
        } else {
            if persist {
                self.db.replace_standings(competition, &standings);
            }
            send(events, ScrapeEvent::StandingsUpdated(standings.len()));
        }

        send(
            events,
            ScrapeEvent::Info(format!(
                "{}: {} matches fetched, {} saved, {} standings rows",
                competition, outcome.fetched, outcome.saved, outcome.standings
            )),
        );
        send(events, ScrapeEvent::Finished(outcome.clone()));
        outcome
    }

    /// Refresh standings only, on a background thread.
    pub fn spawn_standings_refresh(&self, competition: &str) -> Receiver<ScrapeEvent> {
        let (tx, rx) = mpsc::channel();
        let orchestrator = self.clone();
        let competition = competition.to_string();

        std::thread::spawn(move || {
            let standings = orchestrator.fetch_standings(&competition);
            let mut outcome = ScrapeOutcome {
                competition: competition.clone(),
                ..Default::default()
            };
            if standings.is_empty() {
                send(&tx, ScrapeEvent::Warn("Standings not available".to_string()));
            } else {
                orchestrator.db.replace_standings(&competition, &standings);
                outcome.standings = standings.len();
                send(&tx, ScrapeEvent::StandingsUpdated(standings.len()));
            }
            send(&tx, ScrapeEvent::Finished(outcome));
        });

        rx
    }

    fn fetch_standings(&self, competition: &str) -> Vec<Standing> {
        self.source
            .fetch_standings(competition)
            .iter()
            .filter_map(|row| normalize_standing(row, competition))
            .collect()
    }
}

fn day_count(date_from: &str, date_to: &str) -> Option<i64> {
    let start = NaiveDate::parse_from_str(date_from, "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(date_to, "%Y-%m-%d").ok()?;
    Some((end - start).num_days() + 1)
}

/// The receiver side may be gone; a dropped UI just stops listening.
fn send(events: &Sender<ScrapeEvent>, event: ScrapeEvent) {
    let _ = events.send(event);
}
