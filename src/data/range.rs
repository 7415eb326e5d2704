//! Batched date-range retrieval
//!
//! Turns an arbitrary user-requested date interval into a bounded
//! sequence of rate-limited window fetches. Long ranges are split into
//! consecutive sub-windows with a fixed pause between them so the
//! upstream requests-per-minute ceiling is respected.

use crate::data::normalize::normalize_match;
use crate::data::MatchWindowSource;
use crate::registry::CompetitionRegistry;
use crate::Match;
use chrono::{Datelike, NaiveDate, Utc};
use std::time::Duration;

/// Ranges at or under this many days go out as a single request.
pub const SHORT_RANGE_DAYS: i64 = 10;
/// Maximum sub-window length for longer ranges.
pub const BATCH_DAYS: i64 = 7;
/// Pause between consecutive sub-window fetches.
pub const BATCH_PAUSE: Duration = Duration::from_millis(1500);

/// Drives window fetches and normalization over a date range.
///
/// Generic over the window source; production uses [`ApiClient`],
/// tests substitute a recording stub.
///
/// [`ApiClient`]: crate::data::ApiClient
#[derive(Clone)]
pub struct RangeScraper<S> {
    source: S,
    registry: CompetitionRegistry,
    batch_pause: Duration,
}

impl<S: MatchWindowSource> RangeScraper<S> {
    pub fn new(source: S, registry: CompetitionRegistry) -> Self {
        RangeScraper {
            source,
            registry,
            batch_pause: BATCH_PAUSE,
        }
    }

    /// Override the inter-batch pause. Tests set this to zero.
    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    /// Fetch and normalize all matches in `[date_from, date_to]`.
    ///
    /// Malformed dates and unknown competitions yield an empty result,
    /// logged, never an error. A sub-window that fails entirely
    /// contributes zero records but does not abort the remaining
    /// sub-windows.
    pub fn fetch_range(&self, competition: &str, date_from: &str, date_to: &str) -> Vec<Match> {
        if self.registry.get(competition).is_none() {
            log::error!("Unknown competition: {}", competition);
            return Vec::new();
        }

        let (start, end) = match (parse_date(date_from), parse_date(date_to)) {
            (Some(s), Some(e)) => (s, e),
            _ => {
                log::error!("Invalid date format: {} or {}", date_from, date_to);
                return Vec::new();
            }
        };

        let total_days = (end - start).num_days() + 1;
        if total_days <= 0 {
            // Inverted range: zero iterations, empty result.
            return Vec::new();
        }

        if total_days <= SHORT_RANGE_DAYS {
            return self.fetch_one_window(competition, start, end);
        }

        log::info!(
            "Long range of {} days; splitting into {}-day batches",
            total_days,
            BATCH_DAYS
        );
        self.fetch_batched(competition, start, end)
    }

    /// Fetch a whole season (August through May).
    pub fn fetch_season(&self, competition: &str, season_year: Option<i32>) -> Vec<Match> {
        let year = season_year.unwrap_or_else(|| Utc::now().year());
        let date_from = format!("{}-08-01", year);
        let date_to = format!("{}-05-31", year + 1);
        log::info!(
            "Fetching season {}/{} for {}",
            year,
            year + 1,
            competition
        );
        self.fetch_range(competition, &date_from, &date_to)
    }

    fn fetch_one_window(&self, competition: &str, from: NaiveDate, to: NaiveDate) -> Vec<Match> {
        let records = self.source.fetch_window(competition, from, to);
        let matches: Vec<Match> = records
            .iter()
            .filter_map(|raw| normalize_match(raw, competition))
            .collect();
        log::info!("Fetched {} matches for {}", matches.len(), competition);
        matches
    }

    fn fetch_batched(&self, competition: &str, start: NaiveDate, end: NaiveDate) -> Vec<Match> {
        let mut all_matches = Vec::new();
        let mut current = start;
        let mut first = true;

        while current <= end {
            if !first {
                // Between batches only, never before the first.
                std::thread::sleep(self.batch_pause);
            }
            first = false;

            let batch_end = std::cmp::min(current + chrono::Duration::days(BATCH_DAYS - 1), end);
            log::info!("Fetching batch {} to {}", current, batch_end);

            all_matches.extend(self.fetch_one_window(competition, current, batch_end));
            current = batch_end + chrono::Duration::days(1);
        }

        log::info!(
            "Total fetched: {} matches for {}",
            all_matches.len(),
            competition
        );
        all_matches
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::cell::RefCell;

    /// Records every window it is asked for.
    struct StubSource {
        calls: RefCell<Vec<(NaiveDate, NaiveDate)>>,
        records_per_call: usize,
    }

    impl StubSource {
        fn new(records_per_call: usize) -> Self {
            StubSource {
                calls: RefCell::new(Vec::new()),
                records_per_call,
            }
        }
    }

    impl MatchWindowSource for StubSource {
        fn fetch_window(&self, _: &str, from: NaiveDate, to: NaiveDate) -> Vec<Value> {
            self.calls.borrow_mut().push((from, to));
            (0..self.records_per_call)
                .map(|i| {
                    json!({
                        "id": self.calls.borrow().len() * 100 + i,
                        "utcDate": format!("{}T15:00:00Z", from),
                        "status": "FINISHED",
                        "homeTeam": {"name": "Home FC"},
                        "awayTeam": {"name": "Away FC"},
                        "score": {"fullTime": {"home": 1, "away": 0}}
                    })
                })
                .collect()
        }
    }

    fn scraper(records_per_call: usize) -> RangeScraper<StubSource> {
        RangeScraper::new(StubSource::new(records_per_call), CompetitionRegistry::new())
            .with_batch_pause(Duration::ZERO)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_short_range_single_call() {
        let s = scraper(2);
        let matches = s.fetch_range("Premier League", "2024-01-01", "2024-01-03");
        let calls = s.source.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (day(2024, 1, 1), day(2024, 1, 3)));
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_ten_days_still_single_call() {
        let s = scraper(0);
        s.fetch_range("Premier League", "2024-01-01", "2024-01-10");
        assert_eq!(s.source.calls.borrow().len(), 1);
    }

    #[test]
    fn test_eleven_days_batched() {
        let s = scraper(0);
        s.fetch_range("Premier League", "2024-01-01", "2024-01-11");
        let calls = s.source.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], (day(2024, 1, 1), day(2024, 1, 7)));
        assert_eq!(calls[1], (day(2024, 1, 8), day(2024, 1, 11)));
    }

    #[test]
    fn test_twenty_day_range_three_batches() {
        let s = scraper(1);
        let matches = s.fetch_range("La Liga", "2024-01-01", "2024-01-20");
        let calls = s.source.calls.borrow();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], (day(2024, 1, 1), day(2024, 1, 7)));
        assert_eq!(calls[1], (day(2024, 1, 8), day(2024, 1, 14)));
        assert_eq!(calls[2], (day(2024, 1, 15), day(2024, 1, 20)));
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_batches_contiguous_and_exhaustive() {
        let s = scraper(0);
        s.fetch_range("Serie A", "2024-03-01", "2024-04-14"); // 45 days
        let calls = s.source.calls.borrow();
        assert_eq!(calls.len(), 7); // ceil(45 / 7)

        assert_eq!(calls[0].0, day(2024, 3, 1));
        assert_eq!(calls.last().unwrap().1, day(2024, 4, 14));
        for pair in calls.windows(2) {
            assert_eq!(pair[0].1 + chrono::Duration::days(1), pair[1].0);
        }
        // Last window carries the remainder: 45 mod 7 = 3 days.
        let (last_from, last_to) = *calls.last().unwrap();
        assert_eq!((last_to - last_from).num_days() + 1, 3);
    }

    #[test]
    fn test_evenly_divisible_range() {
        let s = scraper(0);
        s.fetch_range("Bundesliga", "2024-01-01", "2024-01-14"); // 14 days
        let calls = s.source.calls.borrow();
        assert_eq!(calls.len(), 2);
        let (last_from, last_to) = *calls.last().unwrap();
        assert_eq!((last_to - last_from).num_days() + 1, 7);
    }

    #[test]
    fn test_inverted_range_empty() {
        let s = scraper(5);
        let matches = s.fetch_range("Premier League", "2024-02-01", "2024-01-01");
        assert!(matches.is_empty());
        assert!(s.source.calls.borrow().is_empty());
    }

    #[test]
    fn test_malformed_dates_empty() {
        let s = scraper(5);
        assert!(s.fetch_range("Premier League", "01/01/2024", "2024-01-03").is_empty());
        assert!(s.fetch_range("Premier League", "2024-01-01", "soon").is_empty());
        assert!(s.source.calls.borrow().is_empty());
    }

    #[test]
    fn test_unknown_competition_no_calls() {
        let s = scraper(5);
        let matches = s.fetch_range("Eredivisie", "2024-01-01", "2024-01-03");
        assert!(matches.is_empty());
        assert!(s.source.calls.borrow().is_empty());
    }

    #[test]
    fn test_invalid_records_skipped() {
        struct MixedSource;
        impl MatchWindowSource for MixedSource {
            fn fetch_window(&self, _: &str, _: NaiveDate, _: NaiveDate) -> Vec<Value> {
                vec![
                    json!({
                        "id": 1,
                        "status": "FINISHED",
                        "homeTeam": {"name": "Home FC"},
                        "awayTeam": {"name": "Away FC"}
                    }),
                    // No away team name: silently skipped.
                    json!({"id": 2, "homeTeam": {"name": "Home FC"}, "awayTeam": {}}),
                ]
            }
        }

        let s = RangeScraper::new(MixedSource, CompetitionRegistry::new())
            .with_batch_pause(Duration::ZERO);
        let matches = s.fetch_range("Premier League", "2024-01-01", "2024-01-02");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].match_id, "1");
    }

    #[test]
    fn test_failed_batch_does_not_abort_rest() {
        /// Fails (returns nothing) on the second window only.
        struct FlakySource {
            calls: RefCell<usize>,
        }
        impl MatchWindowSource for FlakySource {
            fn fetch_window(&self, _: &str, from: NaiveDate, _: NaiveDate) -> Vec<Value> {
                let mut calls = self.calls.borrow_mut();
                *calls += 1;
                if *calls == 2 {
                    return Vec::new();
                }
                vec![json!({
                    "id": *calls,
                    "utcDate": format!("{}T15:00:00Z", from),
                    "status": "FINISHED",
                    "homeTeam": {"name": "Home FC"},
                    "awayTeam": {"name": "Away FC"}
                })]
            }
        }

        let s = RangeScraper::new(
            FlakySource {
                calls: RefCell::new(0),
            },
            CompetitionRegistry::new(),
        )
        .with_batch_pause(Duration::ZERO);

        let matches = s.fetch_range("Premier League", "2024-01-01", "2024-01-20");
        assert_eq!(*s.source.calls.borrow(), 3);
        assert_eq!(matches.len(), 2);
        // Chronological batch order is preserved across the gap.
        assert!(matches[0].utc_date < matches[1].utc_date);
    }

    #[test]
    fn test_season_range() {
        let s = scraper(0);
        s.fetch_season("Premier League", Some(2023));
        let calls = s.source.calls.borrow();
        assert_eq!(calls.first().unwrap().0, day(2023, 8, 1));
        assert_eq!(calls.last().unwrap().1, day(2024, 5, 31));
    }
}
