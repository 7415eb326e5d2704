//! Football data CLI
//!
//! Thin driver over the library contracts: scrape date ranges into the
//! local store and read matches, standings, and stats back out.

use clap::{Parser, Subcommand};
use footdata::data::{ApiClient, Database, MatchFilter, RangeScraper};
use footdata::orchestrate::{Orchestrator, ScrapeEvent};
use footdata::registry::CompetitionRegistry;
use footdata::{Config, Result};

#[derive(Parser)]
#[command(name = "footdata")]
#[command(about = "Football match and standings scraper", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape matches for a competition over a date range
    Scrape {
        /// Competition name (e.g. "Premier League")
        competition: String,
        /// Start date (YYYY-MM-DD)
        from: String,
        /// End date (YYYY-MM-DD)
        to: String,
        /// Fetch only, do not persist
        #[arg(long)]
        no_save: bool,
    },
    /// Scrape a whole season (August through May)
    Season {
        competition: String,
        /// Season start year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// List stored matches
    Matches {
        /// Filter by competition
        #[arg(long)]
        competition: Option<String>,
        /// Earliest date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Latest date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        #[arg(long, default_value = "100")]
        limit: usize,
    },
    /// Show the stored table for a competition
    Standings {
        competition: String,
        /// Re-fetch from the API before showing
        #[arg(long)]
        refresh: bool,
    },
    /// Show the current matchday of a competition
    Matchday { competition: String },
    /// Show database statistics and recent scrape attempts
    Status,
    /// Delete all stored data for a competition
    Purge {
        competition: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Create a default config file
    Init,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Scrape {
            competition,
            from,
            to,
            no_save,
        } => commands::scrape(&config, &competition, &from, &to, !no_save),
        Commands::Season { competition, year } => commands::season(&config, &competition, year),
        Commands::Matches {
            competition,
            from,
            to,
            limit,
        } => commands::matches(&config, competition, from, to, limit),
        Commands::Standings {
            competition,
            refresh,
        } => commands::standings(&config, &competition, refresh),
        Commands::Matchday { competition } => commands::matchday(&config, &competition),
        Commands::Status => commands::status(&config),
        Commands::Purge { competition, yes } => commands::purge(&config, &competition, yes),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;

    fn open_database(config: &Config) -> Result<Database> {
        Database::open(&config.data.database_path)
    }

    fn api_client(config: &Config) -> ApiClient {
        ApiClient::new(
            &config.api.base_url,
            &config.api.token,
            CompetitionRegistry::new(),
        )
    }

    pub fn scrape(
        config: &Config,
        competition: &str,
        from: &str,
        to: &str,
        persist: bool,
    ) -> Result<()> {
        let db = open_database(config)?;
        let orchestrator = Orchestrator::new(api_client(config), CompetitionRegistry::new(), db);

        let rx = orchestrator.spawn_scrape(competition, from, to, persist);
        for event in rx {
            match event {
                ScrapeEvent::Started {
                    competition,
                    date_from,
                    date_to,
                    total_days,
                } => {
                    let days = total_days
                        .map(|d| format!(" ({} days)", d))
                        .unwrap_or_default();
                    println!("Scraping {} from {} to {}{}", competition, date_from, date_to, days);
                }
                ScrapeEvent::Info(msg) => println!("{}", msg),
                ScrapeEvent::Warn(msg) => println!("Warning: {}", msg),
                ScrapeEvent::MatchesFetched(n) => println!("Fetched {} matches", n),
                ScrapeEvent::MatchesSaved(n) => println!("Saved {} matches", n),
                ScrapeEvent::StandingsUpdated(n) => println!("Standings: {} teams", n),
                ScrapeEvent::Finished(outcome) => {
                    println!(
                        "Done: {} fetched, {} saved, {} standings rows",
                        outcome.fetched, outcome.saved, outcome.standings
                    );
                }
            }
        }
        Ok(())
    }

    pub fn season(config: &Config, competition: &str, year: Option<i32>) -> Result<()> {
        let db = open_database(config)?;
        let scraper = RangeScraper::new(api_client(config), CompetitionRegistry::new());

        let matches = scraper.fetch_season(competition, year);
        let saved = db.upsert_matches(&matches);
        println!("Fetched {} matches, saved {}", matches.len(), saved);
        Ok(())
    }

    pub fn matches(
        config: &Config,
        competition: Option<String>,
        from: Option<String>,
        to: Option<String>,
        limit: usize,
    ) -> Result<()> {
        let db = open_database(config)?;
        let rows = db.query_matches(&MatchFilter {
            competition,
            date_from: from,
            date_to: to,
            limit,
        });

        if rows.is_empty() {
            println!("No stored matches for the given filters");
            return Ok(());
        }
        for m in &rows {
            let score = match (m.home_score, m.away_score) {
                (Some(h), Some(a)) => format!("{}-{}", h, a),
                _ => "vs".to_string(),
            };
            println!(
                "{}  {:22} {}  {:22} [{}] ({})",
                m.utc_date, m.home_team, score, m.away_team, m.status, m.competition
            );
        }
        Ok(())
    }

    pub fn standings(config: &Config, competition: &str, refresh: bool) -> Result<()> {
        let db = open_database(config)?;

        if refresh {
            let orchestrator =
                Orchestrator::new(api_client(config), CompetitionRegistry::new(), db.clone());
            for event in orchestrator.spawn_standings_refresh(competition) {
                if let ScrapeEvent::Warn(msg) = event {
                    println!("Warning: {}", msg);
                }
            }
        }

        let rows = db.query_standings(competition);
        if rows.is_empty() {
            println!("No standings stored for {}", competition);
            return Ok(());
        }

        println!("{:>3}  {:28} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4}",
                 "#", "Team", "P", "W", "D", "L", "GD", "Pts");
        for s in &rows {
            println!(
                "{:>3}  {:28} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4}",
                s.position, s.team, s.played_games, s.won, s.draw, s.lost,
                s.goal_difference, s.points
            );
        }
        Ok(())
    }

    pub fn matchday(config: &Config, competition: &str) -> Result<()> {
        match api_client(config).fetch_current_matchday(competition) {
            Some(day) => println!("{}: matchday {}", competition, day),
            None => println!("Current matchday not available for {}", competition),
        }
        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let db = open_database(config)?;
        let stats = db.stats();

        println!("Total matches: {}", stats.total_matches);
        for (competition, count) in &stats.matches_by_competition {
            println!("  {:20} {}", competition, count);
        }
        if let Some(last) = &stats.last_update {
            println!("Latest match date: {}", last);
        }

        let log = db.recent_scrapes(10);
        if !log.is_empty() {
            println!("\nRecent scrape attempts:");
            for entry in &log {
                let error = entry
                    .error_message
                    .as_deref()
                    .map(|e| format!(" ({})", e))
                    .unwrap_or_default();
                println!(
                    "  {}  {} {} to {}: {} matches, {}{}",
                    entry.created_at,
                    entry.competition,
                    entry.date_from,
                    entry.date_to,
                    entry.matches_count,
                    entry.status,
                    error
                );
            }
        }
        Ok(())
    }

    pub fn purge(config: &Config, competition: &str, yes: bool) -> Result<()> {
        if !yes {
            println!(
                "This deletes all stored data for {}. Re-run with --yes to confirm.",
                competition
            );
            return Ok(());
        }
        let db = open_database(config)?;
        if db.purge_competition(competition) {
            println!("Purged {}", competition);
        } else {
            println!("Purge failed for {}", competition);
        }
        Ok(())
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);
        println!("Set api.token or the FOOTBALL_DATA_API_KEY environment variable");
        Ok(())
    }
}
