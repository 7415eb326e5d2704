//! Football match and standings scraper
//!
//! Fetches fixtures and league tables from the football-data.org API,
//! persists them into a local SQLite store, and re-serves them to the
//! front-ends through filtered read operations.

pub mod data;
pub mod orchestrate;
pub mod registry;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Canonical match status, mapped from the upstream vocabulary.
///
/// Upstream values outside the fixed table pass through lower-cased
/// rather than failing the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
    Postponed,
    Cancelled,
    Other(String),
}

impl MatchStatus {
    pub fn from_api(status: &str) -> Self {
        match status {
            "SCHEDULED" => MatchStatus::Scheduled,
            "LIVE" | "IN_PLAY" => MatchStatus::Live,
            "FINISHED" => MatchStatus::Finished,
            "POSTPONED" => MatchStatus::Postponed,
            "CANCELLED" => MatchStatus::Cancelled,
            other => MatchStatus::Other(other.to_lowercase()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
            MatchStatus::Postponed => "postponed",
            MatchStatus::Cancelled => "cancelled",
            MatchStatus::Other(s) => s,
        }
    }

    /// Rebuild a status from its stored string form.
    pub fn from_stored(s: &str) -> Self {
        match s {
            "scheduled" => MatchStatus::Scheduled,
            "live" => MatchStatus::Live,
            "finished" => MatchStatus::Finished,
            "postponed" => MatchStatus::Postponed,
            "cancelled" => MatchStatus::Cancelled,
            other => MatchStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One fixture, normalized from the upstream record shape.
///
/// `match_id` is the stringified upstream id and serves as the natural
/// key for upserts. The full upstream payload is retained in `raw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub match_id: String,
    pub api_id: i64,
    pub competition: String,
    /// Kickoff timestamp, ISO-8601 UTC, kept verbatim from upstream.
    pub utc_date: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub half_time_home: Option<i64>,
    pub half_time_away: Option<i64>,
    pub status: MatchStatus,
    pub matchday: Option<i64>,
    pub venue: Option<String>,
    pub referee: Option<String>,
    pub raw: Value,
}

/// One team's row in a competition table for a given season key.
///
/// The season key is assigned by the store at write time (current
/// calendar year), not by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub competition: String,
    pub season: String,
    pub position: i64,
    pub team: String,
    pub team_id: i64,
    pub played_games: i64,
    pub won: i64,
    pub draw: i64,
    pub lost: i64,
    pub points: i64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub goal_difference: i64,
    pub raw: Value,
}

/// Per-team aggregate statistics for a competition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStats {
    pub competition: String,
    pub team: String,
    pub team_id: i64,
    pub matches_played: i64,
    pub wins: i64,
    pub draws: i64,
    pub losses: i64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub points: i64,
}

/// Append-only audit record of one fetch attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeLogEntry {
    pub competition: String,
    pub date_from: String,
    pub date_to: String,
    pub matches_count: i64,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: String,
}

/// Aggregate view over the matches table.
#[derive(Debug, Clone, Default)]
pub struct ScrapeStats {
    pub total_matches: i64,
    pub matches_by_competition: Vec<(String, i64)>,
    pub last_update: Option<String>,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum FootyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, FootyError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api: ApiConfig {
                base_url: "https://api.football-data.org/v4".to_string(),
                token: String::new(),
            },
            data: DataConfig {
                database_path: "data/football.db".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FootyError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| FootyError::Config(format!("Failed to parse config: {}", e)))?;

        // Environment token takes precedence over the file
        if let Ok(token) = std::env::var("FOOTBALL_DATA_API_KEY") {
            if !token.is_empty() {
                config.api.token = token;
            }
        }

        if config.api.token.is_empty() {
            log::warn!("No API token configured");
        }

        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FootyError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
