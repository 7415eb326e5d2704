//! Data acquisition and persistence

pub mod client;
pub mod database;
pub mod normalize;
pub mod range;

pub use client::ApiClient;
pub use database::{Database, MatchFilter};
pub use range::RangeScraper;

use chrono::NaiveDate;
use serde_json::Value;

/// Source of raw match records for a competition/date window.
///
/// Implementations resolve the competition name themselves and degrade
/// to an empty list on any failure, including an unrecognized name.
pub trait MatchWindowSource {
    fn fetch_window(
        &self,
        competition: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Vec<Value>;
}

/// Source of raw standings table rows for a competition.
pub trait StandingsSource {
    fn fetch_standings(&self, competition: &str) -> Vec<Value>;
}
