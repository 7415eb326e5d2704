//! HTTP client for the football-data.org API
//!
//! Every entry point resolves the competition through the registry
//! first and returns an empty result when the name is unrecognized or
//! the request fails. Transport errors never cross this boundary; they
//! are logged and the caller proceeds with whatever it got.

use crate::data::normalize::{self, total_table_rows};
use crate::data::{MatchWindowSource, StandingsSource};
use crate::registry::CompetitionRegistry;
use crate::Match;
use chrono::NaiveDate;
use serde_json::Value;
use std::time::Duration;

/// Timeout for competition metadata and standings calls.
const META_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for match window calls, which can return full weeks of data.
const MATCHES_TIMEOUT: Duration = Duration::from_secs(30);

/// Rate-limited fetcher over the upstream API.
///
/// No retries: a failed call yields an empty or `None` result and the
/// caller proceeds. Pacing between calls is the range scraper's job.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::blocking::Client,
    base_url: String,
    registry: CompetitionRegistry,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str, registry: CompetitionRegistry) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(value) = reqwest::header::HeaderValue::from_str(token) {
            headers.insert("X-Auth-Token", value);
        }

        let client = reqwest::blocking::Client::builder()
            .user_agent("footdata/0.1")
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");

        ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            registry,
        }
    }

    pub fn registry(&self) -> &CompetitionRegistry {
        &self.registry
    }

    /// Issue one GET and decode the body as JSON. Non-2xx statuses and
    /// transport errors are logged and collapse to `None`.
    fn get_json(&self, url: &str, params: &[(&str, String)], timeout: Duration) -> Option<Value> {
        let response = self.client.get(url).query(params).timeout(timeout).send();

        match response {
            Ok(resp) if resp.status().is_success() => match resp.json::<Value>() {
                Ok(body) => Some(body),
                Err(e) => {
                    log::error!("Failed to decode response from {}: {}", url, e);
                    None
                }
            },
            Ok(resp) => {
                log::error!("API error {} for {}", resp.status(), url);
                None
            }
            Err(e) => {
                log::error!("Request failed for {}: {}", url, e);
                None
            }
        }
    }

    /// Check that the API is reachable with the configured token.
    pub fn test_connection(&self) -> bool {
        let url = format!("{}/competitions/PL", self.base_url);
        self.get_json(&url, &[], META_TIMEOUT).is_some()
    }

    /// Fetch raw match records for a competition/date window.
    pub fn fetch_window(
        &self,
        competition: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Vec<Value> {
        let Some(code) = self.registry.code(competition) else {
            log::error!("Unknown competition: {}", competition);
            return Vec::new();
        };

        let url = format!("{}/matches", self.base_url);
        let params = [
            ("competitions", code.to_string()),
            ("dateFrom", date_from.format("%Y-%m-%d").to_string()),
            ("dateTo", date_to.format("%Y-%m-%d").to_string()),
        ];

        let Some(body) = self.get_json(&url, &params, MATCHES_TIMEOUT) else {
            return Vec::new();
        };
        match_array(&body)
    }

    /// Fetch raw match records for one matchday of a competition.
    pub fn fetch_matchday(&self, competition: &str, matchday: i64) -> Vec<Value> {
        let Some(id) = self.registry.id(competition) else {
            log::error!("Unknown competition: {}", competition);
            return Vec::new();
        };

        let url = format!("{}/competitions/{}/matches", self.base_url, id);
        let params = [("matchday", matchday.to_string())];

        let Some(body) = self.get_json(&url, &params, MATCHES_TIMEOUT) else {
            return Vec::new();
        };
        let records = match_array(&body);
        log::info!(
            "Fetched {} matches for {} matchday {}",
            records.len(),
            competition,
            matchday
        );
        records
    }

    /// Current matchday from the competition's season metadata.
    pub fn fetch_current_matchday(&self, competition: &str) -> Option<i64> {
        let id = self.registry.id(competition)?;
        let url = format!("{}/competitions/{}", self.base_url, id);
        let body = self.get_json(&url, &[], META_TIMEOUT)?;
        body.get("currentSeason")?
            .get("currentMatchday")?
            .as_i64()
    }

    /// Season start years advertised by the competition metadata.
    pub fn available_seasons(&self, competition: &str) -> Vec<String> {
        let Some(id) = self.registry.id(competition) else {
            return Vec::new();
        };
        let url = format!("{}/competitions/{}", self.base_url, id);
        let Some(body) = self.get_json(&url, &[], META_TIMEOUT) else {
            return Vec::new();
        };

        body.get("seasons")
            .and_then(Value::as_array)
            .map(|seasons| {
                seasons
                    .iter()
                    .filter_map(|s| s.get("startDate").and_then(Value::as_str))
                    .filter(|d| d.len() >= 4)
                    .map(|d| d[..4].to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Raw team record.
    pub fn fetch_team(&self, team_id: i64) -> Option<Value> {
        let url = format!("{}/teams/{}", self.base_url, team_id);
        self.get_json(&url, &[], META_TIMEOUT)
    }

    /// Last finished matches for a team, normalized. The competition
    /// name is taken from each record since a team plays in several.
    pub fn fetch_team_matches(&self, team_id: i64, limit: usize) -> Vec<Match> {
        let url = format!("{}/teams/{}/matches", self.base_url, team_id);
        let params = [
            ("limit", limit.to_string()),
            ("status", "FINISHED".to_string()),
        ];

        let Some(body) = self.get_json(&url, &params, META_TIMEOUT) else {
            return Vec::new();
        };

        match_array(&body)
            .iter()
            .filter_map(|raw| {
                let competition = raw
                    .get("competition")
                    .and_then(|c| c.get("name"))
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown");
                normalize::normalize_match(raw, competition)
            })
            .collect()
    }
}

impl MatchWindowSource for ApiClient {
    fn fetch_window(
        &self,
        competition: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Vec<Value> {
        ApiClient::fetch_window(self, competition, date_from, date_to)
    }
}

impl StandingsSource for ApiClient {
    /// Fetch the competition table, keeping TOTAL rows only.
    fn fetch_standings(&self, competition: &str) -> Vec<Value> {
        let Some(id) = self.registry.id(competition) else {
            log::error!("Unknown competition: {}", competition);
            return Vec::new();
        };

        let url = format!("{}/competitions/{}/standings", self.base_url, id);
        let Some(body) = self.get_json(&url, &[], META_TIMEOUT) else {
            return Vec::new();
        };

        let rows = total_table_rows(&body);
        log::info!("Fetched standings for {}: {} teams", competition, rows.len());
        rows
    }
}

fn match_array(body: &Value) -> Vec<Value> {
    body.get("matches")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_match_array_extraction() {
        let body = json!({"matches": [{"id": 1}, {"id": 2}]});
        assert_eq!(match_array(&body).len(), 2);
        assert!(match_array(&json!({})).is_empty());
        assert!(match_array(&json!({"matches": "bogus"})).is_empty());
    }

    #[test]
    fn test_unknown_competition_is_empty() {
        let client = ApiClient::new(
            "http://127.0.0.1:1",
            "token",
            CompetitionRegistry::new(),
        );
        // Resolution fails before any request is attempted.
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert!(client.fetch_window("Eredivisie", from, to).is_empty());
        assert!(client.fetch_matchday("Eredivisie", 1).is_empty());
        assert!(StandingsSource::fetch_standings(&client, "Eredivisie").is_empty());
        assert_eq!(client.fetch_current_matchday("Eredivisie"), None);
        assert!(client.available_seasons("Eredivisie").is_empty());
    }
}
