//! Pure normalization of upstream records
//!
//! Turns raw API JSON into the local canonical shapes. No I/O here;
//! invalid records yield `None` and are skipped by the caller.

use crate::{Match, MatchStatus, Standing};
use serde_json::Value;

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn int_field(value: &Value, key: &str) -> Option<i64> {
    value.get(key).and_then(Value::as_i64)
}

/// Normalize one raw match record.
///
/// Returns `None` when either team name is missing or empty; the
/// caller skips such records silently. Deterministic: identical input
/// always yields identical output.
pub fn normalize_match(raw: &Value, competition: &str) -> Option<Match> {
    let home_team = raw
        .get("homeTeam")
        .and_then(|t| str_field(t, "name"))
        .unwrap_or_default();
    let away_team = raw
        .get("awayTeam")
        .and_then(|t| str_field(t, "name"))
        .unwrap_or_default();

    if home_team.is_empty() || away_team.is_empty() {
        return None;
    }

    let api_id = int_field(raw, "id").unwrap_or(0);
    let score = raw.get("score");
    let full_time = score.and_then(|s| s.get("fullTime"));
    let half_time = score.and_then(|s| s.get("halfTime"));

    let status = raw
        .get("status")
        .and_then(Value::as_str)
        .map(MatchStatus::from_api)
        .unwrap_or(MatchStatus::Other(String::new()));

    let referee = raw
        .get("referees")
        .and_then(Value::as_array)
        .and_then(|refs| refs.first())
        .and_then(|r| str_field(r, "name"));

    Some(Match {
        match_id: api_id.to_string(),
        api_id,
        competition: competition.to_string(),
        utc_date: str_field(raw, "utcDate").unwrap_or_default(),
        home_team,
        away_team,
        home_score: full_time.and_then(|ft| int_field(ft, "home")),
        away_score: full_time.and_then(|ft| int_field(ft, "away")),
        half_time_home: half_time.and_then(|ht| int_field(ht, "home")),
        half_time_away: half_time.and_then(|ht| int_field(ht, "away")),
        status,
        matchday: int_field(raw, "matchday"),
        venue: str_field(raw, "venue").or_else(|| Some("Unknown".to_string())),
        referee,
        raw: raw.clone(),
    })
}

/// Extract the table rows of `TOTAL`-type standings from a raw
/// standings payload. Home/away-only splits are discarded.
pub fn total_table_rows(payload: &Value) -> Vec<Value> {
    let mut rows = Vec::new();
    if let Some(standings) = payload.get("standings").and_then(Value::as_array) {
        for standing in standings {
            if standing.get("type").and_then(Value::as_str) != Some("TOTAL") {
                continue;
            }
            if let Some(table) = standing.get("table").and_then(Value::as_array) {
                rows.extend(table.iter().cloned());
            }
        }
    }
    rows
}

/// Normalize one standings table row.
///
/// Needs a team name and id; the season key is left empty for the
/// store to assign at write time.
pub fn normalize_standing(row: &Value, competition: &str) -> Option<Standing> {
    let team = row.get("team")?;
    let team_name = str_field(team, "name")?;
    let team_id = int_field(team, "id")?;

    Some(Standing {
        competition: competition.to_string(),
        season: String::new(),
        position: int_field(row, "position").unwrap_or(0),
        team: team_name,
        team_id,
        played_games: int_field(row, "playedGames").unwrap_or(0),
        won: int_field(row, "won").unwrap_or(0),
        draw: int_field(row, "draw").unwrap_or(0),
        lost: int_field(row, "lost").unwrap_or(0),
        points: int_field(row, "points").unwrap_or(0),
        goals_for: int_field(row, "goalsFor").unwrap_or(0),
        goals_against: int_field(row, "goalsAgainst").unwrap_or(0),
        goal_difference: int_field(row, "goalDifference").unwrap_or(0),
        raw: row.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_match() -> Value {
        json!({
            "id": 12345,
            "utcDate": "2024-01-06T15:00:00Z",
            "status": "FINISHED",
            "matchday": 20,
            "homeTeam": {"id": 57, "name": "Arsenal FC"},
            "awayTeam": {"id": 61, "name": "Chelsea FC"},
            "score": {
                "fullTime": {"home": 2, "away": 1},
                "halfTime": {"home": 1, "away": 1}
            },
            "referees": [{"name": "Michael Oliver"}]
        })
    }

    #[test]
    fn test_normalize_match() {
        let m = normalize_match(&sample_match(), "Premier League").unwrap();
        assert_eq!(m.match_id, "12345");
        assert_eq!(m.api_id, 12345);
        assert_eq!(m.competition, "Premier League");
        assert_eq!(m.home_team, "Arsenal FC");
        assert_eq!(m.away_team, "Chelsea FC");
        assert_eq!(m.home_score, Some(2));
        assert_eq!(m.away_score, Some(1));
        assert_eq!(m.half_time_home, Some(1));
        assert_eq!(m.half_time_away, Some(1));
        assert_eq!(m.status, MatchStatus::Finished);
        assert_eq!(m.matchday, Some(20));
        assert_eq!(m.venue.as_deref(), Some("Unknown"));
        assert_eq!(m.referee.as_deref(), Some("Michael Oliver"));
        assert_eq!(m.raw, sample_match());
    }

    #[test]
    fn test_missing_team_yields_none() {
        let mut raw = sample_match();
        raw["homeTeam"] = json!({"id": 57});
        assert!(normalize_match(&raw, "Premier League").is_none());

        let mut raw = sample_match();
        raw["awayTeam"]["name"] = json!("");
        assert!(normalize_match(&raw, "Premier League").is_none());
    }

    #[test]
    fn test_scores_nullable_before_kickoff() {
        let raw = json!({
            "id": 99,
            "utcDate": "2024-05-01T19:00:00Z",
            "status": "SCHEDULED",
            "homeTeam": {"name": "AC Milan"},
            "awayTeam": {"name": "Juventus FC"},
            "score": {"fullTime": {"home": null, "away": null}}
        });
        let m = normalize_match(&raw, "Serie A").unwrap();
        assert_eq!(m.home_score, None);
        assert_eq!(m.away_score, None);
        assert_eq!(m.half_time_home, None);
        assert_eq!(m.half_time_away, None);
        assert_eq!(m.status, MatchStatus::Scheduled);
    }

    #[test]
    fn test_normalize_deterministic() {
        let raw = sample_match();
        let a = normalize_match(&raw, "Premier League").unwrap();
        let b = normalize_match(&raw, "Premier League").unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_total_rows_only() {
        let payload = json!({
            "standings": [
                {"type": "TOTAL", "table": [
                    {"position": 1, "team": {"id": 57, "name": "Arsenal FC"}},
                    {"position": 2, "team": {"id": 64, "name": "Liverpool FC"}}
                ]},
                {"type": "HOME", "table": [
                    {"position": 1, "team": {"id": 65, "name": "Manchester City FC"}}
                ]}
            ]
        });
        let rows = total_table_rows(&payload);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["team"]["name"], "Arsenal FC");
        assert_eq!(rows[1]["team"]["name"], "Liverpool FC");
    }

    #[test]
    fn test_normalize_standing() {
        let row = json!({
            "position": 3,
            "team": {"id": 61, "name": "Chelsea FC"},
            "playedGames": 20,
            "won": 12,
            "draw": 4,
            "lost": 4,
            "points": 40,
            "goalsFor": 38,
            "goalsAgainst": 22,
            "goalDifference": 16
        });
        let s = normalize_standing(&row, "Premier League").unwrap();
        assert_eq!(s.position, 3);
        assert_eq!(s.team, "Chelsea FC");
        assert_eq!(s.team_id, 61);
        assert_eq!(s.points, 40);
        assert_eq!(s.goal_difference, 16);
        assert!(s.season.is_empty());
    }

    #[test]
    fn test_standing_without_team_id_skipped() {
        let row = json!({"position": 1, "team": {"name": "Ghost FC"}});
        assert!(normalize_standing(&row, "Premier League").is_none());
    }
}
