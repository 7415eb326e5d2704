//! SQLite persistence for match and standings data
//!
//! Every operation opens its own connection and releases it before
//! returning, so no component holds the store across network-bound
//! steps. Storage errors never escape a data method: they are logged
//! and collapse to a boolean, a count, or an empty result, so callers
//! can treat persistence as best-effort.

use crate::{Match, MatchStatus, ScrapeLogEntry, ScrapeStats, Standing, TeamStats};
use chrono::{Datelike, Utc};
use rusqlite::{params, Connection, ToSql};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Season key for standings rows: the current calendar year at
/// ingestion time, not anything from the requested data.
pub fn current_season_key() -> String {
    Utc::now().year().to_string()
}

/// Path-keyed store; connections are per-operation.
#[derive(Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database {
            path: path.to_path_buf(),
        };
        db.init_schema()?;
        log::info!("Database initialized: {}", path.display());
        Ok(db)
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        Connection::open(&self.path)
    }

    fn init_schema(&self) -> crate::Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                match_id TEXT UNIQUE,
                competition TEXT,
                date TEXT,
                home_team TEXT,
                away_team TEXT,
                home_score INTEGER,
                away_score INTEGER,
                half_time_home INTEGER,
                half_time_away INTEGER,
                status TEXT,
                matchday INTEGER,
                venue TEXT,
                referee TEXT,
                raw_data TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS standings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                competition TEXT,
                season TEXT,
                position INTEGER,
                team TEXT,
                team_id INTEGER,
                played_games INTEGER,
                won INTEGER,
                draw INTEGER,
                lost INTEGER,
                points INTEGER,
                goals_for INTEGER,
                goals_against INTEGER,
                goal_difference INTEGER,
                raw_data TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(competition, season, team_id)
            );

            CREATE TABLE IF NOT EXISTS team_stats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                competition TEXT,
                team TEXT,
                team_id INTEGER,
                matches_played INTEGER,
                wins INTEGER,
                draws INTEGER,
                losses INTEGER,
                goals_for INTEGER,
                goals_against INTEGER,
                points INTEGER,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(competition, team_id)
            );

            CREATE TABLE IF NOT EXISTS scraping_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                competition TEXT,
                date_from TEXT,
                date_to TEXT,
                matches_count INTEGER,
                status TEXT,
                error_message TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );

            CREATE INDEX IF NOT EXISTS idx_matches_competition ON matches(competition);
            CREATE INDEX IF NOT EXISTS idx_matches_date ON matches(date);
            CREATE INDEX IF NOT EXISTS idx_matches_teams ON matches(home_team, away_team);
            CREATE INDEX IF NOT EXISTS idx_standings_competition ON standings(competition);
            "#,
        )?;
        Ok(())
    }

    // ==================== Match Operations ====================

    /// Insert-or-replace one match, keyed by its upstream id. Returns
    /// whether the write succeeded.
    pub fn upsert_match(&self, m: &Match) -> bool {
        let result = self
            .connect()
            .and_then(|conn| upsert_match_row(&conn, m).map(|_| ()));

        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to save match {}: {}", m.match_id, e);
                false
            }
        }
    }

    /// Upsert a batch inside one transaction. A single record's
    /// failure is logged and skipped, not fatal to the batch. Returns
    /// the number of records written.
    pub fn upsert_matches(&self, matches: &[Match]) -> usize {
        let mut saved = 0;
        let result: rusqlite::Result<()> = (|| {
            let mut conn = self.connect()?;
            let tx = conn.transaction()?;
            for m in matches {
                match upsert_match_row(&tx, m) {
                    Ok(_) => saved += 1,
                    Err(e) => log::error!("Failed to save match {}: {}", m.match_id, e),
                }
            }
            tx.commit()?;
            Ok(())
        })();

        if let Err(e) = result {
            log::error!("Batch save failed: {}", e);
        }
        saved
    }

    /// Matches matching the optional filters, newest first, with the
    /// raw upstream payload parsed back onto each record.
    pub fn query_matches(&self, filter: &MatchFilter) -> Vec<Match> {
        let result: rusqlite::Result<Vec<Match>> = (|| {
            let conn = self.connect()?;

            let mut sql = String::from(
                "SELECT match_id, competition, date, home_team, away_team,
                        home_score, away_score, half_time_home, half_time_away,
                        status, matchday, venue, referee, raw_data
                 FROM matches WHERE 1=1",
            );
            let mut params: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(competition) = &filter.competition {
                sql.push_str(" AND competition = ?");
                params.push(Box::new(competition.clone()));
            }
            if let Some(date_from) = &filter.date_from {
                sql.push_str(" AND date >= ?");
                params.push(Box::new(date_from.clone()));
            }
            if let Some(date_to) = &filter.date_to {
                sql.push_str(" AND date <= ?");
                params.push(Box::new(date_to.clone()));
            }
            sql.push_str(" ORDER BY date DESC LIMIT ?");
            params.push(Box::new(filter.limit as i64));

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(params), row_to_match)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })();

        match result {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Failed to query matches: {}", e);
                Vec::new()
            }
        }
    }

    // ==================== Standings Operations ====================

    /// Upsert the given standings under the current season key. Rows
    /// from a prior season key are left in place.
    pub fn replace_standings(&self, competition: &str, standings: &[Standing]) -> bool {
        let season = current_season_key();
        let result: rusqlite::Result<()> = (|| {
            let mut conn = self.connect()?;
            let tx = conn.transaction()?;
            for s in standings {
                tx.execute(
                    r#"
                    INSERT INTO standings
                        (competition, season, position, team, team_id, played_games,
                         won, draw, lost, points, goals_for, goals_against,
                         goal_difference, raw_data)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                    ON CONFLICT(competition, season, team_id) DO UPDATE SET
                        position = excluded.position,
                        team = excluded.team,
                        played_games = excluded.played_games,
                        won = excluded.won,
                        draw = excluded.draw,
                        lost = excluded.lost,
                        points = excluded.points,
                        goals_for = excluded.goals_for,
                        goals_against = excluded.goals_against,
                        goal_difference = excluded.goal_difference,
                        raw_data = excluded.raw_data
                    "#,
                    params![
                        competition,
                        season,
                        s.position,
                        s.team,
                        s.team_id,
                        s.played_games,
                        s.won,
                        s.draw,
                        s.lost,
                        s.points,
                        s.goals_for,
                        s.goals_against,
                        s.goal_difference,
                        s.raw.to_string(),
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })();

        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to save standings for {}: {}", competition, e);
                false
            }
        }
    }

    /// Standings for the current season key, by position.
    pub fn query_standings(&self, competition: &str) -> Vec<Standing> {
        let season = current_season_key();
        let result: rusqlite::Result<Vec<Standing>> = (|| {
            let conn = self.connect()?;
            let mut stmt = conn.prepare(
                "SELECT competition, season, position, team, team_id, played_games,
                        won, draw, lost, points, goals_for, goals_against,
                        goal_difference, raw_data
                 FROM standings
                 WHERE competition = ?1 AND season = ?2
                 ORDER BY position",
            )?;
            let rows = stmt
                .query_map(params![competition, season], row_to_standing)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })();

        match result {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Failed to query standings for {}: {}", competition, e);
                Vec::new()
            }
        }
    }

    // ==================== Team Stats ====================

    /// Per-team aggregates for a competition, optionally restricted
    /// to one team, highest points first.
    pub fn query_team_stats(&self, competition: &str, team: Option<&str>) -> Vec<TeamStats> {
        let result: rusqlite::Result<Vec<TeamStats>> = (|| {
            let conn = self.connect()?;
            let sql = "SELECT competition, team, team_id, matches_played, wins, draws,
                              losses, goals_for, goals_against, points
                       FROM team_stats
                       WHERE competition = ?1 AND (?2 IS NULL OR team = ?2)
                       ORDER BY points DESC";
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(params![competition, team], |row| {
                    Ok(TeamStats {
                        competition: row.get(0)?,
                        team: row.get(1)?,
                        team_id: row.get(2)?,
                        matches_played: row.get(3)?,
                        wins: row.get(4)?,
                        draws: row.get(5)?,
                        losses: row.get(6)?,
                        goals_for: row.get(7)?,
                        goals_against: row.get(8)?,
                        points: row.get(9)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })();

        match result {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Failed to query team stats: {}", e);
                Vec::new()
            }
        }
    }

    // ==================== Statistics ====================

    /// Aggregate counts over the matches table.
    pub fn stats(&self) -> ScrapeStats {
        let result: rusqlite::Result<ScrapeStats> = (|| {
            let conn = self.connect()?;

            let total_matches: i64 =
                conn.query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;

            let mut stmt = conn.prepare(
                "SELECT competition, COUNT(*) FROM matches GROUP BY competition",
            )?;
            let matches_by_competition = stmt
                .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<(String, i64)>>>()?;

            let last_update: Option<String> =
                conn.query_row("SELECT MAX(date) FROM matches", [], |row| row.get(0))?;

            Ok(ScrapeStats {
                total_matches,
                matches_by_competition,
                last_update,
            })
        })();

        match result {
            Ok(stats) => stats,
            Err(e) => {
                log::error!("Failed to compute stats: {}", e);
                ScrapeStats::default()
            }
        }
    }

    // ==================== Audit Log ====================

    /// Append one audit row for a fetch attempt. Never fails the
    /// caller; a storage error here is logged and dropped.
    pub fn record_scrape(
        &self,
        competition: &str,
        date_from: &str,
        date_to: &str,
        matches_count: usize,
        status: &str,
        error: Option<&str>,
    ) {
        let result: rusqlite::Result<()> = (|| {
            let conn = self.connect()?;
            conn.execute(
                "INSERT INTO scraping_log
                     (competition, date_from, date_to, matches_count, status, error_message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    competition,
                    date_from,
                    date_to,
                    matches_count as i64,
                    status,
                    error
                ],
            )?;
            Ok(())
        })();

        if let Err(e) = result {
            log::error!("Failed to record scrape attempt: {}", e);
        }
    }

    /// Most recent audit rows, newest first.
    pub fn recent_scrapes(&self, limit: usize) -> Vec<ScrapeLogEntry> {
        let result: rusqlite::Result<Vec<ScrapeLogEntry>> = (|| {
            let conn = self.connect()?;
            let mut stmt = conn.prepare(
                "SELECT competition, date_from, date_to, matches_count, status,
                        error_message, created_at
                 FROM scraping_log
                 ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map(params![limit as i64], |row| {
                    Ok(ScrapeLogEntry {
                        competition: row.get(0)?,
                        date_from: row.get(1)?,
                        date_to: row.get(2)?,
                        matches_count: row.get(3)?,
                        status: row.get(4)?,
                        error_message: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })();

        match result {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("Failed to read scrape log: {}", e);
                Vec::new()
            }
        }
    }

    // ==================== Purge ====================

    /// Delete all matches, standings, and team-stats rows for a
    /// competition. Irreversible; the audit log is kept.
    pub fn purge_competition(&self, competition: &str) -> bool {
        let result: rusqlite::Result<()> = (|| {
            let mut conn = self.connect()?;
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM matches WHERE competition = ?1", params![competition])?;
            tx.execute("DELETE FROM standings WHERE competition = ?1", params![competition])?;
            tx.execute("DELETE FROM team_stats WHERE competition = ?1", params![competition])?;
            tx.commit()?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                log::info!("Purged data for {}", competition);
                true
            }
            Err(e) => {
                log::error!("Failed to purge {}: {}", competition, e);
                false
            }
        }
    }
}

/// Optional AND-combined filters for match reads.
#[derive(Debug, Clone)]
pub struct MatchFilter {
    pub competition: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub limit: usize,
}

impl Default for MatchFilter {
    fn default() -> Self {
        MatchFilter {
            competition: None,
            date_from: None,
            date_to: None,
            limit: 100,
        }
    }
}

fn upsert_match_row(conn: &Connection, m: &Match) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        INSERT INTO matches
            (match_id, competition, date, home_team, away_team, home_score,
             away_score, half_time_home, half_time_away, status, matchday,
             venue, referee, raw_data)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        ON CONFLICT(match_id) DO UPDATE SET
            competition = excluded.competition,
            date = excluded.date,
            home_team = excluded.home_team,
            away_team = excluded.away_team,
            home_score = excluded.home_score,
            away_score = excluded.away_score,
            half_time_home = excluded.half_time_home,
            half_time_away = excluded.half_time_away,
            status = excluded.status,
            matchday = excluded.matchday,
            venue = excluded.venue,
            referee = excluded.referee,
            raw_data = excluded.raw_data,
            updated_at = CURRENT_TIMESTAMP
        "#,
        params![
            m.match_id,
            m.competition,
            m.utc_date,
            m.home_team,
            m.away_team,
            m.home_score,
            m.away_score,
            m.half_time_home,
            m.half_time_away,
            m.status.as_str(),
            m.matchday,
            m.venue,
            m.referee,
            m.raw.to_string(),
        ],
    )
}

fn row_to_match(row: &rusqlite::Row) -> rusqlite::Result<Match> {
    let match_id: String = row.get(0)?;
    let status_str: String = row.get(9)?;
    let raw_json: Option<String> = row.get(13)?;
    // Re-attach the full upstream shape alongside the canonical fields.
    let raw = raw_json
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(Value::Null);

    Ok(Match {
        api_id: match_id.parse().unwrap_or(0),
        match_id,
        competition: row.get(1)?,
        utc_date: row.get(2)?,
        home_team: row.get(3)?,
        away_team: row.get(4)?,
        home_score: row.get(5)?,
        away_score: row.get(6)?,
        half_time_home: row.get(7)?,
        half_time_away: row.get(8)?,
        status: MatchStatus::from_stored(&status_str),
        matchday: row.get(10)?,
        venue: row.get(11)?,
        referee: row.get(12)?,
        raw,
    })
}

fn row_to_standing(row: &rusqlite::Row) -> rusqlite::Result<Standing> {
    let raw_json: Option<String> = row.get(13)?;
    let raw = raw_json
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(Value::Null);

    Ok(Standing {
        competition: row.get(0)?,
        season: row.get(1)?,
        position: row.get(2)?,
        team: row.get(3)?,
        team_id: row.get(4)?,
        played_games: row.get(5)?,
        won: row.get(6)?,
        draw: row.get(7)?,
        lost: row.get(8)?,
        points: row.get(9)?,
        goals_for: row.get(10)?,
        goals_against: row.get(11)?,
        goal_difference: row.get(12)?,
        raw,
    })
}
