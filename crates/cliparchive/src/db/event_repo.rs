//! Match history repository: append-only rows of `match_history`.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use super::{format_timestamp, timestamp_column, DatabaseError};

/// A raw match history row.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchHistoryRow {
    pub id: i64,
    pub user_id: i64,
    pub game_start: DateTime<Utc>,
    pub game_end: DateTime<Utc>,
    pub map: Option<i64>,
    pub legend: Option<i64>,
    pub game_mode: Option<String>,
}

impl MatchHistoryRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            game_start: timestamp_column(row, "game_start")?,
            game_end: timestamp_column(row, "game_end")?,
            map: row.get("map")?,
            legend: row.get("legend")?,
            game_mode: row.get("game_mode")?,
        })
    }
}

/// Appends a row. `row.id` is ignored; the assigned id is returned.
pub fn insert(conn: &Connection, row: &MatchHistoryRow) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO match_history (user_id, game_start, game_end, map, legend, game_mode)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            row.user_id,
            format_timestamp(&row.game_start),
            format_timestamp(&row.game_end),
            row.map,
            row.legend,
            row.game_mode,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Rows of `user_id` whose `[game_start, game_end]` intersects `[from, to]`
/// (bounds inclusive), ordered by start then id.
pub fn find_overlapping(
    conn: &Connection,
    user_id: i64,
    from: &DateTime<Utc>,
    to: &DateTime<Utc>,
) -> Result<Vec<MatchHistoryRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, game_start, game_end, map, legend, game_mode
         FROM match_history
         WHERE user_id = ?1 AND game_start <= ?3 AND ?2 <= game_end
         ORDER BY game_start, id",
    )?;
    let rows = stmt
        .query_map(
            params![user_id, format_timestamp(from), format_timestamp(to)],
            MatchHistoryRow::from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Lists all rows of a user ordered by start.
pub fn list_for_user(conn: &Connection, user_id: i64) -> Result<Vec<MatchHistoryRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, game_start, game_end, map, legend, game_mode
         FROM match_history WHERE user_id = ?1 ORDER BY game_start, id",
    )?;
    let rows = stmt
        .query_map(params![user_id], MatchHistoryRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
