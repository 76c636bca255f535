//! Clip repository: CRUD operations for the `clips` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, timestamp_column, DatabaseError};

/// A raw clip row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRow {
    pub id: i64,
    pub owner_id: i64,
    pub filename: String,
    pub is_processed: bool,
    pub created_at: DateTime<Utc>,
    pub duration: Option<f64>,
    pub map: Option<i64>,
    pub game_mode: Option<String>,
    pub legend: Option<i64>,
    pub match_history_found: Option<bool>,
}

impl ClipRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            filename: row.get("filename")?,
            is_processed: row.get("is_processed")?,
            created_at: timestamp_column(row, "created_at")?,
            duration: row.get("duration")?,
            map: row.get("map")?,
            game_mode: row.get("game_mode")?,
            legend: row.get("legend")?,
            match_history_found: row.get("match_history_found")?,
        })
    }
}

/// Classification fields written by match-history correlation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationUpdate {
    pub map: Option<i64>,
    pub game_mode: Option<String>,
    pub legend: Option<i64>,
    pub match_history_found: Option<bool>,
}

const SELECT_CLIP: &str = "SELECT id, owner_id, filename, is_processed, created_at, duration,
     map, game_mode, legend, match_history_found FROM clips";

/// Inserts an unprocessed clip and returns its row id.
pub fn insert(
    conn: &Connection,
    owner_id: i64,
    filename: &str,
    created_at: &DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO clips (owner_id, filename, is_processed, created_at) VALUES (?1, ?2, 0, ?3)",
        params![owner_id, filename, format_timestamp(created_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Finds a clip by its ID.
pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<ClipRow>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("{SELECT_CLIP} WHERE id = ?1"),
            params![id],
            ClipRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Finds the oldest clip with the given filename.
pub fn find_by_filename(conn: &Connection, filename: &str) -> Result<Option<ClipRow>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("{SELECT_CLIP} WHERE filename = ?1 ORDER BY id LIMIT 1"),
            params![filename],
            ClipRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Returns true if a clip with this ID exists.
pub fn exists(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let found: Option<i64> = conn
        .query_row("SELECT id FROM clips WHERE id = ?1", params![id], |r| r.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Lists processed clips created in `[from, to)`, oldest first.
pub fn list_processed_between(
    conn: &Connection,
    from: &DateTime<Utc>,
    to: &DateTime<Utc>,
) -> Result<Vec<ClipRow>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_CLIP} WHERE is_processed = 1 AND created_at >= ?1 AND created_at < ?2
         ORDER BY created_at, id"
    ))?;
    let rows = stmt
        .query_map(
            params![format_timestamp(from), format_timestamp(to)],
            ClipRow::from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Lists clips that have no queue entry at all.
pub fn list_without_queue_entry(conn: &Connection) -> Result<Vec<ClipRow>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_CLIP} WHERE NOT EXISTS
         (SELECT 1 FROM clips_queue q WHERE q.clip_id = clips.id) ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([], ClipRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Marks a clip processed with the measured duration. Returns rows changed.
pub fn mark_processed(conn: &Connection, id: i64, duration: f64) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE clips SET is_processed = 1, duration = ?2 WHERE id = ?1",
        params![id, duration],
    )?;
    Ok(changed)
}

/// Overwrites the classification columns of a clip. Returns rows changed.
pub fn update_classification(
    conn: &Connection,
    id: i64,
    update: &ClassificationUpdate,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE clips SET map = ?2, game_mode = ?3, legend = ?4, match_history_found = ?5
         WHERE id = ?1",
        params![
            id,
            update.map,
            update.game_mode,
            update.legend,
            update.match_history_found,
        ],
    )?;
    Ok(changed)
}

/// Sets only the `match_history_found` flag. Returns rows changed.
pub fn set_match_history_found(
    conn: &Connection,
    id: i64,
    found: bool,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE clips SET match_history_found = ?2 WHERE id = ?1",
        params![id, found],
    )?;
    Ok(changed)
}

/// Deletes a clip row. Queue entry and tag memberships must be removed first
/// (or are removed by the foreign key cascade). Returns rows changed.
pub fn delete(conn: &Connection, id: i64) -> Result<usize, DatabaseError> {
    let changed = conn.execute("DELETE FROM clips WHERE id = ?1", params![id])?;
    Ok(changed)
}
