//! Queue repository: rows of the `clips_queue` table.
//!
//! Status changes go through [`transition`], a single conditional UPDATE
//! that only matches rows whose current status is one of the allowed
//! predecessors. Callers inspect the affected-row count to learn whether
//! they won.

use chrono::{DateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, optional_timestamp_column, DatabaseError};

/// A raw queue row joined with the owning clip's filename.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntryRow {
    pub id: i64,
    pub clip_id: i64,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub operation: String,
    pub error_message: Option<String>,
    pub combine_with_id: Option<i64>,
    pub desired_start_time: Option<i64>,
    pub desired_end_time: Option<i64>,
    pub filename: Option<String>,
}

impl QueueEntryRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            clip_id: row.get("clip_id")?,
            status: row.get("status")?,
            started_at: optional_timestamp_column(row, "started_at")?,
            finished_at: optional_timestamp_column(row, "finished_at")?,
            operation: row.get("operation")?,
            error_message: row.get("error_message")?,
            combine_with_id: row.get("combine_with_id")?,
            desired_start_time: row.get("desired_start_time")?,
            desired_end_time: row.get("desired_end_time")?,
            filename: row.get("filename")?,
        })
    }
}

/// Values for a freshly enqueued row. Status is always `pending`.
#[derive(Debug, Clone, Default)]
pub struct NewQueueEntry<'a> {
    pub clip_id: i64,
    pub operation: &'a str,
    pub combine_with_id: Option<i64>,
    pub desired_start_time: Option<i64>,
    pub desired_end_time: Option<i64>,
}

/// Column changes applied by a successful [`transition`].
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate<'a> {
    pub status: &'a str,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<&'a str>,
}

const SELECT_ENTRY: &str = "SELECT q.id, q.clip_id, q.status, q.started_at, q.finished_at,
     q.operation, q.error_message, q.combine_with_id, q.desired_start_time,
     q.desired_end_time, c.filename
     FROM clips_queue q LEFT JOIN clips c ON c.id = q.clip_id";

/// Inserts a pending queue row and returns its id.
pub fn insert(conn: &Connection, entry: &NewQueueEntry<'_>) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO clips_queue (clip_id, status, operation, combine_with_id,
         desired_start_time, desired_end_time)
         VALUES (?1, 'pending', ?2, ?3, ?4, ?5)",
        params![
            entry.clip_id,
            entry.operation,
            entry.combine_with_id,
            entry.desired_start_time,
            entry.desired_end_time,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Finds the queue row of a clip.
pub fn find_by_clip(conn: &Connection, clip_id: i64) -> Result<Option<QueueEntryRow>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("{SELECT_ENTRY} WHERE q.clip_id = ?1"),
            params![clip_id],
            QueueEntryRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Returns only the status of a clip's queue row.
pub fn find_status(conn: &Connection, clip_id: i64) -> Result<Option<String>, DatabaseError> {
    let status = conn
        .query_row(
            "SELECT status FROM clips_queue WHERE clip_id = ?1",
            params![clip_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(status)
}

/// Lists every queue row, oldest first.
pub fn list_all(conn: &Connection) -> Result<Vec<QueueEntryRow>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_ENTRY} ORDER BY q.id"))?;
    let rows = stmt
        .query_map([], QueueEntryRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Lists queue rows in the given status, oldest first.
pub fn list_by_status(conn: &Connection, status: &str) -> Result<Vec<QueueEntryRow>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{SELECT_ENTRY} WHERE q.status = ?1 ORDER BY q.id"))?;
    let rows = stmt
        .query_map(params![status], QueueEntryRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Conditionally moves a clip's queue row to `update.status`.
///
/// Matches only when the current status is in `from`. Returns the number of
/// rows changed: 1 when the transition happened, 0 otherwise.
pub fn transition(
    conn: &Connection,
    clip_id: i64,
    from: &[&str],
    update: &StatusUpdate<'_>,
) -> Result<usize, DatabaseError> {
    if from.is_empty() {
        return Ok(0);
    }

    let started_at = update.started_at.as_ref().map(format_timestamp);
    let finished_at = update.finished_at.as_ref().map(format_timestamp);

    let mut param_values: Vec<&dyn ToSql> = vec![
        &update.status,
        &started_at,
        &finished_at,
        &update.error_message,
        &clip_id,
    ];
    let placeholders: Vec<String> = from
        .iter()
        .enumerate()
        .map(|(i, _)| format!("?{}", param_values.len() + i + 1))
        .collect();
    for status in from {
        param_values.push(status);
    }

    let sql = format!(
        "UPDATE clips_queue SET status = ?1,
           started_at = COALESCE(?2, started_at),
           finished_at = COALESCE(?3, finished_at),
           error_message = COALESCE(?4, error_message)
         WHERE clip_id = ?5 AND status IN ({})",
        placeholders.join(", ")
    );

    let changed = conn.execute(&sql, param_values.as_slice())?;
    Ok(changed)
}

/// Deletes the queue row of a clip. Returns rows changed.
pub fn delete_by_clip(conn: &Connection, clip_id: i64) -> Result<usize, DatabaseError> {
    let changed = conn.execute("DELETE FROM clips_queue WHERE clip_id = ?1", params![clip_id])?;
    Ok(changed)
}
