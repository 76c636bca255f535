//! The clip lifecycle controller.

use chrono::Utc;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::db::queue_repo::{self, StatusUpdate};
use crate::db::{clip_repo, Database};
use crate::error::ClipError;
use crate::events::TimeWindow;

use super::entry::{parse_status, Operation, QueueEntry};
use super::status::QueueStatus;

/// Owns the per-clip processing state machine.
#[derive(Clone)]
pub struct LifecycleController {
    db: Database,
}

impl LifecycleController {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a `pending` entry for the clip.
    ///
    /// A terminal entry left over from an earlier operation is replaced.
    /// Fails with `DuplicateEntry` while an active entry exists.
    pub fn create(&self, clip_id: i64, operation: Operation) -> Result<QueueEntry, ClipError> {
        self.db.with_tx(|tx| enqueue(tx, clip_id, &operation))
    }

    /// `pending → queued`.
    pub fn mark_queued(&self, clip_id: i64) -> Result<QueueEntry, ClipError> {
        self.db.with_conn(|conn| {
            apply_transition(
                conn,
                clip_id,
                &StatusUpdate {
                    status: QueueStatus::Queued.as_str(),
                    ..Default::default()
                },
            )?;
            load(conn, clip_id)
        })
    }

    /// `queued → transcoding`, or `pending → transcoding` for workers that
    /// skip acknowledgment. Records `started_at`.
    pub fn mark_transcoding(&self, clip_id: i64) -> Result<QueueEntry, ClipError> {
        self.db.with_conn(|conn| {
            apply_transition(
                conn,
                clip_id,
                &StatusUpdate {
                    status: QueueStatus::Transcoding.as_str(),
                    started_at: Some(Utc::now()),
                    ..Default::default()
                },
            )?;
            load(conn, clip_id)
        })
    }

    /// `transcoding → finished`. Records `finished_at` and marks the clip
    /// processed with the measured duration, in one transaction.
    ///
    /// The duration must give the clip a representable time window, or the
    /// clip could never be correlated.
    pub fn mark_finished(&self, clip_id: i64, duration_seconds: f64) -> Result<QueueEntry, ClipError> {
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(ClipError::InvalidArgument(format!(
                "duration must be a non-negative number of seconds, got {}",
                duration_seconds
            )));
        }
        if duration_seconds == 0.0 {
            warn!(clip_id, "Worker reported a zero-length clip");
        }

        self.db.with_tx(|tx| {
            if let Some(clip) = clip_repo::find_by_id(tx, clip_id)? {
                TimeWindow::ending_at(clip.created_at, duration_seconds)?;
            }
            apply_transition(
                tx,
                clip_id,
                &StatusUpdate {
                    status: QueueStatus::Finished.as_str(),
                    finished_at: Some(Utc::now()),
                    ..Default::default()
                },
            )?;
            if clip_repo::mark_processed(tx, clip_id, duration_seconds)? == 0 {
                return Err(ClipError::Inconsistent(format!(
                    "queue entry finished for missing clip {}",
                    clip_id
                )));
            }
            load(tx, clip_id)
        })
    }

    /// Any non-terminal state `→ error`. Records `finished_at` and the message.
    pub fn mark_error(&self, clip_id: i64, message: &str) -> Result<QueueEntry, ClipError> {
        self.db.with_conn(|conn| {
            apply_transition(
                conn,
                clip_id,
                &StatusUpdate {
                    status: QueueStatus::Error.as_str(),
                    finished_at: Some(Utc::now()),
                    error_message: Some(message),
                    ..Default::default()
                },
            )?;
            load(conn, clip_id)
        })
    }

    /// Entries waiting for a worker, oldest first, with the clip filename.
    pub fn list_pending(&self) -> Result<Vec<QueueEntry>, ClipError> {
        self.db.with_conn(|conn| {
            queue_repo::list_by_status(conn, QueueStatus::Pending.as_str())?
                .into_iter()
                .map(QueueEntry::from_row)
                .collect()
        })
    }

    /// The clip's entry. A clip without any entry is reported as
    /// `Inconsistent`: ingestion always creates one.
    pub fn get_by_clip(&self, clip_id: i64) -> Result<QueueEntry, ClipError> {
        self.db.with_conn(|conn| match queue_repo::find_by_clip(conn, clip_id)? {
            Some(row) => QueueEntry::from_row(row),
            None if clip_repo::exists(conn, clip_id)? => Err(ClipError::Inconsistent(format!(
                "clip {} has no queue entry",
                clip_id
            ))),
            None => Err(ClipError::not_found("clip", clip_id)),
        })
    }

    pub fn get_all(&self) -> Result<Vec<QueueEntry>, ClipError> {
        self.db.with_conn(|conn| {
            queue_repo::list_all(conn)?
                .into_iter()
                .map(QueueEntry::from_row)
                .collect()
        })
    }

    /// Claims the oldest pending entry this caller can win via
    /// `mark_queued → mark_transcoding`. Entries lost to another worker are
    /// skipped. Returns `None` when nothing is left to claim.
    pub fn claim_next(&self) -> Result<Option<QueueEntry>, ClipError> {
        for candidate in self.list_pending()? {
            let clip_id = candidate.clip_id;
            match self.mark_queued(clip_id) {
                Ok(_) => {}
                Err(ClipError::InvalidTransition { .. }) | Err(ClipError::NotFound { .. }) => {
                    debug!(clip_id, "Pending entry claimed elsewhere, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            }
            match self.mark_transcoding(clip_id) {
                Ok(entry) => return Ok(Some(entry)),
                Err(ClipError::InvalidTransition { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

/// Inserts a pending entry on an open connection, so ingestion can run it
/// inside its own transaction.
pub(crate) fn enqueue(
    conn: &Connection,
    clip_id: i64,
    operation: &Operation,
) -> Result<QueueEntry, ClipError> {
    operation.validate(clip_id)?;

    if !clip_repo::exists(conn, clip_id)? {
        return Err(ClipError::not_found("clip", clip_id));
    }
    if let Operation::Combine { with_clip_id } = *operation {
        if !clip_repo::exists(conn, with_clip_id)? {
            return Err(ClipError::not_found("clip", with_clip_id));
        }
    }

    if let Some(raw) = queue_repo::find_status(conn, clip_id)? {
        let status = parse_status(&raw, clip_id)?;
        if !status.is_terminal() {
            return Err(ClipError::DuplicateEntry { clip_id, status });
        }
        debug!(clip_id, %status, "Replacing terminal queue entry");
        queue_repo::delete_by_clip(conn, clip_id)?;
    }

    match queue_repo::insert(conn, &operation.to_new_entry(clip_id)) {
        Ok(_) => {}
        Err(e) if e.is_unique_violation() => {
            let status = queue_repo::find_status(conn, clip_id)?
                .map(|raw| parse_status(&raw, clip_id))
                .transpose()?
                .unwrap_or(QueueStatus::Pending);
            return Err(ClipError::DuplicateEntry { clip_id, status });
        }
        Err(e) => return Err(e.into()),
    }

    info!(clip_id, operation = operation.kind(), "Clip enqueued");
    load(conn, clip_id)
}

/// Runs the conditional update for `update.status` and explains a miss.
fn apply_transition(
    conn: &Connection,
    clip_id: i64,
    update: &StatusUpdate<'_>,
) -> Result<(), ClipError> {
    let to = parse_status(update.status, clip_id)?;
    let from: Vec<&str> = to.predecessors().iter().map(|s| s.as_str()).collect();

    if queue_repo::transition(conn, clip_id, &from, update)? == 1 {
        info!(clip_id, status = %to, "Queue entry transitioned");
        return Ok(());
    }

    match queue_repo::find_status(conn, clip_id)? {
        None => Err(ClipError::not_found("queue entry", clip_id)),
        Some(raw) => {
            let current = parse_status(&raw, clip_id)?;
            debug!(clip_id, from = %current, to = %to, "Rejected queue transition");
            Err(ClipError::InvalidTransition {
                clip_id,
                from: current,
                to,
            })
        }
    }
}

fn load(conn: &Connection, clip_id: i64) -> Result<QueueEntry, ClipError> {
    let row = queue_repo::find_by_clip(conn, clip_id)?
        .ok_or_else(|| ClipError::not_found("queue entry", clip_id))?;
    QueueEntry::from_row(row)
}
