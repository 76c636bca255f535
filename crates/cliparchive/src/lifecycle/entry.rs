use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::queue_repo::{NewQueueEntry, QueueEntryRow};
use crate::error::ClipError;

use super::status::QueueStatus;

/// The media operation a queue entry asks the worker to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Operation {
    Transcode,
    /// Keep only `[start_seconds, end_seconds)` of the clip.
    #[serde(rename_all = "camelCase")]
    Trim { start_seconds: i64, end_seconds: i64 },
    /// Append another clip to this one.
    #[serde(rename_all = "camelCase")]
    Combine { with_clip_id: i64 },
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Transcode => "transcode",
            Operation::Trim { .. } => "trim",
            Operation::Combine { .. } => "combine",
        }
    }

    /// Checks parameters that can be judged without the store.
    pub fn validate(&self, clip_id: i64) -> Result<(), ClipError> {
        match *self {
            Operation::Transcode => Ok(()),
            Operation::Trim {
                start_seconds,
                end_seconds,
            } => {
                if start_seconds < 0 || end_seconds <= start_seconds {
                    return Err(ClipError::InvalidArgument(format!(
                        "trim window must satisfy 0 <= start < end, got [{}, {}]",
                        start_seconds, end_seconds
                    )));
                }
                Ok(())
            }
            Operation::Combine { with_clip_id } => {
                if with_clip_id == clip_id {
                    return Err(ClipError::InvalidArgument(format!(
                        "clip {} cannot be combined with itself",
                        clip_id
                    )));
                }
                Ok(())
            }
        }
    }

    pub(crate) fn to_new_entry(&self, clip_id: i64) -> NewQueueEntry<'static> {
        let mut entry = NewQueueEntry {
            clip_id,
            operation: self.kind(),
            ..Default::default()
        };
        match *self {
            Operation::Transcode => {}
            Operation::Trim {
                start_seconds,
                end_seconds,
            } => {
                entry.desired_start_time = Some(start_seconds);
                entry.desired_end_time = Some(end_seconds);
            }
            Operation::Combine { with_clip_id } => entry.combine_with_id = Some(with_clip_id),
        }
        entry
    }

    fn from_row(row: &QueueEntryRow) -> Result<Self, ClipError> {
        match row.operation.as_str() {
            "transcode" => Ok(Operation::Transcode),
            "trim" => match (row.desired_start_time, row.desired_end_time) {
                (Some(start_seconds), Some(end_seconds)) => Ok(Operation::Trim {
                    start_seconds,
                    end_seconds,
                }),
                _ => Err(ClipError::Inconsistent(format!(
                    "trim entry for clip {} is missing its window",
                    row.clip_id
                ))),
            },
            "combine" => row
                .combine_with_id
                .map(|with_clip_id| Operation::Combine { with_clip_id })
                .ok_or_else(|| {
                    ClipError::Inconsistent(format!(
                        "combine entry for clip {} has no target clip",
                        row.clip_id
                    ))
                }),
            other => Err(ClipError::Inconsistent(format!(
                "unknown operation '{}' for clip {}",
                other, row.clip_id
            ))),
        }
    }
}

/// A clip's processing record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: i64,
    pub clip_id: i64,
    pub status: QueueStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Filename of the clip, for workers locating the source media.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl QueueEntry {
    pub(crate) fn from_row(row: QueueEntryRow) -> Result<Self, ClipError> {
        let status = parse_status(&row.status, row.clip_id)?;
        let operation = Operation::from_row(&row)?;
        Ok(Self {
            id: row.id,
            clip_id: row.clip_id,
            status,
            started_at: row.started_at,
            finished_at: row.finished_at,
            operation,
            error_message: row.error_message,
            filename: row.filename,
        })
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

pub(crate) fn parse_status(raw: &str, clip_id: i64) -> Result<QueueStatus, ClipError> {
    raw.parse().map_err(|e: String| {
        ClipError::Inconsistent(format!("queue entry for clip {}: {}", clip_id, e))
    })
}
