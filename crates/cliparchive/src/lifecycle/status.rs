use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    /// Newly created, not yet claimed by a worker.
    Pending,
    /// Acknowledged by a worker as next in line.
    Queued,
    /// A worker is processing the clip.
    Transcoding,
    Finished,
    Error,
}

impl QueueStatus {
    pub const ALL: [QueueStatus; 5] = [
        QueueStatus::Pending,
        QueueStatus::Queued,
        QueueStatus::Transcoding,
        QueueStatus::Finished,
        QueueStatus::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Queued => "queued",
            QueueStatus::Transcoding => "transcoding",
            QueueStatus::Finished => "finished",
            QueueStatus::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, QueueStatus::Finished | QueueStatus::Error)
    }

    /// States from which a transition into `self` is allowed.
    ///
    /// `pending` has no predecessors: it is only entered by enqueueing.
    pub fn predecessors(self) -> &'static [QueueStatus] {
        match self {
            QueueStatus::Pending => &[],
            QueueStatus::Queued => &[QueueStatus::Pending],
            QueueStatus::Transcoding => &[QueueStatus::Queued, QueueStatus::Pending],
            QueueStatus::Finished => &[QueueStatus::Transcoding],
            QueueStatus::Error => &[
                QueueStatus::Pending,
                QueueStatus::Queued,
                QueueStatus::Transcoding,
            ],
        }
    }

    pub fn can_transition_to(self, next: QueueStatus) -> bool {
        next.predecessors().contains(&self)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueueStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueueStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown queue status '{}'", s))
    }
}
