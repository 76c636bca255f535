use std::path::PathBuf;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::lifecycle::QueueStatus;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Clip(#[from] ClipError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Errors surfaced by the lifecycle, tagging, correlation and ingestion
/// components.
#[derive(Error, Debug)]
pub enum ClipError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Clip {clip_id} already has an active queue entry ({status})")]
    DuplicateEntry { clip_id: i64, status: QueueStatus },

    #[error("Invalid transition for clip {clip_id}: {from} -> {to}")]
    InvalidTransition {
        clip_id: i64,
        from: QueueStatus,
        to: QueueStatus,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Inconsistent state: {0}")]
    Inconsistent(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] DatabaseError),
}

/// Which side of a request an error should be blamed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Client,
    Server,
}

impl ClipError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        ClipError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn fault(&self) -> Fault {
        match self {
            ClipError::NotFound { .. }
            | ClipError::DuplicateEntry { .. }
            | ClipError::InvalidTransition { .. }
            | ClipError::InvalidArgument(_) => Fault::Client,
            ClipError::Inconsistent(_) | ClipError::StoreUnavailable(_) => Fault::Server,
        }
    }

    /// Only store failures are worth retrying, and only by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClipError::StoreUnavailable(_))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
