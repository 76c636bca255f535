pub mod archive;
pub mod catalog;
pub mod config;
pub mod correlation;
pub mod db;
pub mod error;
pub mod events;
pub mod ingest;
pub mod library;
pub mod lifecycle;
pub mod tags;

pub use archive::ClipArchive;
pub use catalog::{Catalog, Legend, Map, User};
pub use config::{load_config, Config};
pub use correlation::{Correlation, MatchPolicy, TemporalCorrelator};
pub use db::{Database, DatabaseError};
pub use error::{ArchiveError, ClipError, ConfigError, Fault, Result};
pub use events::{EventHistoryIndex, EventRecord, ExternalMatch, NewEvent, TimeWindow};
pub use ingest::IngestionOrchestrator;
pub use library::{Classification, Clip, ClipLibrary, MediaLocator, MediaUris};
pub use lifecycle::{LifecycleController, Operation, QueueEntry, QueueStatus};
pub use tags::{ReconcileOutcome, Tag, TagReconciler, TagVocabulary};
