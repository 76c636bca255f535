//! All archive components wired to one database.

use std::path::PathBuf;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::correlation::TemporalCorrelator;
use crate::db::{Database, DatabaseError};
use crate::error::{ConfigError, Result};
use crate::events::EventHistoryIndex;
use crate::ingest::IngestionOrchestrator;
use crate::library::ClipLibrary;
use crate::lifecycle::LifecycleController;
use crate::tags::{TagReconciler, TagVocabulary};

/// Every component shares the same `Database` handle.
#[derive(Clone)]
pub struct ClipArchive {
    pub lifecycle: LifecycleController,
    pub ingest: IngestionOrchestrator,
    pub tags: TagReconciler,
    pub vocabulary: TagVocabulary,
    pub events: EventHistoryIndex,
    pub correlator: TemporalCorrelator,
    pub library: ClipLibrary,
    pub catalog: Catalog,
    db: Database,
}

impl ClipArchive {
    /// Opens the configured database (running migrations) and builds the
    /// components.
    pub fn open(config: &Config) -> Result<Self> {
        let path: PathBuf = config.database_path().ok_or_else(|| ConfigError::Validation {
            message: "No database_path configured and no home directory found".to_string(),
        })?;
        let db = Database::open(&path)?;
        Ok(Self::with_database(db, config))
    }

    pub fn open_in_memory(config: &Config) -> std::result::Result<Self, DatabaseError> {
        Ok(Self::with_database(Database::open_in_memory()?, config))
    }

    pub fn with_database(db: Database, config: &Config) -> Self {
        Self {
            lifecycle: LifecycleController::new(db.clone()),
            ingest: IngestionOrchestrator::new(db.clone()),
            tags: TagReconciler::new(db.clone()),
            vocabulary: TagVocabulary::new(db.clone()),
            events: EventHistoryIndex::new(db.clone()),
            correlator: TemporalCorrelator::new(db.clone(), config.correlation.policy),
            library: ClipLibrary::new(db.clone(), config.media_locator()),
            catalog: Catalog::new(db.clone()),
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
