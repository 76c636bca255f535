//! Clip ingestion: the clip row and its first queue entry are written as one
//! unit of work.

use chrono::{DateTime, Utc};
use tracing::{info, info_span, warn};

use crate::db::{clip_repo, Database};
use crate::error::ClipError;
use crate::library::{self, Clip};
use crate::lifecycle::controller::enqueue;
use crate::lifecycle::Operation;

#[derive(Clone)]
pub struct IngestionOrchestrator {
    db: Database,
}

impl IngestionOrchestrator {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Stores an unprocessed clip and a `pending` transcode entry for it.
    ///
    /// Both rows are written in one transaction: if the entry cannot be
    /// created the clip is rolled back too.
    pub fn ingest(
        &self,
        owner_id: i64,
        filename: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Clip, ClipError> {
        let _span = info_span!("ingest", owner_id, filename).entered();

        let filename = filename.trim();
        if filename.is_empty() {
            return Err(ClipError::InvalidArgument(
                "filename must not be empty".to_string(),
            ));
        }

        let clip = self.db.with_tx(|tx| {
            let clip_id = clip_repo::insert(tx, owner_id, filename, &created_at)?;
            enqueue(tx, clip_id, &Operation::Transcode)?;
            library::load(tx, clip_id)?.ok_or_else(|| {
                ClipError::Inconsistent(format!("clip {} vanished during ingestion", clip_id))
            })
        })?;

        info!(clip_id = clip.id, "Clip ingested");
        Ok(clip)
    }

    /// Enqueues a transcode for every clip that has no queue entry at all.
    ///
    /// Such clips only come from data written before ingestion became
    /// transactional, or by other writers. Returns the ids that were healed.
    pub fn repair_orphans(&self) -> Result<Vec<i64>, ClipError> {
        let _span = info_span!("repair_orphans").entered();

        let healed = self.db.with_tx(|tx| {
            let orphans = clip_repo::list_without_queue_entry(tx)?;
            let mut healed = Vec::with_capacity(orphans.len());
            for orphan in orphans {
                warn!(clip_id = orphan.id, filename = %orphan.filename, "Clip has no queue entry");
                enqueue(tx, orphan.id, &Operation::Transcode)?;
                healed.push(orphan.id);
            }
            Ok::<_, ClipError>(healed)
        })?;

        if !healed.is_empty() {
            info!(count = healed.len(), "Orphaned clips enqueued");
        }
        Ok(healed)
    }
}
