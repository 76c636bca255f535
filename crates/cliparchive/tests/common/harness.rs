//! Test harness for isolated test execution.
//!
//! Every harness owns a temporary directory holding its database file, so
//! tests never share state and several connections can be opened on the
//! same store.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tempfile::TempDir;

use cliparchive::{ClipArchive, Config, MatchPolicy};

use super::builders::ConfigBuilder;

pub struct TestHarness {
    temp_dir: TempDir,
    pub config: Config,
    pub archive: ClipArchive,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(ConfigBuilder::new())
    }

    pub fn with_policy(policy: MatchPolicy) -> Self {
        Self::with_config(ConfigBuilder::new().policy(policy))
    }

    fn with_config(builder: ConfigBuilder) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = builder
            .database_path(temp_dir.path().join("data").join("archive.db"))
            .build();
        let archive = ClipArchive::open(&config).expect("Failed to open archive");
        Self {
            temp_dir,
            config,
            archive,
        }
    }

    /// A second, independent connection to the same database file.
    pub fn reopen(&self) -> ClipArchive {
        ClipArchive::open(&self.config).expect("Failed to reopen archive")
    }

    pub fn database_path(&self) -> PathBuf {
        self.config
            .database_path
            .clone()
            .expect("harness always sets a database path")
    }

    /// Ingests a clip for `owner` created at `created_at`, returning its id.
    pub fn ingest(&self, owner: i64, filename: &str, created_at: DateTime<Utc>) -> i64 {
        self.archive
            .ingest
            .ingest(owner, filename, created_at)
            .expect("ingest failed")
            .id
    }

    /// Ingests a clip and drives it to `finished` with the given duration.
    pub fn processed_clip(
        &self,
        owner: i64,
        filename: &str,
        created_at: DateTime<Utc>,
        duration: f64,
    ) -> i64 {
        let clip_id = self.ingest(owner, filename, created_at);
        let lifecycle = &self.archive.lifecycle;
        lifecycle.mark_queued(clip_id).expect("mark_queued failed");
        lifecycle
            .mark_transcoding(clip_id)
            .expect("mark_transcoding failed");
        lifecycle
            .mark_finished(clip_id, duration)
            .expect("mark_finished failed");
        clip_id
    }
}
