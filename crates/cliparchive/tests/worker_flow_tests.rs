//! Ingestion and the worker contract, driven end to end against a file
//! database.

mod common;

use std::collections::BTreeSet;
use std::sync::Barrier;

use cliparchive::{ClipError, Operation, QueueStatus};

use common::{at, TestHarness};

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_ingested_clip_is_visible_to_workers() {
    let harness = TestHarness::new();
    let clip_id = harness.ingest(1, "ace.mp4", at(1_000));

    let clip = harness.archive.library.get(clip_id).unwrap();
    assert!(!clip.processed);
    assert_eq!(clip.duration, None);

    let pending = harness.archive.lifecycle.list_pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].clip_id, clip_id);
    assert_eq!(pending[0].filename.as_deref(), Some("ace.mp4"));
}

#[test]
fn test_full_worker_cycle() {
    let harness = TestHarness::new();
    let first = harness.ingest(1, "one.mp4", at(1_000));
    let second = harness.ingest(1, "two.mp4", at(2_000));
    let lifecycle = &harness.archive.lifecycle;

    let claimed = lifecycle.claim_next().unwrap().unwrap();
    assert_eq!(claimed.clip_id, first);
    assert_eq!(claimed.status, QueueStatus::Transcoding);
    assert!(claimed.started_at.is_some());

    let finished = lifecycle.mark_finished(first, 42.5).unwrap();
    assert_eq!(finished.status, QueueStatus::Finished);
    assert!(finished.finished_at.is_some());
    let clip = harness.archive.library.get(first).unwrap();
    assert!(clip.processed);
    assert_eq!(clip.duration, Some(42.5));

    let claimed = lifecycle.claim_next().unwrap().unwrap();
    assert_eq!(claimed.clip_id, second);
    let failed = lifecycle.mark_error(second, "ffmpeg exited with 1").unwrap();
    assert_eq!(failed.status, QueueStatus::Error);
    assert_eq!(failed.error_message.as_deref(), Some("ffmpeg exited with 1"));
    assert!(!harness.archive.library.get(second).unwrap().processed);

    assert!(lifecycle.claim_next().unwrap().is_none());
}

#[test]
fn test_terminal_entries_stay_terminal() {
    let harness = TestHarness::new();
    let clip_id = harness.processed_clip(1, "done.mp4", at(500), 10.0);
    let lifecycle = &harness.archive.lifecycle;

    assert!(matches!(
        lifecycle.mark_transcoding(clip_id),
        Err(ClipError::InvalidTransition {
            from: QueueStatus::Finished,
            to: QueueStatus::Transcoding,
            ..
        })
    ));
    assert!(matches!(
        lifecycle.mark_error(clip_id, "late"),
        Err(ClipError::InvalidTransition { .. })
    ));
}

#[test]
fn test_reenqueue_after_finish() {
    let harness = TestHarness::new();
    let clip_id = harness.processed_clip(1, "long.mp4", at(500), 90.0);
    let lifecycle = &harness.archive.lifecycle;

    let trim = Operation::Trim {
        start_seconds: 10,
        end_seconds: 40,
    };
    let entry = lifecycle.create(clip_id, trim.clone()).unwrap();
    assert_eq!(entry.status, QueueStatus::Pending);
    assert_eq!(entry.operation, trim);

    assert!(matches!(
        lifecycle.create(clip_id, Operation::Transcode),
        Err(ClipError::DuplicateEntry {
            status: QueueStatus::Pending,
            ..
        })
    ));
    assert_eq!(lifecycle.get_all().unwrap().len(), 1);
}

#[test]
fn test_concurrent_claims_from_separate_connections() {
    let harness = TestHarness::new();
    let clip_id = harness.ingest(1, "race.mp4", at(1_000));
    let workers = [harness.reopen(), harness.reopen()];
    let barrier = Barrier::new(workers.len());

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = workers
            .iter()
            .map(|archive| {
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    archive.lifecycle.mark_queued(clip_id)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results.iter().any(|r| matches!(
        r,
        Err(ClipError::InvalidTransition {
            from: QueueStatus::Queued,
            ..
        })
    )));
}

#[test]
fn test_delete_removes_everything_for_clip() {
    let harness = TestHarness::new();
    let clip_id = harness.ingest(1, "gone.mp4", at(1_000));
    let tags = set(&["clutch", "squad"]);
    harness.archive.tags.apply_desired(clip_id, &tags).unwrap();

    harness.archive.library.delete(clip_id).unwrap();

    assert!(matches!(
        harness.archive.lifecycle.get_by_clip(clip_id),
        Err(ClipError::NotFound { .. })
    ));
    assert!(harness.archive.tags.tags_for_clip(clip_id).unwrap().is_empty());
    assert_eq!(harness.archive.vocabulary.all().unwrap().len(), 2);
}

#[test]
fn test_tag_reconciliation_across_connections() {
    let harness = TestHarness::new();
    let clip_id = harness.ingest(1, "tags.mp4", at(1_000));

    harness
        .archive
        .tags
        .reconcile(clip_id, &set(&[]), &set(&["a", "b", "c"]))
        .unwrap();
    let other = harness.reopen();
    let outcome = other
        .tags
        .reconcile(clip_id, &set(&["a", "b", "c"]), &set(&["b", "d"]))
        .unwrap();
    assert_eq!(outcome.added, vec!["d"]);
    assert_eq!(outcome.removed, vec!["a", "c"]);
    assert_eq!(
        harness.archive.library.get(clip_id).unwrap().tags,
        set(&["b", "d"])
    );
}
