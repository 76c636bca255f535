//! Match-history correlation against stored clips.

mod common;

use cliparchive::db::clip_repo;
use cliparchive::{ClipError, ExternalMatch, MatchPolicy, QueueStatus};

use common::{at, MatchBuilder, TestHarness};

/// A finished clip of `owner` covering `[100, 160]`.
fn clip_100_to_160(harness: &TestHarness, owner: i64) -> i64 {
    harness.processed_clip(owner, "window.mp4", at(160), 60.0)
}

#[test]
fn test_overlap_examples() {
    let harness = TestHarness::new();
    let clip_id = clip_100_to_160(&harness, 1);
    let events = &harness.archive.events;

    let straddles_start = events.record(MatchBuilder::new(1, 90, 110).build()).unwrap();
    let straddles_end = events.record(MatchBuilder::new(1, 150, 200).build()).unwrap();
    let inside = events.record(MatchBuilder::new(1, 120, 130).build()).unwrap();
    let encloses = events.record(MatchBuilder::new(1, 50, 300).build()).unwrap();
    events.record(MatchBuilder::new(1, 10, 20).build()).unwrap();
    events.record(MatchBuilder::new(2, 120, 130).build()).unwrap();

    let clip = harness.archive.library.get(clip_id).unwrap();
    let ids: Vec<i64> = harness
        .archive
        .correlator
        .find_overlapping_events(1, &clip)
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(
        ids,
        vec![encloses.id, straddles_start.id, inside.id, straddles_end.id]
    );
}

#[test]
fn test_correlate_copies_match_attributes() {
    let harness = TestHarness::new();
    let clip_id = clip_100_to_160(&harness, 1);
    harness
        .archive
        .events
        .record(MatchBuilder::new(1, 98, 400).map(3).legend(5).mode("ranked").build())
        .unwrap();

    let outcome = harness.archive.correlator.correlate(clip_id).unwrap();
    assert_eq!(outcome.candidates, 1);

    let clip = harness.archive.library.get(clip_id).unwrap();
    assert_eq!(clip.map, Some(3));
    assert_eq!(clip.legend, Some(5));
    assert_eq!(clip.game_mode.as_deref(), Some("ranked"));
    assert_eq!(clip.match_history_found, Some(true));
}

#[test]
fn test_policies_disagree_on_same_history() {
    for (policy, expected_map) in [
        (MatchPolicy::NearestStart, 1),
        (MatchPolicy::LongestOverlap, 2),
    ] {
        let harness = TestHarness::with_policy(policy);
        let clip_id = clip_100_to_160(&harness, 1);
        let events = &harness.archive.events;
        events.record(MatchBuilder::new(1, 99, 105).map(1).build()).unwrap();
        events.record(MatchBuilder::new(1, 110, 500).map(2).build()).unwrap();

        harness.archive.correlator.correlate(clip_id).unwrap();
        assert_eq!(
            harness.archive.library.get(clip_id).unwrap().map,
            Some(expected_map),
            "policy {}",
            policy
        );
    }
}

#[test]
fn test_no_history_marks_clip() {
    let harness = TestHarness::new();
    let clip_id = clip_100_to_160(&harness, 1);
    harness
        .archive
        .events
        .record(MatchBuilder::new(1, 161, 200).map(9).build())
        .unwrap();

    let outcome = harness.archive.correlator.correlate(clip_id).unwrap();
    assert!(outcome.matched.is_none());
    let clip = harness.archive.library.get(clip_id).unwrap();
    assert_eq!(clip.match_history_found, Some(false));
    assert_eq!(clip.map, None);
}

#[test]
fn test_external_matches_flow_into_correlation() {
    let harness = TestHarness::new();
    let catalog = &harness.archive.catalog;
    let user = catalog.add_user("kai", Some("kai_apex"), Some("9001")).unwrap();
    let map = catalog.add_map("Broken Moon", Some("mp_rr_divided_moon"), None).unwrap();
    let legend = catalog.add_legend("Horizon", None).unwrap();
    let clip_id = clip_100_to_160(&harness, user.id);

    harness
        .archive
        .events
        .record_external(ExternalMatch {
            player_uid: "9001".to_string(),
            start: at(0),
            end: at(900),
            map_log_name: Some("mp_rr_divided_moon".to_string()),
            legend_name: Some("Horizon".to_string()),
            game_mode: Some("duos".to_string()),
        })
        .unwrap();

    harness.archive.correlator.correlate(clip_id).unwrap();
    let clip = harness.archive.library.get(clip_id).unwrap();
    assert_eq!(clip.map, Some(map.id));
    assert_eq!(clip.legend, Some(legend.id));
    assert_eq!(clip.game_mode.as_deref(), Some("duos"));
}

#[test]
fn test_external_match_for_unknown_player() {
    let harness = TestHarness::new();
    let err = harness
        .archive
        .events
        .record_external(ExternalMatch {
            player_uid: "nobody".to_string(),
            start: at(0),
            end: at(10),
            map_log_name: None,
            legend_name: None,
            game_mode: None,
        })
        .unwrap_err();
    assert!(matches!(err, ClipError::NotFound { entity: "user", .. }));
}

#[test]
fn test_huge_duration_never_reaches_correlation() {
    let harness = TestHarness::new();
    let lifecycle = &harness.archive.lifecycle;
    let clip_id = harness.ingest(1, "long.mp4", at(1_700_000_000));
    lifecycle.mark_transcoding(clip_id).unwrap();

    let err = lifecycle.mark_finished(clip_id, 1e13).unwrap_err();
    assert!(matches!(err, ClipError::InvalidArgument(_)));
    assert_eq!(
        lifecycle.get_by_clip(clip_id).unwrap().status,
        QueueStatus::Transcoding
    );

    // Rows written by other tools are reported, not trusted.
    harness
        .archive
        .database()
        .with_conn(|conn| clip_repo::mark_processed(conn, clip_id, 1e13))
        .unwrap();
    let err = harness.archive.correlator.correlate(clip_id).unwrap_err();
    assert!(matches!(err, ClipError::InvalidArgument(_)));
}
