mod common;

use std::fs;

use cliparchive::config::load_config;
use cliparchive::{ClipArchive, ConfigError, MatchPolicy};
use tempfile::TempDir;

use common::{at, ConfigBuilder};

#[test]
fn test_written_config_round_trips_through_loader() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    let json = ConfigBuilder::new()
        .database_path(dir.path().join("db").join("archive.db"))
        .base_url("https://media.example.org/clips")
        .policy(MatchPolicy::LongestOverlap)
        .to_json();
    fs::write(&path, json).unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.correlation.policy, MatchPolicy::LongestOverlap);

    let archive = ClipArchive::open(&config).unwrap();
    let clip = archive.ingest.ingest(1, "a.mp4", at(10)).unwrap();
    let uris = archive.library.media_uris(&clip);
    assert_eq!(uris.video_uri, "https://media.example.org/clips/a.mp4");
    assert!(dir.path().join("db").join("archive.db").exists());
}

#[test]
fn test_invalid_configs_are_rejected() {
    let dir = TempDir::new().unwrap();
    let cases = [
        ConfigBuilder::new().version("0.9").to_json(),
        ConfigBuilder::new().base_url("localhost/clips").to_json(),
        ConfigBuilder::new().log_level("loud").to_json(),
    ];
    for (i, json) in cases.into_iter().enumerate() {
        let path = dir.path().join(format!("bad-{}.json", i));
        fs::write(&path, json).unwrap();
        assert!(
            matches!(load_config(&path), Err(ConfigError::Validation { .. })),
            "case {} should fail validation",
            i
        );
    }
}

#[test]
fn test_malformed_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ \"version\": ").unwrap();
    assert!(matches!(load_config(&path), Err(ConfigError::ParseJson(_))));
}
