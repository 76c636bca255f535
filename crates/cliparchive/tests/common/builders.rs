//! Builder patterns for creating test data programmatically.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};

use cliparchive::config::{CorrelationConfig, LoggingConfig, MediaConfig};
use cliparchive::{Config, MatchPolicy, NewEvent};

/// Seconds since the epoch as a UTC timestamp.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// Builder for creating `Config` instances.
pub struct ConfigBuilder {
    version: String,
    database_path: Option<PathBuf>,
    base_url: String,
    policy: MatchPolicy,
    level: String,
    json: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: None,
            base_url: "http://localhost:8080/clips/archive".to_string(),
            policy: MatchPolicy::NearestStart,
            level: "debug".to_string(),
            json: false,
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    pub fn database_path(mut self, path: PathBuf) -> Self {
        self.database_path = Some(path);
        self
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.level = level.to_string();
        self
    }

    pub fn build(self) -> Config {
        Config {
            version: self.version,
            database_path: self.database_path,
            media: MediaConfig {
                base_url: self.base_url,
            },
            correlation: CorrelationConfig {
                policy: self.policy,
            },
            logging: LoggingConfig {
                level: self.level,
                json: self.json,
            },
        }
    }

    /// The config as the JSON a user would write.
    pub fn to_json(self) -> String {
        serde_json::to_string_pretty(&self.build()).expect("Config serializes")
    }
}

/// Builder for match records of one user.
pub struct MatchBuilder {
    event: NewEvent,
}

impl MatchBuilder {
    pub fn new(subject_id: i64, start: i64, end: i64) -> Self {
        Self {
            event: NewEvent {
                subject_id,
                start: at(start),
                end: at(end),
                map: None,
                legend: None,
                game_mode: None,
            },
        }
    }

    pub fn map(mut self, map: i64) -> Self {
        self.event.map = Some(map);
        self
    }

    pub fn legend(mut self, legend: i64) -> Self {
        self.event.legend = Some(legend);
        self
    }

    pub fn mode(mut self, mode: &str) -> Self {
        self.event.game_mode = Some(mode.to_string());
        self
    }

    pub fn build(self) -> NewEvent {
        self.event
    }
}
