//! Match history: timestamped gameplay records per user.
//!
//! Records are append-only. The index answers one question for the
//! correlator: which of a user's matches intersect a given time window.

mod window;

pub use window::TimeWindow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::db::event_repo::{self, MatchHistoryRow};
use crate::db::{catalog_repo, Database};
use crate::error::ClipError;

/// A stored match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: i64,
    pub subject_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub map: Option<i64>,
    pub legend: Option<i64>,
    pub game_mode: Option<String>,
}

impl EventRecord {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::spanning(self.start, self.end)
    }
}

impl From<MatchHistoryRow> for EventRecord {
    fn from(row: MatchHistoryRow) -> Self {
        Self {
            id: row.id,
            subject_id: row.user_id,
            start: row.game_start,
            end: row.game_end,
            map: row.map,
            legend: row.legend,
            game_mode: row.game_mode,
        }
    }
}

/// A match already expressed in catalog ids.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub subject_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub map: Option<i64>,
    #[serde(default)]
    pub legend: Option<i64>,
    #[serde(default)]
    pub game_mode: Option<String>,
}

/// A match as reported by the external match logger, keyed by names.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalMatch {
    pub player_uid: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub map_log_name: Option<String>,
    #[serde(default)]
    pub legend_name: Option<String>,
    #[serde(default)]
    pub game_mode: Option<String>,
}

#[derive(Clone)]
pub struct EventHistoryIndex {
    db: Database,
}

impl EventHistoryIndex {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Appends a match. Fails with `InvalidArgument` when `start > end`.
    pub fn record(&self, event: NewEvent) -> Result<EventRecord, ClipError> {
        TimeWindow::new(event.start, event.end)?;

        let mut row = MatchHistoryRow {
            id: 0,
            user_id: event.subject_id,
            game_start: event.start,
            game_end: event.end,
            map: event.map,
            legend: event.legend,
            game_mode: event.game_mode,
        };
        row.id = self.db.with_conn(|conn| event_repo::insert(conn, &row))?;
        debug!(event_id = row.id, subject_id = row.user_id, "Match recorded");
        Ok(row.into())
    }

    /// Resolves the names of an external match through the catalog and
    /// appends it.
    ///
    /// An unknown player fails with `NotFound`. Unknown map or legend names
    /// are logged and stored as empty attributes.
    pub fn record_external(&self, external: ExternalMatch) -> Result<EventRecord, ClipError> {
        let (user_id, map, legend) = self.db.with_conn(|conn| -> Result<_, ClipError> {
            let user = catalog_repo::find_user_by_apex_uid(conn, &external.player_uid)?
                .ok_or_else(|| ClipError::not_found("user", &external.player_uid))?;

            let map = match external.map_log_name.as_deref() {
                Some(name) => {
                    let found = catalog_repo::find_map_by_als_name(conn, name)?;
                    if found.is_none() {
                        warn!(map = name, "Unknown map in external match");
                    }
                    found.map(|m| m.id)
                }
                None => None,
            };

            let legend = match external.legend_name.as_deref() {
                Some(name) => {
                    let found = catalog_repo::find_legend_by_name(conn, name)?;
                    if found.is_none() {
                        warn!(legend = name, "Unknown legend in external match");
                    }
                    found.map(|l| l.id)
                }
                None => None,
            };

            Ok((user.id, map, legend))
        })?;

        self.record(NewEvent {
            subject_id: user_id,
            start: external.start,
            end: external.end,
            map,
            legend,
            game_mode: external.game_mode,
        })
    }

    /// The subject's matches intersecting `window`, ordered by start then id.
    pub fn overlapping(
        &self,
        subject_id: i64,
        window: &TimeWindow,
    ) -> Result<Vec<EventRecord>, ClipError> {
        let rows = self.db.with_conn(|conn| {
            event_repo::find_overlapping(conn, subject_id, &window.start(), &window.end())
        })?;
        Ok(rows.into_iter().map(EventRecord::from).collect())
    }

    pub fn for_subject(&self, subject_id: i64) -> Result<Vec<EventRecord>, ClipError> {
        let rows = self
            .db
            .with_conn(|conn| event_repo::list_for_user(conn, subject_id))?;
        Ok(rows.into_iter().map(EventRecord::from).collect())
    }
}
