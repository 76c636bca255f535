use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::clip_repo::{ClassificationUpdate, ClipRow};

/// A stored clip together with its tag names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: i64,
    pub owner_id: i64,
    pub filename: String,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
    /// Length in seconds. Only present once the clip has been processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub map: Option<i64>,
    pub game_mode: Option<String>,
    pub legend: Option<i64>,
    pub match_history_found: Option<bool>,
    pub tags: BTreeSet<String>,
}

impl Clip {
    pub(crate) fn from_row(row: ClipRow, tags: impl IntoIterator<Item = String>) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            filename: row.filename,
            processed: row.is_processed,
            created_at: row.created_at,
            duration: if row.is_processed { row.duration } else { None },
            map: row.map,
            game_mode: row.game_mode,
            legend: row.legend,
            match_history_found: row.match_history_found,
            tags: tags.into_iter().collect(),
        }
    }

    pub fn classification(&self) -> Classification {
        Classification {
            map: self.map,
            legend: self.legend,
            game_mode: self.game_mode.clone(),
        }
    }
}

/// Gameplay context attached to a clip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub map: Option<i64>,
    pub legend: Option<i64>,
    pub game_mode: Option<String>,
}

impl Classification {
    pub(crate) fn into_update(self, match_history_found: Option<bool>) -> ClassificationUpdate {
        ClassificationUpdate {
            map: self.map,
            game_mode: self.game_mode,
            legend: self.legend,
            match_history_found,
        }
    }
}
