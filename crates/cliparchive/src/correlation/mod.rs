//! Temporal correlation of clips with match history.
//!
//! A clip covers `[created_at - duration, created_at]`: recording stops when
//! the clip is saved. Every match of the clip owner that intersects that
//! window is a candidate; the configured [`MatchPolicy`] picks one, and its
//! map, legend and game mode are copied onto the clip.

mod policy;

pub use policy::MatchPolicy;

use serde::Serialize;
use tracing::{debug, info, info_span};

use crate::db::{clip_repo, Database};
use crate::error::ClipError;
use crate::events::{EventHistoryIndex, EventRecord, TimeWindow};
use crate::library::{self, Classification, Clip};

/// Result of correlating one clip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Correlation {
    pub clip_id: i64,
    pub window: TimeWindow,
    pub candidates: usize,
    pub matched: Option<EventRecord>,
}

#[derive(Clone)]
pub struct TemporalCorrelator {
    db: Database,
    events: EventHistoryIndex,
    policy: MatchPolicy,
}

impl TemporalCorrelator {
    pub fn new(db: Database, policy: MatchPolicy) -> Self {
        Self {
            events: EventHistoryIndex::new(db.clone()),
            db,
            policy,
        }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Every match of `subject_id` intersecting the clip's window, ordered by
    /// start then id.
    pub fn find_overlapping_events(
        &self,
        subject_id: i64,
        clip: &Clip,
    ) -> Result<Vec<EventRecord>, ClipError> {
        self.events.overlapping(subject_id, &clip_window(clip)?)
    }

    /// Picks the best candidate for the clip under the configured policy.
    pub fn select_best<'a>(
        &self,
        clip: &Clip,
        candidates: &'a [EventRecord],
    ) -> Result<Option<&'a EventRecord>, ClipError> {
        Ok(self.policy.select(&clip_window(clip)?, candidates))
    }

    /// Correlates a stored clip and writes the outcome back.
    ///
    /// With a match, the clip's classification is overwritten and
    /// `match_history_found` becomes true. Without one only the flag is set
    /// to false.
    pub fn correlate(&self, clip_id: i64) -> Result<Correlation, ClipError> {
        let _span = info_span!("correlate", clip_id, policy = %self.policy).entered();

        let clip = self
            .db
            .with_conn(|conn| library::load(conn, clip_id))?
            .ok_or_else(|| ClipError::not_found("clip", clip_id))?;
        if !clip.processed {
            debug!("Clip not processed yet, using its creation instant");
        }

        let window = clip_window(&clip)?;
        let candidates = self.events.overlapping(clip.owner_id, &window)?;
        let matched = self.policy.select(&window, &candidates).cloned();

        let changed = self.db.with_conn(|conn| match &matched {
            Some(event) => {
                let classification = Classification {
                    map: event.map,
                    legend: event.legend,
                    game_mode: event.game_mode.clone(),
                };
                clip_repo::update_classification(
                    conn,
                    clip_id,
                    &classification.into_update(Some(true)),
                )
            }
            None => clip_repo::set_match_history_found(conn, clip_id, false),
        })?;
        if changed == 0 {
            return Err(ClipError::not_found("clip", clip_id));
        }

        match &matched {
            Some(event) => info!(
                event_id = event.id,
                candidates = candidates.len(),
                "Clip matched to history"
            ),
            None => info!("No match history overlaps clip"),
        }

        Ok(Correlation {
            clip_id,
            window,
            candidates: candidates.len(),
            matched,
        })
    }
}

/// The span of gameplay a clip covers. Unprocessed clips have no duration
/// yet and cover only their creation instant.
pub fn clip_window(clip: &Clip) -> Result<TimeWindow, ClipError> {
    let seconds = if clip.processed {
        clip.duration.unwrap_or(0.0)
    } else {
        0.0
    };
    TimeWindow::ending_at(clip.created_at, seconds)
}
