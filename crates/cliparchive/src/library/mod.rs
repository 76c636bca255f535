//! Read, classify and delete stored clips.

mod clip;
mod media;

pub use clip::{Classification, Clip};
pub use media::{MediaLocator, MediaUris};

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use rusqlite::Connection;
use tracing::info;

use crate::db::clip_repo::{self, ClipRow};
use crate::db::{queue_repo, tag_repo, Database};
use crate::error::ClipError;

#[derive(Clone)]
pub struct ClipLibrary {
    db: Database,
    media: MediaLocator,
}

impl ClipLibrary {
    pub fn new(db: Database, media: MediaLocator) -> Self {
        Self { db, media }
    }

    pub fn get(&self, id: i64) -> Result<Clip, ClipError> {
        self.db
            .with_conn(|conn| load(conn, id)?.ok_or_else(|| ClipError::not_found("clip", id)))
    }

    /// The oldest clip stored under `filename`.
    pub fn get_by_filename(&self, filename: &str) -> Result<Clip, ClipError> {
        self.db.with_conn(|conn| {
            let row = clip_repo::find_by_filename(conn, filename)?
                .ok_or_else(|| ClipError::not_found("clip", filename))?;
            with_tags(conn, row)
        })
    }

    /// Processed clips created on `date` (UTC), oldest first.
    pub fn processed_on(&self, date: NaiveDate) -> Result<Vec<Clip>, ClipError> {
        let next = date
            .succ_opt()
            .ok_or_else(|| ClipError::InvalidArgument(format!("date out of range: {}", date)))?;
        let from = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
        let to = Utc.from_utc_datetime(&next.and_time(NaiveTime::MIN));

        self.db.with_conn(|conn| {
            clip_repo::list_processed_between(conn, &from, &to)?
                .into_iter()
                .map(|row| with_tags(conn, row))
                .collect()
        })
    }

    /// Overwrites map, legend and game mode. `match_history_found` is kept.
    pub fn update_classification(
        &self,
        id: i64,
        classification: Classification,
    ) -> Result<Clip, ClipError> {
        self.db.with_tx(|tx| {
            let row = clip_repo::find_by_id(tx, id)?
                .ok_or_else(|| ClipError::not_found("clip", id))?;
            clip_repo::update_classification(
                tx,
                id,
                &classification.into_update(row.match_history_found),
            )?;
            load(tx, id)?.ok_or_else(|| ClipError::not_found("clip", id))
        })
    }

    /// Removes the clip with its queue entry and tag memberships.
    pub fn delete(&self, id: i64) -> Result<(), ClipError> {
        self.db.with_tx(|tx| {
            if !clip_repo::exists(tx, id)? {
                return Err(ClipError::not_found("clip", id));
            }
            queue_repo::delete_by_clip(tx, id)?;
            let tags = tag_repo::remove_all_for_clip(tx, id)?;
            clip_repo::delete(tx, id)?;
            info!(clip_id = id, tags, "Clip deleted");
            Ok(())
        })
    }

    pub fn media_uris(&self, clip: &Clip) -> MediaUris {
        self.media.uris(&clip.filename)
    }
}

/// Loads a clip with its tags on an open connection.
pub(crate) fn load(conn: &Connection, id: i64) -> Result<Option<Clip>, ClipError> {
    clip_repo::find_by_id(conn, id)?
        .map(|row| with_tags(conn, row))
        .transpose()
}

fn with_tags(conn: &Connection, row: ClipRow) -> Result<Clip, ClipError> {
    let tags = tag_repo::names_for_clip(conn, row.id)?;
    Ok(Clip::from_row(row, tags))
}
