use serde::Serialize;

use crate::db::tag_repo::{self, TagRow};
use crate::db::Database;
use crate::error::ClipError;

/// A known tag name and its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

/// The shared set of tag names. Tags are created lazily and never deleted.
#[derive(Clone)]
pub struct TagVocabulary {
    db: Database,
}

impl TagVocabulary {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns the tag with this name, creating it if needed.
    pub fn get_or_create(&self, name: &str) -> Result<Tag, ClipError> {
        let name = normalize(name)?;
        self.db
            .with_conn(|conn| tag_repo::insert_if_absent(conn, &name))
            .map(Tag::from)
            .map_err(ClipError::from)
    }

    pub fn find(&self, name: &str) -> Result<Option<Tag>, ClipError> {
        let name = normalize(name)?;
        let row = self.db.with_conn(|conn| tag_repo::find_by_name(conn, &name))?;
        Ok(row.map(Tag::from))
    }

    pub fn all(&self) -> Result<Vec<Tag>, ClipError> {
        let rows = self.db.with_conn(tag_repo::list_all)?;
        Ok(rows.into_iter().map(Tag::from).collect())
    }
}

/// Trims surrounding whitespace; empty names are rejected.
pub(crate) fn normalize(name: &str) -> Result<String, ClipError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ClipError::InvalidArgument(
            "tag name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
