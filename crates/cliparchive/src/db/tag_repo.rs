//! Tag repository: the `tags` vocabulary and `clips_tags` memberships.

use rusqlite::{params, Connection, OptionalExtension};

use super::DatabaseError;

/// A raw tag row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    pub id: i64,
    pub name: String,
}

/// Finds a tag by its unique name.
pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<TagRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name FROM tags WHERE name = ?1",
            params![name],
            |r| {
                Ok(TagRow {
                    id: r.get(0)?,
                    name: r.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

/// Inserts the tag unless a row with that name already exists, then returns
/// the stored row. Concurrent callers racing on the same name all observe the
/// single row that won the UNIQUE constraint.
pub fn insert_if_absent(conn: &Connection, name: &str) -> Result<TagRow, DatabaseError> {
    conn.execute(
        "INSERT INTO tags (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
        params![name],
    )?;
    let row = conn.query_row(
        "SELECT id, name FROM tags WHERE name = ?1",
        params![name],
        |r| {
            Ok(TagRow {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        },
    )?;
    Ok(row)
}

/// Lists the whole vocabulary ordered by name.
pub fn list_all(conn: &Connection) -> Result<Vec<TagRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name FROM tags ORDER BY name")?;
    let rows = stmt
        .query_map([], |r| {
            Ok(TagRow {
                id: r.get(0)?,
                name: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Lists the tag names attached to a clip, ordered by name.
pub fn names_for_clip(conn: &Connection, clip_id: i64) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT t.name FROM clips_tags ct INNER JOIN tags t ON ct.tag_id = t.id
         WHERE ct.clip_id = ?1 ORDER BY t.name",
    )?;
    let names = stmt
        .query_map(params![clip_id], |r| r.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Attaches a tag to a clip. Returns 1 if the membership was created,
/// 0 if it already existed.
pub fn add_membership(conn: &Connection, clip_id: i64, tag_id: i64) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO clips_tags (clip_id, tag_id) VALUES (?1, ?2)",
        params![clip_id, tag_id],
    )?;
    Ok(changed)
}

/// Detaches a tag from a clip. Returns 1 if a membership was removed,
/// 0 if there was none.
pub fn remove_membership(
    conn: &Connection,
    clip_id: i64,
    tag_id: i64,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM clips_tags WHERE clip_id = ?1 AND tag_id = ?2",
        params![clip_id, tag_id],
    )?;
    Ok(changed)
}

/// Removes every membership of a clip. Returns rows changed.
pub fn remove_all_for_clip(conn: &Connection, clip_id: i64) -> Result<usize, DatabaseError> {
    let changed = conn.execute("DELETE FROM clips_tags WHERE clip_id = ?1", params![clip_id])?;
    Ok(changed)
}
