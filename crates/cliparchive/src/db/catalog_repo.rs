//! Catalog repository: `users`, `maps` and `legends` reference tables.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::DatabaseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub apex_username: Option<String>,
    pub apex_uid: Option<String>,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            apex_username: row.get("apex_username")?,
            apex_uid: row.get("apex_uid")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapRow {
    pub id: i64,
    pub name: String,
    pub card_image: Option<String>,
    pub als_name: Option<String>,
}

impl MapRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            card_image: row.get("card_image")?,
            als_name: row.get("als_name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegendRow {
    pub id: i64,
    pub name: String,
    pub card_image: Option<String>,
}

impl LegendRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            card_image: row.get("card_image")?,
        })
    }
}

pub fn insert_user(conn: &Connection, user: &UserRow) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (name, apex_username, apex_uid) VALUES (?1, ?2, ?3)",
        params![user.name, user.apex_username, user.apex_uid],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_map(conn: &Connection, map: &MapRow) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO maps (name, card_image, als_name) VALUES (?1, ?2, ?3)",
        params![map.name, map.card_image, map.als_name],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_legend(conn: &Connection, legend: &LegendRow) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO legends (name, card_image) VALUES (?1, ?2)",
        params![legend.name, legend.card_image],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_users(conn: &Connection) -> Result<Vec<UserRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, apex_username, apex_uid FROM users ORDER BY id")?;
    let rows = stmt
        .query_map([], UserRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_maps(conn: &Connection) -> Result<Vec<MapRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, card_image, als_name FROM maps ORDER BY id")?;
    let rows = stmt
        .query_map([], MapRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn list_legends(conn: &Connection) -> Result<Vec<LegendRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, name, card_image FROM legends ORDER BY id")?;
    let rows = stmt
        .query_map([], LegendRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Finds a user by the uid reported by the external match logger.
pub fn find_user_by_apex_uid(conn: &Connection, uid: &str) -> Result<Option<UserRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, apex_username, apex_uid FROM users WHERE apex_uid = ?1",
            params![uid],
            UserRow::from_row,
        )
        .optional()?;
    Ok(row)
}

/// Finds a map by the name used in external match logs.
pub fn find_map_by_als_name(conn: &Connection, als_name: &str) -> Result<Option<MapRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, card_image, als_name FROM maps WHERE als_name = ?1",
            params![als_name],
            MapRow::from_row,
        )
        .optional()?;
    Ok(row)
}

pub fn find_legend_by_name(conn: &Connection, name: &str) -> Result<Option<LegendRow>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, card_image FROM legends WHERE name = ?1",
            params![name],
            LegendRow::from_row,
        )
        .optional()?;
    Ok(row)
}
