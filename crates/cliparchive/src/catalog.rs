//! Reference data: users, maps and legends.
//!
//! Match records arriving from the external logger name players by uid,
//! maps by their log name and legends by display name; the catalog turns
//! those names into row ids.

use serde::Serialize;

use crate::db::catalog_repo::{self, LegendRow, MapRow, UserRow};
use crate::db::{Database, DatabaseError};
use crate::error::ClipError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub apex_username: Option<String>,
    pub apex_uid: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            apex_username: row.apex_username,
            apex_uid: row.apex_uid,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Map {
    pub id: i64,
    pub name: String,
    pub card_image: Option<String>,
    /// Identifier used for this map in external match logs.
    pub log_name: Option<String>,
}

impl From<MapRow> for Map {
    fn from(row: MapRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            card_image: row.card_image,
            log_name: row.als_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub id: i64,
    pub name: String,
    pub card_image: Option<String>,
}

impl From<LegendRow> for Legend {
    fn from(row: LegendRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            card_image: row.card_image,
        }
    }
}

#[derive(Clone)]
pub struct Catalog {
    db: Database,
}

impl Catalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn users(&self) -> Result<Vec<User>, ClipError> {
        let rows = self.db.with_conn(catalog_repo::list_users)?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    pub fn maps(&self) -> Result<Vec<Map>, ClipError> {
        let rows = self.db.with_conn(catalog_repo::list_maps)?;
        Ok(rows.into_iter().map(Map::from).collect())
    }

    pub fn legends(&self) -> Result<Vec<Legend>, ClipError> {
        let rows = self.db.with_conn(catalog_repo::list_legends)?;
        Ok(rows.into_iter().map(Legend::from).collect())
    }

    pub fn user_by_external_uid(&self, uid: &str) -> Result<Option<User>, ClipError> {
        let row = self
            .db
            .with_conn(|conn| catalog_repo::find_user_by_apex_uid(conn, uid))?;
        Ok(row.map(User::from))
    }

    pub fn map_by_log_name(&self, log_name: &str) -> Result<Option<Map>, ClipError> {
        let row = self
            .db
            .with_conn(|conn| catalog_repo::find_map_by_als_name(conn, log_name))?;
        Ok(row.map(Map::from))
    }

    pub fn legend_by_name(&self, name: &str) -> Result<Option<Legend>, ClipError> {
        let row = self
            .db
            .with_conn(|conn| catalog_repo::find_legend_by_name(conn, name))?;
        Ok(row.map(Legend::from))
    }

    pub fn add_user(
        &self,
        name: &str,
        apex_username: Option<&str>,
        apex_uid: Option<&str>,
    ) -> Result<User, ClipError> {
        let mut row = UserRow {
            id: 0,
            name: required(name, "user name")?,
            apex_username: apex_username.map(str::to_string),
            apex_uid: apex_uid.map(str::to_string),
        };
        let inserted = self.db.with_conn(|conn| catalog_repo::insert_user(conn, &row));
        row.id = reject_duplicate(inserted, || {
            let uid = row.apex_uid.as_deref().unwrap_or_default();
            format!("a user with uid {:?} already exists", uid)
        })?;
        Ok(row.into())
    }

    pub fn add_map(
        &self,
        name: &str,
        log_name: Option<&str>,
        card_image: Option<&str>,
    ) -> Result<Map, ClipError> {
        let mut row = MapRow {
            id: 0,
            name: required(name, "map name")?,
            card_image: card_image.map(str::to_string),
            als_name: log_name.map(str::to_string),
        };
        let inserted = self.db.with_conn(|conn| catalog_repo::insert_map(conn, &row));
        row.id = reject_duplicate(inserted, || {
            let log_name = row.als_name.as_deref().unwrap_or_default();
            format!("a map with log name {:?} already exists", log_name)
        })?;
        Ok(row.into())
    }

    pub fn add_legend(&self, name: &str, card_image: Option<&str>) -> Result<Legend, ClipError> {
        let mut row = LegendRow {
            id: 0,
            name: required(name, "legend name")?,
            card_image: card_image.map(str::to_string),
        };
        let inserted = self
            .db
            .with_conn(|conn| catalog_repo::insert_legend(conn, &row));
        row.id = reject_duplicate(inserted, || format!("legend {:?} already exists", row.name))?;
        Ok(row.into())
    }
}

/// A UNIQUE violation is the caller's duplicate key, not a store failure.
fn reject_duplicate(
    inserted: Result<i64, DatabaseError>,
    duplicate: impl FnOnce() -> String,
) -> Result<i64, ClipError> {
    match inserted {
        Ok(id) => Ok(id),
        Err(e) if e.is_unique_violation() => Err(ClipError::InvalidArgument(duplicate())),
        Err(e) => Err(e.into()),
    }
}

fn required(value: &str, what: &str) -> Result<String, ClipError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClipError::InvalidArgument(format!("{} must not be empty", what)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Fault;

    #[test]
    fn test_add_and_resolve() {
        let catalog = Catalog::new(Database::open_in_memory().unwrap());
        let user = catalog.add_user("sam", Some("sam_ttv"), Some("100200")).unwrap();
        let map = catalog
            .add_map("Storm Point", Some("mp_rr_tropic_island"), None)
            .unwrap();
        let legend = catalog.add_legend("Bloodhound", None).unwrap();

        assert_eq!(catalog.user_by_external_uid("100200").unwrap(), Some(user));
        assert_eq!(
            catalog.map_by_log_name("mp_rr_tropic_island").unwrap(),
            Some(map)
        );
        assert_eq!(catalog.legend_by_name("Bloodhound").unwrap(), Some(legend));
        assert_eq!(catalog.legend_by_name("Pathfinder").unwrap(), None);
    }

    #[test]
    fn test_duplicate_keys_are_client_faults() {
        let catalog = Catalog::new(Database::open_in_memory().unwrap());
        catalog.add_user("a", None, Some("1")).unwrap();
        catalog.add_map("Olympus", Some("mp_rr_olympus"), None).unwrap();
        catalog.add_legend("Octane", None).unwrap();

        let errors = [
            catalog.add_user("b", None, Some("1")).unwrap_err(),
            catalog.add_map("Olympus 2", Some("mp_rr_olympus"), None).unwrap_err(),
            catalog.add_legend("Octane", None).unwrap_err(),
        ];
        for err in errors {
            assert!(matches!(err, ClipError::InvalidArgument(_)), "{err:?}");
            assert_eq!(err.fault(), Fault::Client);
            assert!(!err.is_retryable());
        }

        assert_eq!(catalog.users().unwrap().len(), 1);
        assert_eq!(catalog.maps().unwrap().len(), 1);
        assert_eq!(catalog.legends().unwrap().len(), 1);
    }

    #[test]
    fn test_listing_and_blank_names() {
        let catalog = Catalog::new(Database::open_in_memory().unwrap());
        catalog.add_legend("Wraith", Some("wraith.png")).unwrap();
        catalog.add_legend("Lifeline", None).unwrap();
        let names: Vec<String> = catalog.legends().unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Wraith", "Lifeline"]);
        assert!(catalog.users().unwrap().is_empty());
        assert!(catalog.maps().unwrap().is_empty());
        assert!(matches!(
            catalog.add_map("  ", None, None),
            Err(ClipError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_serializes_log_name() {
        let catalog = Catalog::new(Database::open_in_memory().unwrap());
        let map = catalog.add_map("Olympus", Some("mp_rr_olympus"), None).unwrap();
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["logName"], "mp_rr_olympus");
        assert!(json["cardImage"].is_null());
    }
}
