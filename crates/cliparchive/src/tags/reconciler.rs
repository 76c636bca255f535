//! Synchronizes a clip's tag memberships with a desired tag set.
//!
//! Each sub-step (tag get-or-create, membership insert, membership delete)
//! is idempotent on its own, so a reconciliation that fails halfway can be
//! retried with the same arguments. The whole operation is deliberately not
//! one transaction.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info_span};

use crate::db::{clip_repo, tag_repo, Database};
use crate::error::ClipError;

use super::vocabulary::normalize;

/// Memberships actually changed by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ReconcileOutcome {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Clone)]
pub struct TagReconciler {
    db: Database,
}

impl TagReconciler {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Adds `desired − current` and removes `current − desired`.
    ///
    /// Names in both sets are not touched. Removing a name whose tag row does
    /// not exist fails with `NotFound`.
    pub fn reconcile(
        &self,
        clip_id: i64,
        current: &BTreeSet<String>,
        desired: &BTreeSet<String>,
    ) -> Result<ReconcileOutcome, ClipError> {
        let _span = info_span!("tags.reconcile", clip_id).entered();

        let current = normalize_set(current)?;
        let desired = normalize_set(desired)?;

        if !self.db.with_conn(|conn| clip_repo::exists(conn, clip_id))? {
            return Err(ClipError::not_found("clip", clip_id));
        }

        let mut outcome = ReconcileOutcome::default();

        for name in desired.difference(&current) {
            let created = self.db.with_conn(|conn| {
                let tag = tag_repo::insert_if_absent(conn, name)?;
                tag_repo::add_membership(conn, clip_id, tag.id)
            })?;
            if created > 0 {
                debug!(tag = %name, "Tag attached");
                outcome.added.push(name.clone());
            }
        }

        for name in current.difference(&desired) {
            let removed = self.db.with_conn(|conn| -> Result<usize, ClipError> {
                let tag = tag_repo::find_by_name(conn, name)?
                    .ok_or_else(|| ClipError::not_found("tag", name))?;
                Ok(tag_repo::remove_membership(conn, clip_id, tag.id)?)
            })?;
            if removed > 0 {
                debug!(tag = %name, "Tag detached");
                outcome.removed.push(name.clone());
            }
        }

        Ok(outcome)
    }

    /// Reconciles against the tag set currently stored for the clip.
    pub fn apply_desired(
        &self,
        clip_id: i64,
        desired: &BTreeSet<String>,
    ) -> Result<ReconcileOutcome, ClipError> {
        let current: BTreeSet<String> = self.tags_for_clip(clip_id)?;
        self.reconcile(clip_id, &current, desired)
    }

    pub fn tags_for_clip(&self, clip_id: i64) -> Result<BTreeSet<String>, ClipError> {
        let names = self
            .db
            .with_conn(|conn| tag_repo::names_for_clip(conn, clip_id))?;
        Ok(names.into_iter().collect())
    }
}

fn normalize_set(names: &BTreeSet<String>) -> Result<BTreeSet<String>, ClipError> {
    names.iter().map(|name| normalize(name)).collect()
}
