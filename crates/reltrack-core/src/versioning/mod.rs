//! Versioning bridge
//!
//! Entities that keep a revision history implement [`Versioned`]. Before a
//! save, [`VersioningBridge::revise_if_needed`] snapshots the previous
//! persisted state as a [`Revision`], including the prior value of every
//! tracked relation, so relation-only edits produce revisions too.

pub mod bridge;
pub mod hook;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::DEFAULT_VOLATILE_FIELD;
use crate::diff::model::ChangeSet;
use crate::errors::Result;
use crate::host::Document;
use crate::model::Attributes;
use crate::registry::TrackedClass;

pub use bridge::{ReviseOutcome, VersioningBridge};
pub use hook::{IdentityPreserveHook, PreserveRelationHook};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningConfig {
    /// Maximum number of stored revisions, unbounded when absent
    pub version_max: Option<usize>,

    /// Revisions are soft-deletable; evictions are also pulled from the
    /// persisted backing list
    pub soft_delete: bool,
}

/// One stored revision of an entity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Revision {
    pub version: Option<u64>,
    pub attributes: Attributes,
    pub relations: BTreeMap<String, Value>,
}

/// A document with a version number and an embedded revision list
pub trait Versioned: Document {
    fn version(&self) -> Option<u64>;

    fn set_version(&mut self, version: u64);

    /// Whether `field` is copied into revisions
    fn is_versioned_attribute(&self, field: &str) -> bool;

    /// Whether any versioned attribute changed, ignoring `updated_at`
    fn versioned_attributes_changed(&self) -> bool {
        self.attribute_changes()
            .names()
            .any(|name| name != DEFAULT_VOLATILE_FIELD && self.is_versioned_attribute(name))
    }

    /// Versionless saves never produce a revision
    fn is_versionless(&self) -> bool {
        false
    }

    /// Persisted state preceding the pending save
    ///
    /// Relation values use the same comparable form `class` extracts for the
    /// shadow, so they line up with a change-set's old side.
    ///
    /// # Errors
    ///
    /// Any data-access failure while loading the persisted state.
    fn previous_revision(&self, class: &TrackedClass) -> Result<Option<Revision>>;

    fn revisions(&self) -> &[Revision];

    fn revisions_mut(&mut self) -> &mut Vec<Revision>;
}

/// Persisted copy of the revision list, used for soft-delete eviction
pub trait RevisionBacking {
    /// Remove the revision numbered `version` from the persisted list
    ///
    /// # Errors
    ///
    /// Any persistence failure.
    fn pull_revision(&self, class_name: &str, entity_id: &str, version: u64) -> Result<()>;
}

/// Host attribute changes restricted to versioned attributes
///
/// `updated_at` is dropped; relation entries are never included.
pub fn versioned_changes<D: Versioned + ?Sized>(doc: &D) -> ChangeSet {
    let mut changes = doc.attribute_changes();
    changes.retain(|name| name != DEFAULT_VOLATILE_FIELD && doc.is_versioned_attribute(name));
    changes
}
