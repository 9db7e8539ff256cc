//! Host persistence contract
//!
//! The engine never owns entity storage. A host persistence layer exposes
//! each entity through [`Document`], which gives read access to the raw
//! relation state the extractors need plus the host's own attribute dirty
//! tracking. [`memory`] provides a reference in-memory host.

pub mod memory;

use serde_json::Value;

use crate::diff::model::ChangeSet;
use crate::errors::Result;
use crate::model::{Attributes, RelationDescriptor};

/// Read access to one materialized entity
///
/// All methods except [`load_referenced_one`](Document::load_referenced_one)
/// must be pure reads of in-memory state.
pub trait Document {
    /// Registered class name of this entity
    fn class_name(&self) -> &str;

    /// Identity of this entity, if it has one yet (used for log context)
    fn entity_id(&self) -> Option<String>;

    /// Read one of the entity's own attributes
    ///
    /// Returns `Ok(None)` for a loaded attribute without a value.
    ///
    /// # Errors
    ///
    /// Returns an `AttributeNotLoaded` error when the attribute exists but was
    /// not materialized (for example excluded by a query projection).
    fn read_attribute(&self, field: &str) -> Result<Option<Value>>;

    /// Attributes of the single embedded child, if any
    fn embedded_one(&self, relation: &str) -> Option<&Attributes>;

    /// Attributes of every embedded child, in child order
    fn embedded_many(&self, relation: &str) -> Vec<&Attributes>;

    /// Load the related entity of a has-one relation
    ///
    /// This is the only call that may touch storage.
    ///
    /// # Errors
    ///
    /// Any data-access failure; the engine propagates it unchanged.
    fn load_referenced_one(&self, relation: &RelationDescriptor) -> Result<Option<Attributes>>;

    /// Ids held in the foreign-key id list of a has-many relation, in order
    fn referenced_ids(&self, relation: &str) -> Vec<Value>;

    /// Ids held in the join-key id list of a many-to-many relation, in order
    fn join_ids(&self, relation: &str) -> Vec<Value>;

    /// Host-native attribute changes since the last persistence
    fn attribute_changes(&self) -> ChangeSet;

    /// Whether any host-native attribute changed
    fn attributes_changed(&self) -> bool {
        !self.attribute_changes().is_empty()
    }
}
