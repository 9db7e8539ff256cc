//! Relation diff engine
//!
//! The core entry point is [`diff_values`], which compares a shadow snapshot
//! against freshly extracted relation values and produces a [`ChangeSet`].
//! [`compute_change_set`] re-extracts the live values from a document first.

use serde_json::Value;

use crate::diff::model::{ChangeSet, FieldChange};
use crate::errors::Result;
use crate::extract::extract;
use crate::host::Document;
use crate::registry::TrackedClass;
use crate::shadow::ShadowSnapshot;

/// Compare each shadow entry against its current value
///
/// `current` is called once per `(name, shadow value)` entry of the snapshot.
/// Equality is deep and order-sensitive, so reordering a collection is a
/// change.
///
/// # Errors
///
/// Propagates the first error returned by `current`.
pub fn diff_values<F>(shadow: &ShadowSnapshot, mut current: F) -> Result<ChangeSet>
where
    F: FnMut(&str) -> Result<Value>,
{
    let mut changes = ChangeSet::new();
    for (name, old) in shadow.iter() {
        let new = current(name)?;
        if *old != new {
            changes.insert(name, FieldChange::new(old.clone(), new));
        }
    }
    Ok(changes)
}

/// Change-set of `doc`'s tracked relations against `shadow`
///
/// # Errors
///
/// Propagates a has_one data-access failure.
pub fn compute_change_set(
    class: &TrackedClass,
    shadow: &ShadowSnapshot,
    doc: &dyn Document,
) -> Result<ChangeSet> {
    let ctx = class.extract_context();
    diff_values(shadow, |name| {
        let relation = class.require_relation(name)?;
        extract(doc, relation, ctx)
    })
}
