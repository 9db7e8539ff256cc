//! Change-set types.
//!
//! A [`FieldChange`] serializes as a two-element `[old, new]` array and a
//! [`ChangeSet`] as a JSON object keyed by field or relation name. Entries are
//! kept in a `BTreeMap` so serialization is deterministic.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Old/new values for a single changed field or relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Value, Value)", into = "(Value, Value)")]
pub struct FieldChange {
    /// Value at the last capture (or last persisted attribute value)
    pub old: Value,
    /// Live value
    pub new: Value,
}

impl FieldChange {
    pub fn new(old: Value, new: Value) -> Self {
        Self { old, new }
    }

    /// Borrow as an `(old, new)` pair
    pub fn as_pair(&self) -> (&Value, &Value) {
        (&self.old, &self.new)
    }
}

impl From<(Value, Value)> for FieldChange {
    fn from((old, new): (Value, Value)) -> Self {
        Self { old, new }
    }
}

impl From<FieldChange> for (Value, Value) {
    fn from(change: FieldChange) -> Self {
        (change.old, change.new)
    }
}

/// Map from field or relation name to its change.
///
/// Only names whose values differ are present; an empty set means nothing
/// changed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    entries: BTreeMap<String, FieldChange>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&FieldChange> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert an entry, returning the one it replaced
    pub fn insert(&mut self, name: impl Into<String>, change: FieldChange) -> Option<FieldChange> {
        self.entries.insert(name.into(), change)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldChange> {
        self.entries.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldChange)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keep only entries whose name satisfies `keep`
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.entries.retain(|name, _| keep(name));
    }

    pub fn into_inner(self) -> BTreeMap<String, FieldChange> {
        self.entries
    }
}

impl FromIterator<(String, FieldChange)> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = (String, FieldChange)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ChangeSet {
    type Item = (String, FieldChange);
    type IntoIter = std::collections::btree_map::IntoIter<String, FieldChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
