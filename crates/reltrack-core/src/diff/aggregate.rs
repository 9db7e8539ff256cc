//! Host attribute and relation change composition
//!
//! [`ChangeAggregator`] answers the combined dirty queries by asking the
//! host for its native attribute changes and the tracker for its relation
//! change-set. Host methods are composed, never replaced.

use crate::diff::model::ChangeSet;
use crate::errors::Result;
use crate::host::Document;
use crate::shadow::RelationTracker;

/// Combined view over one document and its relation tracker
#[derive(Clone, Copy)]
pub struct ChangeAggregator<'a> {
    doc: &'a dyn Document,
    tracker: &'a RelationTracker,
}

impl<'a> ChangeAggregator<'a> {
    pub fn new(doc: &'a dyn Document, tracker: &'a RelationTracker) -> Self {
        Self { doc, tracker }
    }

    /// # Errors
    ///
    /// See [`RelationTracker::change_set`].
    pub fn has_relation_changes(&self) -> Result<bool> {
        Ok(!self.tracker.change_set(self.doc)?.is_empty())
    }

    /// Host attributes changed, or any tracked relation changed
    ///
    /// Relations are not extracted when the host already reports a change.
    ///
    /// # Errors
    ///
    /// See [`RelationTracker::change_set`].
    pub fn has_any_changes(&self) -> Result<bool> {
        if self.doc.attributes_changed() {
            return Ok(true);
        }
        self.has_relation_changes()
    }

    /// Host attribute changes merged with the relation change-set
    ///
    /// A relation entry replaces an attribute entry of the same name.
    ///
    /// # Errors
    ///
    /// See [`RelationTracker::change_set`].
    pub fn all_changes(&self) -> Result<ChangeSet> {
        let mut merged = self.doc.attribute_changes();
        for (name, change) in self.tracker.change_set(self.doc)? {
            if merged.insert(name.clone(), change).is_some() {
                tracing::warn!(
                    class = self.doc.class_name(),
                    relation = name.as_str(),
                    "relation change replaces attribute change of the same name"
                );
            }
        }
        Ok(merged)
    }
}
