//! Tracked documents
//!
//! [`TrackedDocument`] pairs a host document with its [`RelationTracker`]
//! and wires the two lifecycle points: a shadow is captured when the
//! document is materialized and again after the host confirms a write.
//!
//! ```
//! use std::sync::Arc;
//! use reltrack_core::host::memory::{MemoryDocument, MemoryStore};
//! use reltrack_core::model::ClassSchema;
//! use reltrack_core::policy::TrackingDeclaration;
//! use reltrack_core::registry::ClassRegistry;
//! use reltrack_core::tracked::TrackedDocument;
//! use serde_json::json;
//!
//! let mut registry = ClassRegistry::new();
//! let class = registry
//!     .register(ClassSchema::new("Post").has_many("comments"), &TrackingDeclaration::new())
//!     .unwrap();
//! let store = Arc::new(MemoryStore::new());
//!
//! let mut post = TrackedDocument::materialize(MemoryDocument::new("Post", &store), class).unwrap();
//! assert!(!post.has_relation_changes().unwrap());
//!
//! post.doc_mut().referenced_ids_mut("comments").push(json!("c1"));
//! assert!(post.has_relation_changes().unwrap());
//! ```

use std::sync::Arc;
use std::time::Instant;

use crate::diff::aggregate::ChangeAggregator;
use crate::diff::model::ChangeSet;
use crate::errors::{Result, RtError};
use crate::host::Document;
use crate::registry::TrackedClass;
use crate::shadow::{RelationTracker, ShadowSnapshot, TrackingState};
use crate::{log_op_end, log_op_error, log_op_start};

/// Result the host reports for a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Confirmed,
    Failed,
}

/// Result of [`TrackedDocument::persist_with`] after a successful write
#[derive(Debug, Clone)]
pub enum PersistOutcome {
    /// The shadow now matches the persisted state
    Recaptured,
    /// The write stands but the shadow could not be refreshed
    CaptureFailed(RtError),
}

impl PersistOutcome {
    pub fn is_recaptured(&self) -> bool {
        matches!(self, PersistOutcome::Recaptured)
    }
}

/// A host document with relation change tracking
#[derive(Debug)]
pub struct TrackedDocument<D: Document> {
    doc: D,
    tracker: RelationTracker,
}

impl<D: Document> TrackedDocument<D> {
    /// Wrap `doc` without capturing; the state starts `Uninitialized`
    pub fn new(doc: D, class: Arc<TrackedClass>) -> Self {
        Self {
            doc,
            tracker: RelationTracker::new(class),
        }
    }

    /// Wrap a freshly loaded or constructed `doc` and capture its shadow
    ///
    /// # Errors
    ///
    /// Propagates a has_one data-access failure.
    pub fn materialize(doc: D, class: Arc<TrackedClass>) -> Result<Self> {
        let mut tracked = Self::new(doc, class);
        tracked.on_materialize()?;
        Ok(tracked)
    }

    /// Capture hook for the materialization lifecycle point
    ///
    /// # Errors
    ///
    /// Propagates a has_one data-access failure.
    pub fn on_materialize(&mut self) -> Result<()> {
        self.tracker.capture(&self.doc)
    }

    /// Capture hook for the after-persist lifecycle point
    ///
    /// Only a confirmed write refreshes the shadow.
    ///
    /// # Errors
    ///
    /// Propagates a has_one data-access failure from the capture.
    pub fn on_after_persist(&mut self, outcome: WriteOutcome) -> Result<()> {
        match outcome {
            WriteOutcome::Confirmed => self.tracker.capture(&self.doc),
            WriteOutcome::Failed => {
                tracing::debug!(
                    class = self.doc.class_name(),
                    "write failed, shadow left unchanged"
                );
                Ok(())
            }
        }
    }

    /// Run the host write, then refresh the shadow if it succeeded
    ///
    /// A failed capture never undoes the write; it is logged and returned as
    /// [`PersistOutcome::CaptureFailed`].
    ///
    /// # Errors
    ///
    /// Returns the write's own error, tagged with the entity id when the
    /// write did not set one.
    pub fn persist_with<W>(&mut self, write: W) -> Result<PersistOutcome>
    where
        W: FnOnce(&mut D) -> Result<()>,
    {
        let start = Instant::now();
        log_op_start!("persist", class = self.doc.class_name());

        if let Err(mut err) = write(&mut self.doc) {
            if err.entity_id().is_none() {
                if let Some(id) = self.doc.entity_id() {
                    err = err.with_entity_id(id);
                }
            }
            log_op_error!(
                "persist",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                class = self.doc.class_name()
            );
            self.on_after_persist(WriteOutcome::Failed)?;
            return Err(err);
        }

        let outcome = match self.on_after_persist(WriteOutcome::Confirmed) {
            Ok(()) => PersistOutcome::Recaptured,
            Err(err) => {
                tracing::warn!(
                    class = self.doc.class_name(),
                    err.code = err.code(),
                    "write succeeded but shadow capture failed"
                );
                PersistOutcome::CaptureFailed(err)
            }
        };
        log_op_end!(
            "persist",
            duration_ms = start.elapsed().as_millis() as u64,
            class = self.doc.class_name()
        );
        Ok(outcome)
    }

    /// # Errors
    ///
    /// Returns `ShadowNotCaptured` before the first capture, or propagates a
    /// has_one data-access failure.
    pub fn has_relation_changes(&self) -> Result<bool> {
        self.aggregator().has_relation_changes()
    }

    /// Tracked relations that differ from the shadow
    ///
    /// # Errors
    ///
    /// Same as [`has_relation_changes`](Self::has_relation_changes).
    pub fn relation_change_set(&self) -> Result<ChangeSet> {
        self.tracker.change_set(&self.doc)
    }

    /// # Errors
    ///
    /// Same as [`has_relation_changes`](Self::has_relation_changes).
    pub fn has_any_changes(&self) -> Result<bool> {
        self.aggregator().has_any_changes()
    }

    /// # Errors
    ///
    /// Same as [`has_relation_changes`](Self::has_relation_changes).
    pub fn all_changes(&self) -> Result<ChangeSet> {
        self.aggregator().all_changes()
    }

    /// # Errors
    ///
    /// Propagates a has_one data-access failure.
    pub fn state(&self) -> Result<TrackingState> {
        self.tracker.state(&self.doc)
    }

    pub fn doc(&self) -> &D {
        &self.doc
    }

    /// Mutable access to the host document; changes are seen on the next query
    pub fn doc_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn into_inner(self) -> D {
        self.doc
    }

    pub fn class(&self) -> &Arc<TrackedClass> {
        self.tracker.class()
    }

    pub fn shadow(&self) -> Option<&ShadowSnapshot> {
        self.tracker.shadow()
    }

    pub fn tracker(&self) -> &RelationTracker {
        &self.tracker
    }

    fn aggregator(&self) -> ChangeAggregator<'_> {
        ChangeAggregator::new(&self.doc, &self.tracker)
    }
}
