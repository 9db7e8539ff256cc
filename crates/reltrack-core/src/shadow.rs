//! Shadow store
//!
//! A [`RelationTracker`] holds the last-captured [`ShadowSnapshot`] of one
//! entity instance. Captures build a complete new snapshot before swapping it
//! in, so an observer never sees a mix of old and new relation values and a
//! failed capture leaves the previous shadow in place.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::diff::engine::compute_change_set;
use crate::diff::model::ChangeSet;
use crate::errors::{RelTrackError, Result};
use crate::extract::extract;
use crate::host::Document;
use crate::registry::TrackedClass;
use crate::{log_op_end, log_op_error, log_op_start};

/// Captured comparable value of every tracked relation of one instance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShadowSnapshot {
    values: BTreeMap<String, Value>,
}

impl ShadowSnapshot {
    /// Extract every tracked relation of `doc`
    ///
    /// # Errors
    ///
    /// Propagates a has_one data-access failure.
    pub fn capture(class: &TrackedClass, doc: &dyn Document) -> Result<Self> {
        let ctx = class.extract_context();
        let values = class
            .tracked_relations()
            .iter()
            .map(|relation| Ok((relation.name.clone(), extract(doc, relation, ctx)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(Self { values })
    }

    pub fn get(&self, relation: &str) -> Option<&Value> {
        self.values.get(relation)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> BTreeMap<String, Value> {
        self.values
    }
}

/// Tracking state of one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingState {
    /// No shadow captured yet
    Uninitialized,
    /// Shadow matches live relation state
    Shadowed,
    /// At least one tracked relation differs from the shadow
    Dirty,
}

/// Per-instance shadow store
///
/// Owned by exactly one entity instance and mutated only through `&mut self`.
#[derive(Debug, Clone)]
pub struct RelationTracker {
    class: Arc<TrackedClass>,
    shadow: Option<ShadowSnapshot>,
}

impl RelationTracker {
    pub fn new(class: Arc<TrackedClass>) -> Self {
        Self {
            class,
            shadow: None,
        }
    }

    pub fn class(&self) -> &Arc<TrackedClass> {
        &self.class
    }

    pub fn shadow(&self) -> Option<&ShadowSnapshot> {
        self.shadow.as_ref()
    }

    /// Replace the shadow with a fresh capture of `doc`
    ///
    /// # Errors
    ///
    /// Propagates a has_one data-access failure; the previous shadow is kept.
    pub fn capture(&mut self, doc: &dyn Document) -> Result<()> {
        let start = Instant::now();
        log_op_start!("capture_shadow", class = self.class.name());

        match ShadowSnapshot::capture(&self.class, doc) {
            Ok(snapshot) => {
                let tracked_len = snapshot.len();
                self.shadow = Some(snapshot);
                log_op_end!(
                    "capture_shadow",
                    duration_ms = start.elapsed().as_millis() as u64,
                    class = self.class.name(),
                    tracked_len = tracked_len
                );
                Ok(())
            }
            Err(err) => {
                log_op_error!(
                    "capture_shadow",
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    class = self.class.name()
                );
                Err(err)
            }
        }
    }

    /// Relations whose live value differs from the shadow
    ///
    /// # Errors
    ///
    /// Returns `ShadowNotCaptured` before the first capture, or propagates a
    /// has_one data-access failure.
    pub fn change_set(&self, doc: &dyn Document) -> Result<ChangeSet> {
        let start = Instant::now();
        log_op_start!("compute_change_set", class = self.class.name());

        let result = match &self.shadow {
            Some(shadow) => compute_change_set(&self.class, shadow, doc),
            None => Err(RelTrackError::ShadowNotCaptured {
                class_name: self.class.name().to_string(),
            }
            .into()),
        };

        match &result {
            Ok(changes) => log_op_end!(
                "compute_change_set",
                duration_ms = start.elapsed().as_millis() as u64,
                class = self.class.name(),
                changed_len = changes.len()
            ),
            Err(err) => log_op_error!(
                "compute_change_set",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                class = self.class.name()
            ),
        }
        result
    }

    /// Current tracking state of `doc` against this tracker's shadow
    ///
    /// # Errors
    ///
    /// Propagates a has_one data-access failure.
    pub fn state(&self, doc: &dyn Document) -> Result<TrackingState> {
        if self.shadow.is_none() {
            return Ok(TrackingState::Uninitialized);
        }
        if self.change_set(doc)?.is_empty() {
            Ok(TrackingState::Shadowed)
        } else {
            Ok(TrackingState::Dirty)
        }
    }

    /// Forget the shadow, returning to [`TrackingState::Uninitialized`]
    pub fn discard(&mut self) {
        self.shadow = None;
    }
}
