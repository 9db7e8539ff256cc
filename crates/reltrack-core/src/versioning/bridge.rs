use serde_json::Value;
use std::time::Instant;

use crate::errors::Result;
use crate::tracked::{PersistOutcome, TrackedDocument};
use crate::versioning::hook::{IdentityPreserveHook, PreserveRelationHook};
use crate::versioning::{Revision, RevisionBacking, Versioned, VersioningConfig};
use crate::{log_op_end, log_op_error, log_op_start};

/// What [`VersioningBridge::revise_if_needed`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviseOutcome {
    /// Nothing versioned changed, or the save is versionless
    NotRevisable,
    /// Revisable, but there is no persisted state to revise from
    NoPreviousRevision,
    /// A revision was stored and the entity version incremented
    Revised {
        /// Version number of the stored revision
        version: u64,
        /// Version number of the evicted oldest revision, if the cap was hit
        evicted: Option<u64>,
    },
}

/// Revision creation for tracked, versioned documents
pub struct VersioningBridge {
    config: VersioningConfig,
    hook: Box<dyn PreserveRelationHook>,
}

impl std::fmt::Debug for VersioningBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersioningBridge")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for VersioningBridge {
    fn default() -> Self {
        Self::new(VersioningConfig::default())
    }
}

impl VersioningBridge {
    pub fn new(config: VersioningConfig) -> Self {
        Self {
            config,
            hook: Box::new(IdentityPreserveHook),
        }
    }

    /// Replace the hook applied to each relation's prior value
    pub fn with_hook(mut self, hook: impl PreserveRelationHook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }

    pub fn config(&self) -> &VersioningConfig {
        &self.config
    }

    /// Versioned attributes or tracked relations changed, and the save is
    /// not versionless
    ///
    /// # Errors
    ///
    /// Propagates failures from the relation change-set.
    pub fn revisable<D: Versioned>(&self, tracked: &TrackedDocument<D>) -> Result<bool> {
        let doc = tracked.doc();
        if doc.is_versionless() {
            return Ok(false);
        }
        if doc.versioned_attributes_changed() {
            return Ok(true);
        }
        tracked.has_relation_changes()
    }

    /// Store a revision of the previous persisted state if anything
    /// versioned changed
    ///
    /// The revision copies the previous revision's versioned attributes and
    /// records each tracked relation's prior value: the change-set's old side
    /// when the relation changed, else the previous revision's stored value.
    /// When the stored count exceeds `version_max` the oldest revision is
    /// evicted, and with `soft_delete` also pulled from `backing`.
    ///
    /// # Errors
    ///
    /// Propagates change-set, previous-revision and backing failures. The
    /// document is left unmodified on any error.
    pub fn revise_if_needed<D: Versioned>(
        &self,
        tracked: &mut TrackedDocument<D>,
        backing: &dyn RevisionBacking,
    ) -> Result<ReviseOutcome> {
        let start = Instant::now();
        log_op_start!("revise_if_needed", class = tracked.doc().class_name());

        let result = self.revise(tracked, backing);
        match &result {
            Ok(outcome) => log_op_end!(
                "revise_if_needed",
                duration_ms = start.elapsed().as_millis() as u64,
                class = tracked.doc().class_name(),
                outcome = ?outcome,
                revisions_len = tracked.doc().revisions().len()
            ),
            Err(err) => log_op_error!(
                "revise_if_needed",
                err.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                class = tracked.doc().class_name()
            ),
        }
        result
    }

    /// Revise if needed, run the host write, then refresh the shadow
    ///
    /// # Errors
    ///
    /// Propagates revision failures before the write, and the write's own
    /// error. A failed shadow refresh is reported through
    /// [`PersistOutcome::CaptureFailed`].
    pub fn save_versioned<D, W>(
        &self,
        tracked: &mut TrackedDocument<D>,
        backing: &dyn RevisionBacking,
        write: W,
    ) -> Result<(ReviseOutcome, PersistOutcome)>
    where
        D: Versioned,
        W: FnOnce(&mut D) -> Result<()>,
    {
        let revised = self.revise_if_needed(tracked, backing)?;
        let persisted = tracked.persist_with(write)?;
        Ok((revised, persisted))
    }

    fn revise<D: Versioned>(
        &self,
        tracked: &mut TrackedDocument<D>,
        backing: &dyn RevisionBacking,
    ) -> Result<ReviseOutcome> {
        if !self.revisable(tracked)? {
            return Ok(ReviseOutcome::NotRevisable);
        }
        let previous = match tracked.doc().previous_revision(tracked.class())? {
            Some(previous) => previous,
            None => return Ok(ReviseOutcome::NoPreviousRevision),
        };

        let changes = tracked.relation_change_set()?;
        let doc = tracked.doc();
        let version = doc.version().unwrap_or(1);

        let attributes = previous
            .attributes
            .iter()
            .filter(|(field, _)| doc.is_versioned_attribute(field))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();

        let relations = tracked
            .class()
            .tracked_relations()
            .iter()
            .map(|relation| {
                let prior = match changes.get(&relation.name) {
                    Some(change) => change.old.clone(),
                    None => previous
                        .relations
                        .get(&relation.name)
                        .cloned()
                        .unwrap_or(Value::Null),
                };
                (relation.name.clone(), self.hook.preserve(relation, prior))
            })
            .collect();

        // Pull before mutating; a backing failure must leave the document untouched.
        let evict = self
            .config
            .version_max
            .is_some_and(|max| doc.revisions().len() + 1 > max);
        if evict && self.config.soft_delete {
            let oldest = doc.revisions().first().map_or(Some(version), |r| r.version);
            if let (Some(id), Some(number)) = (doc.entity_id(), oldest) {
                backing
                    .pull_revision(doc.class_name(), &id, number)
                    .map_err(|err| err.with_class(doc.class_name()).with_entity_id(id))?;
            }
        }

        let doc = tracked.doc_mut();
        doc.revisions_mut().push(Revision {
            version: Some(version),
            attributes,
            relations,
        });
        let evicted = if evict {
            doc.revisions_mut().remove(0).version
        } else {
            None
        };

        doc.set_version(version + 1);
        Ok(ReviseOutcome::Revised { version, evicted })
    }
}
