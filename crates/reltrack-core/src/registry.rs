//! Class registration
//!
//! A [`TrackedClass`] binds a host [`ClassSchema`] to its classified
//! relations and an immutable [`TrackingPolicy`]. Classes are registered once
//! in a [`ClassRegistry`] and handed to instances as `Arc<TrackedClass>`;
//! nothing about a registered class changes afterwards.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, OnceLock};

use crate::config::TrackerConfig;
use crate::errors::{RelTrackError, Result};
use crate::extract::{classify, ExtractContext};
use crate::model::{Association, ClassSchema, RelationDescriptor};
use crate::policy::{TrackingDeclaration, TrackingPolicy};

/// Which relations a class view can track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    /// All six relation kinds, volatile fields stripped from embedded children
    Relations,
    /// Embedded relations only, children captured with every attribute
    EmbeddedOnly,
}

/// A registered class: schema, classified relations and tracking policy
#[derive(Debug)]
pub struct TrackedClass {
    schema: ClassSchema,
    relations: Vec<RelationDescriptor>,
    policy: TrackingPolicy,
    mode: TrackingMode,
    volatile_fields: BTreeSet<String>,
    tracked: OnceLock<Vec<RelationDescriptor>>,
}

impl TrackedClass {
    /// Classify `schema` and bind it to `policy`
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRelation` if the schema declares a relation name twice.
    pub fn new(
        schema: ClassSchema,
        policy: TrackingPolicy,
        volatile_fields: BTreeSet<String>,
    ) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for association in schema.associations() {
            if !seen.insert(association.name.as_str()) {
                return Err(RelTrackError::DuplicateRelation {
                    class_name: schema.name().to_string(),
                    relation: association.name.clone(),
                }
                .into());
            }
        }

        let relations = schema.associations().iter().filter_map(classify).collect();

        Ok(Self {
            schema,
            relations,
            policy,
            mode: TrackingMode::Relations,
            volatile_fields,
            tracked: OnceLock::new(),
        })
    }

    /// Class view tracking only embedded relations with full child attributes
    ///
    /// The tracking policy still applies on top of the embedded filter.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRelation` if the schema declares a relation name twice.
    pub fn embedded_only(schema: ClassSchema, policy: TrackingPolicy) -> Result<Self> {
        let mut class = Self::new(schema, policy, BTreeSet::new())?;
        class.mode = TrackingMode::EmbeddedOnly;
        Ok(class)
    }

    /// Register a subclass of `self`
    ///
    /// The subclass inherits every association and the parent's policy; its
    /// own associations are appended and `declaration` is unioned into a new
    /// policy. `self` is not modified.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateRelation` if a local association repeats an inherited name.
    pub fn subclass(
        &self,
        name: &str,
        local: &[Association],
        declaration: &TrackingDeclaration,
    ) -> Result<Self> {
        let schema = self.schema.extend(name, local);
        let policy = self.policy.declare(declaration);
        let mut class = Self::new(schema, policy, self.volatile_fields.clone())?;
        class.mode = self.mode;
        Ok(class)
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &ClassSchema {
        &self.schema
    }

    pub fn policy(&self) -> &TrackingPolicy {
        &self.policy
    }

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Every classified relation, tracked or not, in declaration order
    pub fn relations(&self) -> &[RelationDescriptor] {
        &self.relations
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Descriptor of a classified relation
    ///
    /// # Errors
    ///
    /// Returns `UnknownRelation` if `name` is not a trackable relation of
    /// this class.
    pub fn require_relation(&self, name: &str) -> Result<&RelationDescriptor> {
        self.relation(name).ok_or_else(|| {
            RelTrackError::UnknownRelation {
                class_name: self.name().to_string(),
                relation: name.to_string(),
            }
            .into()
        })
    }

    /// Whether `relation` participates in change tracking
    ///
    /// True only when the policy admits the name and the name classifies into
    /// a trackable kind (embedded kinds only in embedded-only mode).
    pub fn track_relation(&self, relation: &str) -> bool {
        self.policy.includes(relation)
            && self
                .relation(relation)
                .is_some_and(|r| self.mode_admits(r))
    }

    /// Tracked relations in declaration order, computed on first use
    pub fn tracked_relations(&self) -> &[RelationDescriptor] {
        self.tracked.get_or_init(|| {
            self.relations
                .iter()
                .filter(|r| self.policy.includes(&r.name) && self.mode_admits(r))
                .cloned()
                .collect()
        })
    }

    /// Names of [`tracked_relations`](Self::tracked_relations)
    pub fn tracked_relation_names(&self) -> Vec<&str> {
        self.tracked_relations()
            .iter()
            .map(|r| r.name.as_str())
            .collect()
    }

    pub fn volatile_fields(&self) -> &BTreeSet<String> {
        &self.volatile_fields
    }

    pub(crate) fn extract_context(&self) -> ExtractContext<'_> {
        ExtractContext {
            volatile_fields: &self.volatile_fields,
        }
    }

    fn mode_admits(&self, relation: &RelationDescriptor) -> bool {
        match self.mode {
            TrackingMode::Relations => true,
            TrackingMode::EmbeddedOnly => relation.kind.is_embedded(),
        }
    }
}

/// Registry of tracked classes, keyed by class name
///
/// # Example
///
/// ```
/// use reltrack_core::model::ClassSchema;
/// use reltrack_core::policy::TrackingDeclaration;
/// use reltrack_core::registry::ClassRegistry;
///
/// let mut registry = ClassRegistry::new();
/// registry
///     .register(
///         ClassSchema::new("A").embeds_many("many").has_one("one_related"),
///         &TrackingDeclaration::new().only("many"),
///     )
///     .unwrap();
/// assert!(registry.track_relation("A", "many").unwrap());
/// assert!(!registry.track_relation("A", "one_related").unwrap());
/// ```
#[derive(Debug, Default)]
pub struct ClassRegistry {
    config: TrackerConfig,
    classes: HashMap<String, Arc<TrackedClass>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose classes start from the configured base policy,
    /// per-class declarations and volatile fields
    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            config,
            classes: HashMap::new(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Register a root class
    ///
    /// The effective policy is the base policy, then the configured
    /// declaration for this class name, then `declaration`.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateClass` if the name is taken, or `DuplicateRelation`
    /// for a malformed schema.
    pub fn register(
        &mut self,
        schema: ClassSchema,
        declaration: &TrackingDeclaration,
    ) -> Result<Arc<TrackedClass>> {
        self.ensure_free(schema.name())?;
        let policy = self.base_policy(schema.name()).declare(declaration);
        let class = TrackedClass::new(schema, policy, self.config.volatile_field_set())?;
        Ok(self.insert(class))
    }

    /// Register a class tracking only its embedded relations
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn register_embedded_only(
        &mut self,
        schema: ClassSchema,
        declaration: &TrackingDeclaration,
    ) -> Result<Arc<TrackedClass>> {
        self.ensure_free(schema.name())?;
        let policy = self.base_policy(schema.name()).declare(declaration);
        let class = TrackedClass::embedded_only(schema, policy)?;
        Ok(self.insert(class))
    }

    /// Register `name` as a subclass of the registered class `parent`
    ///
    /// # Errors
    ///
    /// Returns `UnknownClass` if `parent` is not registered, `DuplicateClass`
    /// if `name` is taken, or `DuplicateRelation` for a repeated name.
    pub fn register_subclass(
        &mut self,
        parent: &str,
        name: &str,
        local: &[Association],
        declaration: &TrackingDeclaration,
    ) -> Result<Arc<TrackedClass>> {
        self.ensure_free(name)?;
        let parent = self.get(parent)?;
        let configured = self.config.declaration_for(name);
        let class = parent.subclass(name, local, &configured)?;
        let class = TrackedClass {
            policy: class.policy.declare(declaration),
            ..class
        };
        Ok(self.insert(class))
    }

    /// Look up a registered class
    ///
    /// # Errors
    ///
    /// Returns `UnknownClass` if the name was never registered.
    pub fn get(&self, name: &str) -> Result<Arc<TrackedClass>> {
        self.classes.get(name).cloned().ok_or_else(|| {
            RelTrackError::UnknownClass {
                class_name: name.to_string(),
            }
            .into()
        })
    }

    /// Class-level `track_relation`
    ///
    /// # Errors
    ///
    /// Returns `UnknownClass` if the class was never registered.
    pub fn track_relation(&self, class_name: &str, relation: &str) -> Result<bool> {
        Ok(self.get(class_name)?.track_relation(relation))
    }

    /// Class-level tracked relation names, in declaration order
    ///
    /// # Errors
    ///
    /// Returns `UnknownClass` if the class was never registered.
    pub fn tracked_relations(&self, class_name: &str) -> Result<Vec<String>> {
        Ok(self
            .get(class_name)?
            .tracked_relation_names()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn base_policy(&self, class_name: &str) -> TrackingPolicy {
        TrackingPolicy::with_revision_relation(&self.config.revision_relation)
            .declare(&self.config.declaration_for(class_name))
    }

    fn ensure_free(&self, name: &str) -> Result<()> {
        if self.classes.contains_key(name) {
            return Err(RelTrackError::DuplicateClass {
                class_name: name.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn insert(&mut self, class: TrackedClass) -> Arc<TrackedClass> {
        tracing::debug!(
            class = class.name(),
            tracked_len = class.tracked_relations().len(),
            "registered tracked class"
        );
        let class = Arc::new(class);
        self.classes
            .insert(class.name().to_string(), Arc::clone(&class));
        class
    }
}
