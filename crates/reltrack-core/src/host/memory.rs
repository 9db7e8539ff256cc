//! In-memory reference host
//!
//! [`MemoryStore`] is a thread-safe record store keyed by `(class, id)`.
//! [`MemoryDocument`] is one materialized entity with native attribute dirty
//! tracking, embedded children, reference slots and id lists. The store can
//! be switched unavailable to inject data-access and persistence failures.

use chrono::Utc;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::config::DEFAULT_VOLATILE_FIELD;
use crate::diff::model::{ChangeSet, FieldChange};
use crate::errors::{RelTrackError, Result, RtError, RtErrorKind};
use crate::host::Document;
use crate::model::{Attributes, RelationDescriptor};
use crate::registry::TrackedClass;
use crate::shadow::ShadowSnapshot;
use crate::versioning::{Revision, RevisionBacking, Versioned};

/// Identity attribute assigned to every stored entity
pub const ID_FIELD: &str = "_id";

const UNAVAILABLE: &str = "memory store unavailable";

/// Attributes never copied into revisions
const UNVERSIONED_FIELDS: &[&str] = &[ID_FIELD, "version", DEFAULT_VOLATILE_FIELD];

/// Persisted state of one entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredRecord {
    pub attributes: Attributes,
    pub embedded_one: BTreeMap<String, Attributes>,
    pub embedded_many: BTreeMap<String, Vec<Attributes>>,
    pub referenced_one: BTreeMap<String, (String, String)>,
    pub referenced_ids: BTreeMap<String, Vec<Value>>,
    pub join_ids: BTreeMap<String, Vec<Value>>,
    pub version: Option<u64>,
    pub revisions: Vec<Revision>,
}

/// In-memory record store
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<(String, String), StoredRecord>>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read and write fail until switched back
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn is_unavailable(&self) -> bool {
        self.unavailable.load(Ordering::SeqCst)
    }

    /// Store a plain record and return its id
    ///
    /// An `_id` attribute is generated when absent.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` while the store is unavailable.
    pub fn insert(&self, class_name: &str, mut attributes: Attributes) -> Result<String> {
        self.ensure_writable("insert")?;
        let id = match attributes.get(ID_FIELD).and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::now_v7().to_string();
                attributes.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
        };
        let record = StoredRecord {
            attributes,
            ..Default::default()
        };
        self.write()?
            .insert((class_name.to_string(), id.clone()), record);
        Ok(id)
    }

    /// Look up one record
    ///
    /// # Errors
    ///
    /// Returns `DataAccess` while the store is unavailable.
    pub fn find(&self, class_name: &str, id: &str) -> Result<Option<StoredRecord>> {
        self.ensure_readable("find")?;
        Ok(self
            .read()?
            .get(&(class_name.to_string(), id.to_string()))
            .cloned())
    }

    /// Materialize a stored entity as a document
    ///
    /// # Errors
    ///
    /// Returns `DataAccess` while the store is unavailable.
    pub fn load(self: &Arc<Self>, class_name: &str, id: &str) -> Result<Option<MemoryDocument>> {
        Ok(self.find(class_name, id)?.map(|record| MemoryDocument {
            class_name: class_name.to_string(),
            store: Arc::clone(self),
            id: id.to_string(),
            persisted: Some(record.attributes.clone()),
            attributes: record.attributes,
            unloaded: BTreeSet::new(),
            embedded_one: record.embedded_one,
            embedded_many: record.embedded_many,
            referenced_one: record.referenced_one,
            referenced_ids: record.referenced_ids,
            join_ids: record.join_ids,
            version: record.version,
            revisions: record.revisions,
            versionless: false,
        }))
    }

    /// Write `doc` and mark its attributes persisted
    ///
    /// Touches `updated_at` on the entity and on every embedded child.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` while the store is unavailable.
    pub fn save(&self, doc: &mut MemoryDocument) -> Result<()> {
        self.ensure_writable("save")?;

        let now = Value::String(Utc::now().to_rfc3339());
        doc.attributes
            .insert(DEFAULT_VOLATILE_FIELD.to_string(), now.clone());
        for child in doc.embedded_one.values_mut() {
            child.insert(DEFAULT_VOLATILE_FIELD.to_string(), now.clone());
        }
        for child in doc.embedded_many.values_mut().flatten() {
            child.insert(DEFAULT_VOLATILE_FIELD.to_string(), now.clone());
        }

        let record = StoredRecord {
            attributes: doc.attributes.clone(),
            embedded_one: doc.embedded_one.clone(),
            embedded_many: doc.embedded_many.clone(),
            referenced_one: doc.referenced_one.clone(),
            referenced_ids: doc.referenced_ids.clone(),
            join_ids: doc.join_ids.clone(),
            version: doc.version,
            revisions: doc.revisions.clone(),
        };
        self.write()?
            .insert((doc.class_name.clone(), doc.id.clone()), record);
        doc.persisted = Some(doc.attributes.clone());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_readable(&self, op: &str) -> Result<()> {
        if self.is_unavailable() {
            return Err(RtError::new(RtErrorKind::DataAccess)
                .with_op(op)
                .with_message(UNAVAILABLE));
        }
        Ok(())
    }

    fn ensure_writable(&self, op: &str) -> Result<()> {
        if self.is_unavailable() {
            let err: RtError = RelTrackError::Persistence {
                message: UNAVAILABLE.to_string(),
            }
            .into();
            return Err(err.with_op(op));
        }
        Ok(())
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<(String, String), StoredRecord>>> {
        self.records.read().map_err(|_| poisoned())
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<(String, String), StoredRecord>>> {
        self.records.write().map_err(|_| poisoned())
    }
}

fn poisoned() -> RtError {
    RelTrackError::Internal {
        message: "memory store lock poisoned".to_string(),
    }
    .into()
}

impl RevisionBacking for MemoryStore {
    fn pull_revision(&self, class_name: &str, entity_id: &str, version: u64) -> Result<()> {
        self.ensure_writable("pull_revision")?;
        if let Some(record) = self
            .write()?
            .get_mut(&(class_name.to_string(), entity_id.to_string()))
        {
            record.revisions.retain(|r| r.version != Some(version));
        }
        Ok(())
    }
}

/// One materialized entity backed by a [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    class_name: String,
    store: Arc<MemoryStore>,
    id: String,
    attributes: Attributes,
    persisted: Option<Attributes>,
    unloaded: BTreeSet<String>,
    embedded_one: BTreeMap<String, Attributes>,
    embedded_many: BTreeMap<String, Vec<Attributes>>,
    referenced_one: BTreeMap<String, (String, String)>,
    referenced_ids: BTreeMap<String, Vec<Value>>,
    join_ids: BTreeMap<String, Vec<Value>>,
    version: Option<u64>,
    revisions: Vec<Revision>,
    versionless: bool,
}

impl MemoryDocument {
    /// A new, unsaved entity with a generated `_id`
    pub fn new(class_name: &str, store: &Arc<MemoryStore>) -> Self {
        let id = Uuid::now_v7().to_string();
        let mut attributes = Attributes::new();
        attributes.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        Self {
            class_name: class_name.to_string(),
            store: Arc::clone(store),
            id,
            attributes,
            persisted: None,
            unloaded: BTreeSet::new(),
            embedded_one: BTreeMap::new(),
            embedded_many: BTreeMap::new(),
            referenced_one: BTreeMap::new(),
            referenced_ids: BTreeMap::new(),
            join_ids: BTreeMap::new(),
            version: None,
            revisions: Vec::new(),
            versionless: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted.is_some()
    }

    pub fn set_attribute(&mut self, field: &str, value: Value) {
        self.unloaded.remove(field);
        self.attributes.insert(field.to_string(), value);
    }

    pub fn attribute(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// Simulate a query projection that did not load `fields`
    pub fn without_fields(mut self, fields: &[&str]) -> Self {
        self.unloaded.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn set_embedded_one(&mut self, relation: &str, child: Option<Attributes>) {
        match child {
            Some(child) => self.embedded_one.insert(relation.to_string(), child),
            None => self.embedded_one.remove(relation),
        };
    }

    pub fn embedded_one_mut(&mut self, relation: &str) -> Option<&mut Attributes> {
        self.embedded_one.get_mut(relation)
    }

    pub fn embedded_many_mut(&mut self, relation: &str) -> &mut Vec<Attributes> {
        self.embedded_many.entry(relation.to_string()).or_default()
    }

    /// Point a has-one slot at a stored entity, or clear it
    pub fn set_referenced_one(&mut self, relation: &str, target: Option<(&str, &str)>) {
        match target {
            Some((class_name, id)) => self.referenced_one.insert(
                relation.to_string(),
                (class_name.to_string(), id.to_string()),
            ),
            None => self.referenced_one.remove(relation),
        };
    }

    pub fn referenced_ids_mut(&mut self, relation: &str) -> &mut Vec<Value> {
        self.referenced_ids.entry(relation.to_string()).or_default()
    }

    pub fn join_ids_mut(&mut self, relation: &str) -> &mut Vec<Value> {
        self.join_ids.entry(relation.to_string()).or_default()
    }

    pub fn set_versionless(&mut self, versionless: bool) {
        self.versionless = versionless;
    }
}

impl Document for MemoryDocument {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn entity_id(&self) -> Option<String> {
        Some(self.id.clone())
    }

    fn read_attribute(&self, field: &str) -> Result<Option<Value>> {
        if self.unloaded.contains(field) {
            return Err(RelTrackError::AttributeNotLoaded {
                field: field.to_string(),
            }
            .into());
        }
        Ok(self.attributes.get(field).cloned())
    }

    fn embedded_one(&self, relation: &str) -> Option<&Attributes> {
        self.embedded_one.get(relation)
    }

    fn embedded_many(&self, relation: &str) -> Vec<&Attributes> {
        self.embedded_many
            .get(relation)
            .map(|children| children.iter().collect())
            .unwrap_or_default()
    }

    fn load_referenced_one(&self, relation: &RelationDescriptor) -> Result<Option<Attributes>> {
        let Some((class_name, id)) = self.referenced_one.get(&relation.name) else {
            return Ok(None);
        };
        let record = self.store.find(class_name, id).map_err(|err| {
            RtError::from(RelTrackError::DataAccess {
                relation: relation.name.clone(),
                message: err.message().to_string(),
            })
            .with_op("load_referenced_one")
            .with_class(&self.class_name)
            .with_entity_id(&self.id)
            .with_source(err)
        })?;
        Ok(record.map(|r| r.attributes))
    }

    fn referenced_ids(&self, relation: &str) -> Vec<Value> {
        self.referenced_ids.get(relation).cloned().unwrap_or_default()
    }

    fn join_ids(&self, relation: &str) -> Vec<Value> {
        self.join_ids.get(relation).cloned().unwrap_or_default()
    }

    fn attribute_changes(&self) -> ChangeSet {
        let empty = Attributes::new();
        let persisted = self.persisted.as_ref().unwrap_or(&empty);
        let names: BTreeSet<&String> = self.attributes.keys().chain(persisted.keys()).collect();
        names
            .into_iter()
            .filter(|name| !self.unloaded.contains(name.as_str()))
            .filter_map(|name| {
                let old = persisted.get(name).cloned().unwrap_or(Value::Null);
                let new = self.attributes.get(name).cloned().unwrap_or(Value::Null);
                (old != new).then(|| (name.clone(), FieldChange::new(old, new)))
            })
            .collect()
    }
}

impl Versioned for MemoryDocument {
    fn version(&self) -> Option<u64> {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = Some(version);
    }

    fn is_versioned_attribute(&self, field: &str) -> bool {
        !UNVERSIONED_FIELDS.contains(&field)
    }

    fn is_versionless(&self) -> bool {
        self.versionless
    }

    fn previous_revision(&self, class: &TrackedClass) -> Result<Option<Revision>> {
        if !self.is_persisted() {
            return Ok(None);
        }
        let Some(previous) = self.store.load(&self.class_name, &self.id)? else {
            return Ok(None);
        };
        let relations = ShadowSnapshot::capture(class, &previous)?.into_values();
        Ok(Some(Revision {
            version: previous.version,
            attributes: previous.attributes,
            relations,
        }))
    }

    fn revisions(&self) -> &[Revision] {
        &self.revisions
    }

    fn revisions_mut(&mut self) -> &mut Vec<Revision> {
        &mut self.revisions
    }
}
