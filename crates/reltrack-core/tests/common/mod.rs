use std::sync::Arc;

use reltrack_core::host::memory::{MemoryDocument, MemoryStore};
use reltrack_core::model::{Association, AssociationMacro, Attributes, ClassSchema};
use reltrack_core::policy::TrackingDeclaration;
use reltrack_core::registry::{ClassRegistry, TrackedClass};
use reltrack_core::tracked::{PersistOutcome, TrackedDocument};
use serde_json::Value;

/// Class name used by [`test_document_schema`]
#[allow(dead_code)]
pub const TEST_DOCUMENT: &str = "TestDocument";

/// A class with one relation of every trackable kind plus a revision list
///
/// The many-to-many relation uses the custom key `pk`.
#[allow(dead_code)]
pub fn test_document_schema(name: &str) -> ClassSchema {
    ClassSchema::new(name)
        .embeds_one("one_document")
        .embeds_many("many_documents")
        .has_one("one_related")
        .has_many("many_related")
        .with_association(
            Association::new("many_to_many_related", AssociationMacro::HasAndBelongsToMany)
                .with_key("pk"),
        )
        .belongs_to("owner")
        .embeds_many("versions")
}

/// Register `schema` with no extra declaration
#[allow(dead_code)]
pub fn register(schema: ClassSchema) -> Arc<TrackedClass> {
    let mut registry = ClassRegistry::new();
    registry
        .register(schema, &TrackingDeclaration::new())
        .expect("class should register")
}

#[allow(dead_code)]
pub fn new_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// Materialize a new document of `class` backed by `store`
#[allow(dead_code)]
pub fn materialize(
    class: &Arc<TrackedClass>,
    store: &Arc<MemoryStore>,
) -> TrackedDocument<MemoryDocument> {
    TrackedDocument::materialize(MemoryDocument::new(class.name(), store), Arc::clone(class))
        .expect("materialize should capture")
}

/// Save through the memory store and assert the shadow was refreshed
#[allow(dead_code)]
pub fn save(tracked: &mut TrackedDocument<MemoryDocument>) {
    let store = Arc::clone(tracked.doc().store());
    let outcome = tracked
        .persist_with(|doc| store.save(doc))
        .expect("save should succeed");
    assert!(matches!(outcome, PersistOutcome::Recaptured));
}

/// Attribute map from a JSON object literal
#[allow(dead_code)]
pub fn attrs(value: Value) -> Attributes {
    value
        .as_object()
        .cloned()
        .expect("attrs expects a JSON object")
}
