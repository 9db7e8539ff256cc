#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{attrs, materialize, new_store, register, save, test_document_schema};
use reltrack_core::errors::{Result, RtError, RtErrorKind};
use reltrack_core::model::RelationDescriptor;
use reltrack_core::versioning::{
    versioned_changes, ReviseOutcome, RevisionBacking, Versioned, VersioningBridge,
    VersioningConfig,
};
use serde_json::{json, Value};

#[test]
fn test_revisable_when_only_a_relation_changed() {
    let class = register(test_document_schema("RelationOnlyDoc"));
    let store = new_store();
    let bridge = VersioningBridge::default();
    let mut doc = materialize(&class, &store);
    save(&mut doc);
    assert!(!bridge.revisable(&doc).unwrap());

    doc.doc_mut()
        .join_ids_mut("many_to_many_related")
        .push(json!("m1"));
    assert!(!doc.doc().versioned_attributes_changed());
    assert!(bridge.revisable(&doc).unwrap());
}

#[test]
fn test_updated_at_alone_is_not_revisable() {
    let class = register(test_document_schema("TouchedDoc"));
    let store = new_store();
    let bridge = VersioningBridge::default();
    let mut doc = materialize(&class, &store);
    save(&mut doc);

    doc.doc_mut()
        .set_attribute("updated_at", json!("2030-01-01T00:00:00Z"));
    assert!(versioned_changes(doc.doc()).is_empty());
    assert!(!bridge.revisable(&doc).unwrap());
}

#[test]
fn test_versionless_save_is_never_revisable() {
    let class = register(test_document_schema("VersionlessDoc"));
    let store = new_store();
    let bridge = VersioningBridge::default();
    let mut doc = materialize(&class, &store);
    save(&mut doc);

    doc.doc_mut().set_attribute("title", json!("t"));
    doc.doc_mut().set_versionless(true);
    let outcome = bridge.revise_if_needed(&mut doc, &*store).unwrap();
    assert_eq!(outcome, ReviseOutcome::NotRevisable);
    assert!(doc.doc().revisions().is_empty());
}

#[test]
fn test_unsaved_entity_has_no_previous_revision() {
    let class = register(test_document_schema("UnsavedDoc"));
    let store = new_store();
    let bridge = VersioningBridge::default();
    let mut doc = materialize(&class, &store);

    doc.doc_mut().set_attribute("title", json!("t"));
    let outcome = bridge.revise_if_needed(&mut doc, &*store).unwrap();
    assert_eq!(outcome, ReviseOutcome::NoPreviousRevision);
    assert_eq!(doc.doc().version(), None);
}

#[test]
fn test_revision_records_prior_relation_values() {
    let class = register(test_document_schema("PriorValuesDoc"));
    let store = new_store();
    let bridge = VersioningBridge::default();
    let related_id = store.insert("Related", attrs(json!({"name": "r"}))).unwrap();
    let mut doc = materialize(&class, &store);
    doc.doc_mut().set_attribute("title", json!("first"));
    doc.doc_mut().set_attribute("owner_id", json!("o1"));
    doc.doc_mut()
        .set_referenced_one("one_related", Some(("Related", &related_id)));
    doc.doc_mut()
        .referenced_ids_mut("many_related")
        .push(json!("r1"));
    doc.doc_mut()
        .join_ids_mut("many_to_many_related")
        .push(json!("m1"));
    save(&mut doc);

    doc.doc_mut().set_attribute("title", json!("second"));
    doc.doc_mut()
        .join_ids_mut("many_to_many_related")
        .push(json!("m2"));
    let outcome = bridge.revise_if_needed(&mut doc, &*store).unwrap();
    assert_eq!(
        outcome,
        ReviseOutcome::Revised {
            version: 1,
            evicted: None
        }
    );

    let revision = &doc.doc().revisions()[0];
    assert_eq!(revision.version, Some(1));
    assert_eq!(revision.attributes.get("title"), Some(&json!("first")));
    assert!(!revision.attributes.contains_key("_id"));
    assert!(!revision.attributes.contains_key("updated_at"));

    // changed relation: the change-set's old side
    assert_eq!(
        revision.relations.get("many_to_many_related"),
        Some(&json!([{"pk": "m1"}]))
    );
    // unchanged relations: the previous revision's value, in the same form
    assert_eq!(
        revision.relations.get("many_related"),
        Some(&json!([{"_id": "r1"}]))
    );
    assert_eq!(
        revision.relations.get("owner"),
        Some(&json!({"owner_id": "o1"}))
    );
    assert_eq!(
        revision.relations.get("one_related"),
        Some(&json!({"_id": related_id}))
    );
    // nothing embedded in the previous revision
    assert_eq!(revision.relations.get("one_document"), Some(&Value::Null));
    assert_eq!(revision.relations.get("many_documents"), Some(&json!([])));
    assert!(!revision.relations.contains_key("versions"));

    assert_eq!(doc.doc().version(), Some(2));
}

#[test]
fn test_preserve_hook_transforms_prior_values() {
    let class = register(test_document_schema("HookDoc"));
    let store = new_store();
    let bridge = VersioningBridge::new(VersioningConfig::default()).with_hook(
        |relation: &RelationDescriptor, prior: Value| {
            if relation.name == "many_related" {
                json!({"preserved": prior})
            } else {
                prior
            }
        },
    );
    let mut doc = materialize(&class, &store);
    save(&mut doc);

    doc.doc_mut()
        .referenced_ids_mut("many_related")
        .push(json!("r1"));
    bridge.revise_if_needed(&mut doc, &*store).unwrap();

    let revision = &doc.doc().revisions()[0];
    assert_eq!(
        revision.relations.get("many_related"),
        Some(&json!({"preserved": []}))
    );
}

#[test]
fn test_previous_revision_failure_leaves_document_untouched() {
    let class = register(test_document_schema("OfflineDoc"));
    let store = new_store();
    let bridge = VersioningBridge::default();
    let mut doc = materialize(&class, &store);
    save(&mut doc);

    doc.doc_mut().set_attribute("title", json!("t"));
    store.set_unavailable(true);
    let write_store = Arc::clone(&store);
    let err = bridge
        .save_versioned(&mut doc, &*store, |d| write_store.save(d))
        .unwrap_err();
    assert_eq!(err.kind(), RtErrorKind::DataAccess);
    assert!(doc.doc().revisions().is_empty());
    assert_eq!(doc.doc().version(), None);
}

#[test]
fn test_versioned_changes_filters_unversioned_fields() {
    let class = register(test_document_schema("FilterDoc"));
    let store = new_store();
    let mut doc = materialize(&class, &store);
    doc.doc_mut().set_attribute("title", json!("t"));
    doc.doc_mut().referenced_ids_mut("many_related").push(json!("r1"));

    let changes = versioned_changes(doc.doc());
    assert_eq!(changes.names().collect::<Vec<_>>(), vec!["title"]);
}

/// Backing whose persisted revision list cannot be modified
struct ReadOnlyBacking;

impl RevisionBacking for ReadOnlyBacking {
    fn pull_revision(&self, _class_name: &str, _entity_id: &str, _version: u64) -> Result<()> {
        Err(RtError::new(RtErrorKind::Persistence).with_message("revision list is read-only"))
    }
}

#[test]
fn test_backing_failure_during_eviction_leaves_document_untouched() {
    let class = register(test_document_schema("ReadOnlyBackingDoc"));
    let store = new_store();
    let bridge = VersioningBridge::new(VersioningConfig {
        version_max: Some(1),
        soft_delete: true,
    });
    let mut doc = materialize(&class, &store);
    save(&mut doc);

    doc.doc_mut().set_attribute("title", json!("first"));
    let outcome = bridge.revise_if_needed(&mut doc, &ReadOnlyBacking).unwrap();
    assert_eq!(
        outcome,
        ReviseOutcome::Revised {
            version: 1,
            evicted: None
        }
    );
    save(&mut doc);

    doc.doc_mut().set_attribute("title", json!("second"));
    let err = bridge
        .revise_if_needed(&mut doc, &ReadOnlyBacking)
        .unwrap_err();
    assert_eq!(err.kind(), RtErrorKind::Persistence);
    assert_eq!(err.entity_id(), Some(doc.doc().id()));
    let versions: Vec<_> = doc.doc().revisions().iter().map(|r| r.version).collect();
    assert_eq!(versions, vec![Some(1)]);
    assert_eq!(doc.doc().version(), Some(2));

    // retrying against a working backing revises exactly once
    let outcome = bridge.revise_if_needed(&mut doc, &*store).unwrap();
    assert_eq!(
        outcome,
        ReviseOutcome::Revised {
            version: 2,
            evicted: Some(1)
        }
    );
    let versions: Vec<_> = doc.doc().revisions().iter().map(|r| r.version).collect();
    assert_eq!(versions, vec![Some(2)]);
    assert_eq!(doc.doc().version(), Some(3));
}
