#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{attrs, materialize, new_store, register, save, test_document_schema};
use reltrack_core::errors::RelTrackError;
use reltrack_core::host::memory::MemoryDocument;
use reltrack_core::logging_facility::test_capture::init_test_capture;
use reltrack_core::tracked::TrackedDocument;
use reltrack_core::{log_op_end, log_op_error, log_op_start};
use reltrack_core::versioning::VersioningBridge;
use reltrack_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_CHANGED_LEN, FIELD_CLASS, FIELD_DURATION_MS,
    FIELD_ERR_CODE, FIELD_ERR_KIND, FIELD_RELATION, FIELD_REVISIONS_LEN, FIELD_TRACKED_LEN,
};
use serde_json::json;
use tracing::Level;

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events();
    let end_events: Vec<_> = events
        .iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .collect();

    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].field(FIELD_DURATION_MS), Some("42"));
}

#[test]
fn test_op_macros_in_match_arm_position() {
    let capture = init_test_capture();
    let op_name = "test_op_macros_match_arm_unique_4";

    let result: Result<usize, RelTrackError> = Ok(2);
    match &result {
        Ok(len) => log_op_end!(op_name, duration_ms = 1, changed_len = *len),
        Err(err) => log_op_error!(op_name, err.clone(), duration_ms = 1),
    }
    match Some(op_name) {
        Some(op) => log_op_start!(op),
        None => log_op_start!(op_name, class = "Post"),
    }

    capture.assert_event_exists(op_name, EVENT_START);
    let events = capture.events();
    let end = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .expect("Should have end event");
    assert_eq!(end.field(FIELD_CHANGED_LEN), Some("2"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = RelTrackError::ShadowNotCaptured {
        class_name: "Post".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let events = capture.events();
    let error_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("Should have error event");

    assert_eq!(error_event.level, Level::ERROR);
    assert_eq!(error_event.field(FIELD_ERR_KIND), Some("ShadowNotCaptured"));
    assert_eq!(error_event.field(FIELD_ERR_CODE), Some("ERR_SHADOW_NOT_CAPTURED"));
}

#[test]
fn test_capture_and_diff_emit_start_end_pairs() {
    let capture = init_test_capture();
    let class_name = "LoggedCaptureDoc";
    let class = register(test_document_schema(class_name));
    let store = new_store();
    let mut tracked = materialize(&class, &store);
    tracked
        .doc_mut()
        .set_embedded_one("one_document", Some(attrs(json!({"title": "t"}))));
    tracked.relation_change_set().unwrap();

    let starts = capture.matching("capture_shadow", EVENT_START, FIELD_CLASS, class_name);
    let ends = capture.matching("capture_shadow", EVENT_END, FIELD_CLASS, class_name);
    assert_eq!(starts.len(), 1);
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].field(FIELD_TRACKED_LEN), Some("6"));

    let diff_ends = capture.matching("compute_change_set", EVENT_END, FIELD_CLASS, class_name);
    assert_eq!(diff_ends.len(), 1);
    assert_eq!(diff_ends[0].field(FIELD_CHANGED_LEN), Some("1"));
}

#[test]
fn test_change_set_before_capture_logs_error() {
    let capture = init_test_capture();
    let class_name = "LoggedUncapturedDoc";
    let class = register(test_document_schema(class_name));
    let store = new_store();
    let tracked = TrackedDocument::new(MemoryDocument::new(class_name, &store), class);

    tracked.relation_change_set().unwrap_err();

    let errors = capture.matching("compute_change_set", EVENT_END_ERROR, FIELD_CLASS, class_name);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field(FIELD_ERR_CODE), Some("ERR_SHADOW_NOT_CAPTURED"));
}

#[test]
fn test_attribute_relation_collision_logs_warning() {
    let capture = init_test_capture();
    let class_name = "LoggedCollisionDoc";
    let class = register(test_document_schema(class_name));
    let store = new_store();
    let mut tracked = materialize(&class, &store);
    tracked.doc_mut().set_attribute("many_related", json!("x"));
    tracked
        .doc_mut()
        .referenced_ids_mut("many_related")
        .push(json!("r1"));

    tracked.all_changes().unwrap();

    let warnings: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.level == Level::WARN && e.field(FIELD_CLASS) == Some(class_name))
        .collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].field(FIELD_RELATION), Some("many_related"));
}

#[test]
fn test_revise_logs_revision_count() {
    let capture = init_test_capture();
    let class_name = "LoggedReviseDoc";
    let class = register(test_document_schema(class_name));
    let store = new_store();
    let mut tracked = materialize(&class, &store);
    save(&mut tracked);
    tracked.doc_mut().set_attribute("title", json!("t"));

    VersioningBridge::default()
        .revise_if_needed(&mut tracked, &*store)
        .unwrap();

    let ends = capture.matching("revise_if_needed", EVENT_END, FIELD_CLASS, class_name);
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].field(FIELD_REVISIONS_LEN), Some("1"));
}
