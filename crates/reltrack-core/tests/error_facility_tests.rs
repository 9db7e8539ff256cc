use reltrack_core::errors::{RelTrackError, RtError, RtErrorKind};

#[test]
fn test_unknown_class_verifiable_by_kind() {
    let err: RtError = RelTrackError::UnknownClass {
        class_name: "Ghost".to_string(),
    }
    .into();

    assert_eq!(err.kind(), RtErrorKind::UnknownClass);
    assert_eq!(err.code(), "ERR_UNKNOWN_CLASS");
    assert_eq!(err.class_name(), Some("Ghost"));
}

#[test]
fn test_duplicate_relation_structured_fields() {
    let err: RtError = RelTrackError::DuplicateRelation {
        class_name: "Post".to_string(),
        relation: "comments".to_string(),
    }
    .into();

    assert_eq!(err.kind(), RtErrorKind::DuplicateRelation);
    assert_eq!(err.class_name(), Some("Post"));
    assert_eq!(err.relation(), Some("comments"));
    assert!(err.message().contains("more than once"));
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (RtErrorKind::InvalidConfig, "ERR_INVALID_CONFIG"),
        (RtErrorKind::UnknownClass, "ERR_UNKNOWN_CLASS"),
        (RtErrorKind::DuplicateClass, "ERR_DUPLICATE_CLASS"),
        (RtErrorKind::UnknownRelation, "ERR_UNKNOWN_RELATION"),
        (RtErrorKind::DuplicateRelation, "ERR_DUPLICATE_RELATION"),
        (RtErrorKind::ShadowNotCaptured, "ERR_SHADOW_NOT_CAPTURED"),
        (RtErrorKind::AttributeNotLoaded, "ERR_ATTRIBUTE_NOT_LOADED"),
        (RtErrorKind::DataAccess, "ERR_DATA_ACCESS"),
        (RtErrorKind::Persistence, "ERR_PERSISTENCE"),
        (RtErrorKind::Internal, "ERR_INTERNAL"),
    ];

    let mut seen = std::collections::HashSet::new();
    for (kind, code) in kinds {
        assert_eq!(kind.code(), code);
        assert!(seen.insert(code), "duplicate code {}", code);
    }
}

#[test]
fn test_display_includes_context() {
    let err = RtError::new(RtErrorKind::DataAccess)
        .with_op("load_referenced_one")
        .with_class("Post")
        .with_relation("author")
        .with_message("store unavailable");

    let rendered = err.to_string();
    assert!(rendered.starts_with("[ERR_DATA_ACCESS]"));
    assert!(rendered.contains("load_referenced_one"));
    assert!(rendered.contains("(class: Post)"));
    assert!(rendered.contains("(relation: author)"));
}

#[test]
fn test_source_chain() {
    let root = RtError::new(RtErrorKind::DataAccess).with_message("connection reset");
    let err = RtError::new(RtErrorKind::DataAccess)
        .with_relation("author")
        .with_source(root);

    let source = std::error::Error::source(&err).expect("source attached");
    assert!(source.to_string().contains("connection reset"));
    assert_eq!(
        err.source_error().map(|e| e.message()),
        Some("connection reset")
    );
}
