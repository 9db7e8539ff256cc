//! Relation classifier
//!
//! Maps host association metadata to a [`RelationKind`] once, at class
//! registration. Associations that are not one of the six trackable kinds
//! classify to `None` and are never tracked.

use crate::model::{Association, AssociationMacro, RelationDescriptor, RelationKind};

/// Default key for has-one, has-many and many-to-many relations
pub const DEFAULT_KEY: &str = "_id";

/// Kind for an association macro, if it is trackable
pub fn kind_of(macro_kind: AssociationMacro) -> Option<RelationKind> {
    match macro_kind {
        AssociationMacro::EmbedsOne => Some(RelationKind::EmbedsOne),
        AssociationMacro::EmbedsMany => Some(RelationKind::EmbedsMany),
        AssociationMacro::HasOne => Some(RelationKind::HasOne),
        AssociationMacro::HasMany => Some(RelationKind::HasMany),
        AssociationMacro::HasAndBelongsToMany => Some(RelationKind::HasAndBelongsToMany),
        AssociationMacro::BelongsTo => Some(RelationKind::BelongsTo),
        AssociationMacro::EmbeddedIn => None,
    }
}

/// Key field used when the association declares none
pub fn default_key(kind: RelationKind, relation: &str) -> String {
    match kind {
        RelationKind::BelongsTo => format!("{}_id", relation),
        RelationKind::EmbedsOne | RelationKind::EmbedsMany => String::new(),
        RelationKind::HasOne | RelationKind::HasMany | RelationKind::HasAndBelongsToMany => {
            DEFAULT_KEY.to_string()
        }
    }
}

/// Classify one association into a descriptor
pub fn classify(association: &Association) -> Option<RelationDescriptor> {
    let kind = kind_of(association.macro_kind)?;
    let key = association
        .key
        .clone()
        .unwrap_or_else(|| default_key(kind, &association.name));
    Some(RelationDescriptor {
        name: association.name.clone(),
        kind,
        key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_in_is_not_trackable() {
        let assoc = Association::new("parent", AssociationMacro::EmbeddedIn);
        assert!(classify(&assoc).is_none());
    }

    #[test]
    fn test_belongs_to_defaults_to_foreign_key() {
        let assoc = Association::new("test_document", AssociationMacro::BelongsTo);
        let desc = classify(&assoc).unwrap();
        assert_eq!(desc.kind, RelationKind::BelongsTo);
        assert_eq!(desc.key, "test_document_id");
    }

    #[test]
    fn test_explicit_key_wins() {
        let assoc = Association::new("tags", AssociationMacro::HasAndBelongsToMany).with_key("pk");
        let desc = classify(&assoc).unwrap();
        assert_eq!(desc.key, "pk");
    }

    #[test]
    fn test_every_trackable_macro_maps_to_distinct_kind() {
        let macros = [
            AssociationMacro::EmbedsOne,
            AssociationMacro::EmbedsMany,
            AssociationMacro::HasOne,
            AssociationMacro::HasMany,
            AssociationMacro::HasAndBelongsToMany,
            AssociationMacro::BelongsTo,
        ];
        let kinds: std::collections::BTreeSet<RelationKind> =
            macros.iter().filter_map(|m| kind_of(*m)).collect();
        assert_eq!(kinds.len(), RelationKind::COUNT);
    }
}
