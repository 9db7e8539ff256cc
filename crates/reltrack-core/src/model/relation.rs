use serde::{Deserialize, Serialize};

/// Association macro as declared by the host schema
///
/// This is the raw host-side metadata. Only six of these macros describe a
/// relation the engine can track; see [`RelationKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationMacro {
    EmbedsOne,
    EmbedsMany,
    /// Inverse side of an embedding; never tracked
    EmbeddedIn,
    HasOne,
    HasMany,
    HasAndBelongsToMany,
    BelongsTo,
}

/// The six trackable relation cardinalities
///
/// Assigned once when a class is registered. The discriminant doubles as the
/// index into the extractor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    EmbedsOne = 0,
    EmbedsMany = 1,
    HasOne = 2,
    HasMany = 3,
    HasAndBelongsToMany = 4,
    BelongsTo = 5,
}

impl RelationKind {
    /// Number of kinds (size of the extractor table)
    pub const COUNT: usize = 6;

    /// All kinds in table order
    pub const ALL: [RelationKind; RelationKind::COUNT] = [
        RelationKind::EmbedsOne,
        RelationKind::EmbedsMany,
        RelationKind::HasOne,
        RelationKind::HasMany,
        RelationKind::HasAndBelongsToMany,
        RelationKind::BelongsTo,
    ];

    /// Position of this kind in the extractor table
    pub fn index(self) -> usize {
        self as usize
    }

    /// True for relations stored inline in the parent record
    pub fn is_embedded(self) -> bool {
        matches!(self, RelationKind::EmbedsOne | RelationKind::EmbedsMany)
    }

    /// True for relations whose captured value is a sequence
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            RelationKind::EmbedsMany | RelationKind::HasMany | RelationKind::HasAndBelongsToMany
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::EmbedsOne => "embeds_one",
            RelationKind::EmbedsMany => "embeds_many",
            RelationKind::HasOne => "has_one",
            RelationKind::HasMany => "has_many",
            RelationKind::HasAndBelongsToMany => "has_and_belongs_to_many",
            RelationKind::BelongsTo => "belongs_to",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A host association declaration, before classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    /// Relation name, unique per class
    pub name: String,

    /// Declared macro
    #[serde(rename = "macro")]
    pub macro_kind: AssociationMacro,

    /// Explicit key field; the classifier picks a default per kind when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Association {
    pub fn new(name: impl Into<String>, macro_kind: AssociationMacro) -> Self {
        Self {
            name: name.into(),
            macro_kind,
            key: None,
        }
    }

    /// Override the key field used for extraction
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// A classified, trackable relation
///
/// Immutable once the owning class is registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    /// Relation name, unique per class
    pub name: String,

    /// Cardinality kind
    pub kind: RelationKind,

    /// Key attribute read during extraction:
    /// - has_one / has_many: the key recorded per related entity
    /// - has_and_belongs_to_many: the primary key field
    /// - belongs_to: the foreign key field on the owner
    /// - embedded kinds: unused
    pub key: String,
}
