pub mod relation;
pub mod schema;

pub use relation::{Association, AssociationMacro, RelationDescriptor, RelationKind};
pub use schema::ClassSchema;

/// Attribute map of a document or embedded child
pub type Attributes = serde_json::Map<String, serde_json::Value>;
