use serde::{Deserialize, Serialize};

use super::relation::{Association, AssociationMacro};

/// Host class schema: a class name and its declared associations
///
/// Associations keep their declaration order; tracked relation lists derived
/// from a schema preserve it.
///
/// # Example
///
/// ```
/// use reltrack_core::model::ClassSchema;
///
/// let schema = ClassSchema::new("Post")
///     .embeds_many("comments")
///     .belongs_to("author");
/// assert_eq!(schema.associations().len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassSchema {
    name: String,
    #[serde(default)]
    associations: Vec<Association>,
}

impl ClassSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            associations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.name == name)
    }

    /// Append an association declaration
    pub fn with_association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    pub fn embeds_one(self, name: &str) -> Self {
        self.with_association(Association::new(name, AssociationMacro::EmbedsOne))
    }

    pub fn embeds_many(self, name: &str) -> Self {
        self.with_association(Association::new(name, AssociationMacro::EmbedsMany))
    }

    pub fn embedded_in(self, name: &str) -> Self {
        self.with_association(Association::new(name, AssociationMacro::EmbeddedIn))
    }

    pub fn has_one(self, name: &str) -> Self {
        self.with_association(Association::new(name, AssociationMacro::HasOne))
    }

    pub fn has_many(self, name: &str) -> Self {
        self.with_association(Association::new(name, AssociationMacro::HasMany))
    }

    pub fn has_and_belongs_to_many(self, name: &str) -> Self {
        self.with_association(Association::new(
            name,
            AssociationMacro::HasAndBelongsToMany,
        ))
    }

    pub fn belongs_to(self, name: &str) -> Self {
        self.with_association(Association::new(name, AssociationMacro::BelongsTo))
    }

    /// Schema for a subclass: inherits every association of `self`, then
    /// appends the subclass's own declarations
    pub fn extend(&self, name: impl Into<String>, local: &[Association]) -> Self {
        let mut associations = self.associations.clone();
        associations.extend(local.iter().cloned());
        Self {
            name: name.into(),
            associations,
        }
    }
}
