use serde_json::Value;

use crate::model::RelationDescriptor;

/// Transform a relation's prior value before it is stored in a revision.
pub trait PreserveRelationHook: Send + Sync {
    fn preserve(&self, relation: &RelationDescriptor, prior: Value) -> Value;
}

/// Stores the prior value unchanged (default).
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreserveHook;

impl PreserveRelationHook for IdentityPreserveHook {
    fn preserve(&self, _: &RelationDescriptor, prior: Value) -> Value {
        prior
    }
}

impl<F> PreserveRelationHook for F
where
    F: Fn(&RelationDescriptor, Value) -> Value + Send + Sync,
{
    fn preserve(&self, relation: &RelationDescriptor, prior: Value) -> Value {
        self(relation, prior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RelationKind;
    use serde_json::json;

    fn descriptor() -> RelationDescriptor {
        RelationDescriptor {
            name: "comments".to_string(),
            kind: RelationKind::EmbedsMany,
            key: String::new(),
        }
    }

    #[test]
    fn test_identity_hook_returns_prior() {
        let prior = json!([{"body": "first"}]);
        assert_eq!(
            IdentityPreserveHook.preserve(&descriptor(), prior.clone()),
            prior
        );
    }

    #[test]
    fn test_closure_hook() {
        let hook = |rel: &RelationDescriptor, prior: Value| {
            let mut wrapped = serde_json::Map::new();
            wrapped.insert(rel.name.clone(), prior);
            Value::Object(wrapped)
        };
        assert_eq!(
            hook.preserve(&descriptor(), json!(null)),
            json!({"comments": null})
        );
    }
}
