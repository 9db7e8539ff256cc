//! Relation extraction
//!
//! Each [`RelationKind`] has one extraction rule turning live relation state
//! into a structurally comparable [`Value`]:
//!
//! | kind | value | absent |
//! |---|---|---|
//! | embeds_one | child attributes minus volatile fields | `null` |
//! | embeds_many | `[attributes, ...]` in child order | `[]` |
//! | has_one | `{key: child[key]}` from the loaded child | `null` |
//! | has_many | `[{key: id}, ...]` from the id list | `[]` |
//! | has_and_belongs_to_many | `[{key: id}, ...]` from the join-key list | `[]` |
//! | belongs_to | `{foreign_key: value}` | `null` |
//!
//! Rules are selected through [`EXTRACTORS`], indexed by
//! [`RelationKind::index`]. Collection-of-reference kinds only read id lists;
//! has_one is the single rule that loads a related entity.

pub mod classify;

use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::errors::{Result, RtErrorKind};
use crate::host::Document;
use crate::model::{Attributes, RelationDescriptor, RelationKind};

pub use classify::classify;

/// Inputs shared by every extraction rule
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    /// Fields removed from embedded children at capture time
    pub volatile_fields: &'a BTreeSet<String>,
}

/// Signature of one extraction rule
pub type ExtractFn = fn(&dyn Document, &RelationDescriptor, ExtractContext<'_>) -> Result<Value>;

/// Extraction rules in [`RelationKind`] order
pub static EXTRACTORS: [ExtractFn; RelationKind::COUNT] = [
    extract_embeds_one,
    extract_embeds_many,
    extract_has_one,
    extract_has_many,
    extract_has_and_belongs_to_many,
    extract_belongs_to,
];

/// Extract the comparable value of one relation
///
/// # Errors
///
/// Only has_one extraction can fail, with whatever error the host's
/// data-access layer returned.
pub fn extract(
    doc: &dyn Document,
    relation: &RelationDescriptor,
    ctx: ExtractContext<'_>,
) -> Result<Value> {
    EXTRACTORS[relation.kind.index()](doc, relation, ctx)
}

/// Value captured for a relation with nothing associated
pub fn absent_value(kind: RelationKind) -> Value {
    if kind.is_collection() {
        Value::Array(Vec::new())
    } else {
        Value::Null
    }
}

fn strip_volatile(attributes: &Attributes, volatile: &BTreeSet<String>) -> Value {
    let kept: Map<String, Value> = attributes
        .iter()
        .filter(|(field, _)| !volatile.contains(*field))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect();
    Value::Object(kept)
}

fn key_map(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn extract_embeds_one(
    doc: &dyn Document,
    relation: &RelationDescriptor,
    ctx: ExtractContext<'_>,
) -> Result<Value> {
    Ok(doc
        .embedded_one(&relation.name)
        .map(|child| strip_volatile(child, ctx.volatile_fields))
        .unwrap_or_else(|| absent_value(relation.kind)))
}

fn extract_embeds_many(
    doc: &dyn Document,
    relation: &RelationDescriptor,
    ctx: ExtractContext<'_>,
) -> Result<Value> {
    Ok(Value::Array(
        doc.embedded_many(&relation.name)
            .into_iter()
            .map(|child| strip_volatile(child, ctx.volatile_fields))
            .collect(),
    ))
}

fn extract_has_one(
    doc: &dyn Document,
    relation: &RelationDescriptor,
    _ctx: ExtractContext<'_>,
) -> Result<Value> {
    let child = doc.load_referenced_one(relation)?;
    Ok(child
        .map(|child| {
            let key_value = child.get(&relation.key).cloned().unwrap_or(Value::Null);
            key_map(&relation.key, key_value)
        })
        .unwrap_or_else(|| absent_value(relation.kind)))
}

fn extract_has_many(
    doc: &dyn Document,
    relation: &RelationDescriptor,
    _ctx: ExtractContext<'_>,
) -> Result<Value> {
    Ok(Value::Array(
        doc.referenced_ids(&relation.name)
            .into_iter()
            .map(|id| key_map(&relation.key, id))
            .collect(),
    ))
}

fn extract_has_and_belongs_to_many(
    doc: &dyn Document,
    relation: &RelationDescriptor,
    _ctx: ExtractContext<'_>,
) -> Result<Value> {
    Ok(Value::Array(
        doc.join_ids(&relation.name)
            .into_iter()
            .map(|id| key_map(&relation.key, id))
            .collect(),
    ))
}

fn extract_belongs_to(
    doc: &dyn Document,
    relation: &RelationDescriptor,
    _ctx: ExtractContext<'_>,
) -> Result<Value> {
    match doc.read_attribute(&relation.key) {
        Ok(Some(value)) if !value.is_null() => Ok(key_map(&relation.key, value)),
        Ok(_) => Ok(absent_value(relation.kind)),
        Err(err) if err.kind() == RtErrorKind::AttributeNotLoaded => {
            tracing::debug!(
                class = doc.class_name(),
                relation = relation.name.as_str(),
                field = relation.key.as_str(),
                "foreign key not loaded, treating relation as absent"
            );
            Ok(absent_value(relation.kind))
        }
        Err(err) => Err(err),
    }
}
