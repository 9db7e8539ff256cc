//! Tracking policy
//!
//! A [`TrackingPolicy`] decides which relation names of a class participate
//! in change tracking. Policies are immutable values: each
//! [`TrackingDeclaration`] applied to a policy yields a new policy whose
//! `only`/`except` sets are the union of the old sets and the declared names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Name of the revision-history relation, excluded from tracking by default
pub const REVISION_RELATION: &str = "versions";

/// One relation name or a list of them
///
/// Declarations accept either form; a single name is coerced into a
/// one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    One(String),
    Many(Vec<String>),
}

impl NameList {
    pub fn into_names(self) -> Vec<String> {
        match self {
            NameList::One(name) => vec![name],
            NameList::Many(names) => names,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            NameList::One(name) => vec![name.as_str()],
            NameList::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for NameList {
    fn from(name: &str) -> Self {
        NameList::One(name.to_string())
    }
}

impl From<String> for NameList {
    fn from(name: String) -> Self {
        NameList::One(name)
    }
}

impl From<Vec<String>> for NameList {
    fn from(names: Vec<String>) -> Self {
        NameList::Many(names)
    }
}

impl From<Vec<&str>> for NameList {
    fn from(names: Vec<&str>) -> Self {
        NameList::Many(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for NameList {
    fn from(names: [&str; N]) -> Self {
        NameList::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

/// A tracking declaration for a class
///
/// # Example
///
/// ```
/// use reltrack_core::policy::{TrackingDeclaration, TrackingPolicy};
///
/// let policy = TrackingPolicy::default()
///     .declare(&TrackingDeclaration::new().except("drafts"));
/// assert!(!policy.includes("drafts"));
/// assert!(!policy.includes("versions"));
/// assert!(policy.includes("comments"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackingDeclaration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<NameList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub except: Option<NameList>,
}

impl TrackingDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only(mut self, names: impl Into<NameList>) -> Self {
        self.only = Some(names.into());
        self
    }

    pub fn except(mut self, names: impl Into<NameList>) -> Self {
        self.except = Some(names.into());
        self
    }
}

/// Effective include/exclude sets for one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingPolicy {
    only: BTreeSet<String>,
    except: BTreeSet<String>,
}

impl Default for TrackingPolicy {
    fn default() -> Self {
        Self::with_revision_relation(REVISION_RELATION)
    }
}

impl TrackingPolicy {
    /// Base policy excluding the given revision-history relation name
    pub fn with_revision_relation(name: &str) -> Self {
        Self {
            only: BTreeSet::new(),
            except: BTreeSet::from([name.to_string()]),
        }
    }

    /// Derive a new policy with the declaration's names unioned in
    ///
    /// `self` is left untouched, so a parent class's policy can be shared
    /// while subclasses derive their own.
    pub fn declare(&self, declaration: &TrackingDeclaration) -> TrackingPolicy {
        let mut derived = self.clone();
        if let Some(only) = &declaration.only {
            derived
                .only
                .extend(only.names().into_iter().map(str::to_string));
        }
        if let Some(except) = &declaration.except {
            derived
                .except
                .extend(except.names().into_iter().map(str::to_string));
        }
        derived
    }

    /// Whether the policy admits `relation`
    ///
    /// A non-empty `only` set decides alone; otherwise every name outside
    /// `except` is admitted.
    pub fn includes(&self, relation: &str) -> bool {
        if self.only.is_empty() {
            !self.except.contains(relation)
        } else {
            self.only.contains(relation)
        }
    }

    pub fn only(&self) -> &BTreeSet<String> {
        &self.only
    }

    pub fn except(&self) -> &BTreeSet<String> {
        &self.except
    }
}
