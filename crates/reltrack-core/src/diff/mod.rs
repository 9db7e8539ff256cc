//! Relation diff engine.
//!
//! Compares the shadow snapshot of an entity against its live relation state
//! and produces a [`ChangeSet`] of `name -> (old, new)` entries.
//!
//! ## Entry points
//!
//! - [`engine::compute_change_set`]: tracked relations against a shadow.
//! - [`aggregate::ChangeAggregator`]: relation changes merged with the host's
//!   attribute changes.
//! - [`human_summary::render_change_summary`]: Markdown for audit displays.
//!
//! ## Guarantees
//!
//! - **Determinism**: entries are keyed and iterated by name.
//! - **Order sensitivity**: reordering a collection relation is a change.
//! - **Volatile noise suppression**: volatile fields are stripped at capture
//!   time, so they never reach the comparison.

pub mod aggregate;
pub mod engine;
pub mod human_summary;
pub mod model;

pub use aggregate::ChangeAggregator;
pub use engine::compute_change_set;
pub use human_summary::render_change_summary;
pub use model::{ChangeSet, FieldChange};
