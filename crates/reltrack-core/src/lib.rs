//! RelTrack Core - relation change tracking for document entities
//!
//! This crate extends a host persistence layer's attribute dirty tracking to
//! an entity's relations, including:
//! - Classification of host associations into six relation kinds
//! - Per-class tracking policies (`only` / `except`, composable by subclasses)
//! - Shadow snapshots captured at materialization and after confirmed writes
//! - Deep, order-sensitive relation diffs merged with host attribute changes
//! - A versioning bridge that records prior relation state in revisions
//! - An in-memory reference host for embedding and testing

pub mod config;
pub mod diff;
pub mod errors;
pub mod extract;
pub mod host;
pub mod logging_facility;
pub mod model;
pub mod policy;
pub mod registry;
pub mod shadow;
pub mod tracked;
pub mod versioning;

/// Re-exported for the logging macros
pub use reltrack_core_types;

// Re-export commonly used types
pub use config::TrackerConfig;
pub use diff::{ChangeAggregator, ChangeSet, FieldChange};
pub use errors::{RelTrackError, Result, RtError, RtErrorKind};
pub use host::Document;
pub use model::{Association, AssociationMacro, Attributes, ClassSchema, RelationKind};
pub use policy::{NameList, TrackingDeclaration, TrackingPolicy};
pub use registry::{ClassRegistry, TrackedClass, TrackingMode};
pub use shadow::{RelationTracker, ShadowSnapshot, TrackingState};
pub use tracked::{PersistOutcome, TrackedDocument, WriteOutcome};
pub use versioning::{Revision, RevisionBacking, Versioned, VersioningBridge, VersioningConfig};
