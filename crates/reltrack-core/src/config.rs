//! Tracker configuration
//!
//! Configuration is plain serde data, usually loaded from TOML:
//!
//! ```toml
//! volatile_fields = ["updated_at"]
//! revision_relation = "versions"
//! log_profile = "production"
//!
//! [versioning]
//! version_max = 3
//! soft_delete = true
//!
//! [classes.Post]
//! only = "comments"
//!
//! [classes.Author]
//! except = ["drafts", "sessions"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::errors::Result;
use crate::logging_facility::{self, Profile};
use crate::policy::{TrackingDeclaration, REVISION_RELATION};
use crate::versioning::VersioningConfig;

/// Field stripped from embedded children by default
pub const DEFAULT_VOLATILE_FIELD: &str = "updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Timestamp-like fields removed from embedded children at capture time
    pub volatile_fields: Vec<String>,

    /// Revision-history relation name, always excluded from tracking
    pub revision_relation: String,

    /// Logging profile for [`init`](crate::logging_facility::init)
    pub log_profile: Profile,

    pub versioning: VersioningConfig,

    /// Per-class tracking declarations
    pub classes: BTreeMap<String, TrackingDeclaration>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            volatile_fields: vec![DEFAULT_VOLATILE_FIELD.to_string()],
            revision_relation: REVISION_RELATION.to_string(),
            log_profile: Profile::default(),
            versioning: VersioningConfig::default(),
            classes: BTreeMap::new(),
        }
    }
}

impl TrackerConfig {
    /// Parse a TOML document; absent keys take their defaults
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the document is not valid TOML or does not
    /// match the configuration shape.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Configured declaration for `class_name`, empty when none
    pub fn declaration_for(&self, class_name: &str) -> TrackingDeclaration {
        self.classes.get(class_name).cloned().unwrap_or_default()
    }

    pub fn volatile_field_set(&self) -> BTreeSet<String> {
        self.volatile_fields.iter().cloned().collect()
    }

    /// Install the global subscriber for the configured profile
    pub fn init_logging(&self) {
        logging_facility::init(self.log_profile);
    }
}
