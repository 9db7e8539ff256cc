use thiserror::Error;

/// Result type alias using the canonical [`RtError`]
pub type Result<T> = std::result::Result<T, RtError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised by the tracking engine. Each kind maps to a stable error code that
/// can be used for programmatic error handling and testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtErrorKind {
    // Registration / configuration
    InvalidConfig,
    UnknownClass,
    DuplicateClass,
    UnknownRelation,
    DuplicateRelation,

    // Tracking
    ShadowNotCaptured,
    /// An attribute was requested that the host has not materialized
    AttributeNotLoaded,

    // Integration/IO
    /// The host data-access layer failed while resolving a related entity
    DataAccess,
    Persistence,

    // Internal
    Internal,
}

impl RtErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            RtErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            RtErrorKind::UnknownClass => "ERR_UNKNOWN_CLASS",
            RtErrorKind::DuplicateClass => "ERR_DUPLICATE_CLASS",
            RtErrorKind::UnknownRelation => "ERR_UNKNOWN_RELATION",
            RtErrorKind::DuplicateRelation => "ERR_DUPLICATE_RELATION",
            RtErrorKind::ShadowNotCaptured => "ERR_SHADOW_NOT_CAPTURED",
            RtErrorKind::AttributeNotLoaded => "ERR_ATTRIBUTE_NOT_LOADED",
            RtErrorKind::DataAccess => "ERR_DATA_ACCESS",
            RtErrorKind::Persistence => "ERR_PERSISTENCE",
            RtErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus optional
/// context (operation, class, relation, entity) for debugging.
#[derive(Debug, Clone)]
pub struct RtError {
    kind: RtErrorKind,
    op: Option<String>,
    class_name: Option<String>,
    relation: Option<String>,
    entity_id: Option<String>,
    message: String,
    source: Option<Box<RtError>>,
}

impl RtError {
    /// Create a new error with the specified kind
    pub fn new(kind: RtErrorKind) -> Self {
        Self {
            kind,
            op: None,
            class_name: None,
            relation: None,
            entity_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add class context
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Add relation context
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: RtError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> RtErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the class context, if any
    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    /// Get the relation context, if any
    pub fn relation(&self) -> Option<&str> {
        self.relation.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&RtError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for RtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(class_name) = &self.class_name {
            write!(f, " (class: {})", class_name)?;
        }
        if let Some(relation) = &self.relation {
            write!(f, " (relation: {})", relation)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RtError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain error taxonomy for relation tracking
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelTrackError {
    /// Class was never registered
    #[error("Class not registered: {class_name}")]
    UnknownClass { class_name: String },

    /// Class registered twice under the same name
    #[error("Class already registered: {class_name}")]
    DuplicateClass { class_name: String },

    /// Relation name not declared on the class schema
    #[error("Relation {relation} is not declared on class {class_name}")]
    UnknownRelation {
        class_name: String,
        relation: String,
    },

    /// Relation name declared twice on the same class schema
    #[error("Relation {relation} is declared more than once on class {class_name}")]
    DuplicateRelation {
        class_name: String,
        relation: String,
    },

    /// Change-set requested before the first shadow capture
    #[error("No relation shadow captured yet for an instance of {class_name}")]
    ShadowNotCaptured { class_name: String },

    /// Host has not materialized the requested attribute
    #[error("Attribute {field} is not loaded")]
    AttributeNotLoaded { field: String },

    /// Host data-access failure while loading a related entity
    #[error("Data access failed for relation {relation}: {message}")]
    DataAccess { relation: String, message: String },

    /// Host persistence failure
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    /// Malformed tracker configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Conversion from RelTrackError to the canonical RtError
impl From<RelTrackError> for RtError {
    fn from(err: RelTrackError) -> Self {
        let message = err.to_string();
        match err {
            RelTrackError::UnknownClass { class_name } => RtError::new(RtErrorKind::UnknownClass)
                .with_class(class_name)
                .with_message(message),

            RelTrackError::DuplicateClass { class_name } => {
                RtError::new(RtErrorKind::DuplicateClass)
                    .with_class(class_name)
                    .with_message(message)
            }

            RelTrackError::UnknownRelation {
                class_name,
                relation,
            } => RtError::new(RtErrorKind::UnknownRelation)
                .with_class(class_name)
                .with_relation(relation)
                .with_message(message),

            RelTrackError::DuplicateRelation {
                class_name,
                relation,
            } => RtError::new(RtErrorKind::DuplicateRelation)
                .with_class(class_name)
                .with_relation(relation)
                .with_message(message),

            RelTrackError::ShadowNotCaptured { class_name } => {
                RtError::new(RtErrorKind::ShadowNotCaptured)
                    .with_class(class_name)
                    .with_message(message)
            }

            RelTrackError::AttributeNotLoaded { .. } => {
                RtError::new(RtErrorKind::AttributeNotLoaded).with_message(message)
            }

            RelTrackError::DataAccess { relation, .. } => RtError::new(RtErrorKind::DataAccess)
                .with_relation(relation)
                .with_message(message),

            RelTrackError::Persistence { .. } => {
                RtError::new(RtErrorKind::Persistence).with_message(message)
            }

            RelTrackError::InvalidConfig { .. } => {
                RtError::new(RtErrorKind::InvalidConfig).with_message(message)
            }

            RelTrackError::Internal { .. } => {
                RtError::new(RtErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from toml::de::Error to RelTrackError
impl From<toml::de::Error> for RelTrackError {
    fn from(err: toml::de::Error) -> Self {
        RelTrackError::InvalidConfig {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for RtError {
    fn from(err: toml::de::Error) -> Self {
        RelTrackError::from(err).into()
    }
}
