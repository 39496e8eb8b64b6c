//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! at port boundaries via `From`.

/// Base error type shared by the domain, application, and adapter layers.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A referenced object does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// An integration failed to talk to its backing device or service.
    #[error("integration error")]
    Integration(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A required name was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// An entity id string was empty.
    #[error("entity_id must not be empty")]
    EmptyEntityId,

    /// An entity id string did not follow the `<domain>.<object_id>` shape.
    #[error("entity_id {0:?} must have the form <domain>.<object_id>")]
    MalformedEntityId(String),

    /// A required field was missing from service-call data.
    #[error("missing field {0}")]
    MissingField(&'static str),

    /// A numeric field was outside its accepted range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
        /// Value received.
        value: i64,
    },

    /// A field held a value outside its accepted set.
    #[error("invalid {field} {value:?}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Value received.
        value: String,
    },

    /// Service-call data could not be decoded.
    #[error("invalid service data")]
    InvalidServiceData(#[source] serde_json::Error),

    /// The service name is not handled by the target entity.
    #[error("unsupported service {0:?}")]
    UnsupportedService(String),

    /// The media type of a play request is not supported.
    #[error("unsupported media type {0:?}")]
    UnsupportedMediaType(String),

    /// A media id that must be numeric was not.
    #[error("media id {0:?} is not numeric")]
    NonNumericMediaId(String),
}

/// Lookup failure for a typed object.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of object looked up (e.g. `"Entity"`, `"Source"`).
    pub entity: &'static str,
    /// Identifier that was not found.
    pub id: String,
}
