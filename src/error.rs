use serde_json::Value;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RepoError>;

/// Errors surfaced by the graph repository and the flat entity repository.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepoError {
    /// A requested id has no record.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Which kind of record was requested ("node", "entity").
        entity: &'static str,
        /// The id that failed to resolve.
        id: String,
    },
    /// Malformed input: bad selector shape, bad operator object, dangling
    /// node ref, unknown relation name, and so on.
    #[error("invalid input at {path}: expected {expected}, got {received}")]
    Validation {
        /// Where in the input document the offending value sits.
        path: String,
        /// What the engine expected to find there.
        expected: &'static str,
        /// The received value, rendered as JSON.
        received: String,
    },
    /// A query operator key outside the recognised set.
    #[error("unsupported query operator '{0}'")]
    NotImplemented(String),
    /// Duplicate id on insert, when the flat repository is configured to
    /// reject duplicates.
    #[error("entity '{0}' already exists")]
    AlreadyExists(String),
}

impl RepoError {
    /// Builds a [`RepoError::NotFound`] for the given record kind and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        RepoError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Builds a [`RepoError::Validation`] at `path`, rendering the received
    /// value as compact JSON.
    pub fn validation(path: impl Into<String>, expected: &'static str, received: &Value) -> Self {
        RepoError::Validation {
            path: path.into(),
            expected,
            received: received.to_string(),
        }
    }

    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            RepoError::NotFound { .. } => "NotFound",
            RepoError::Validation { .. } => "Validation",
            RepoError::NotImplemented(_) => "NotImplemented",
            RepoError::AlreadyExists(_) => "AlreadyExists",
        }
    }
}
