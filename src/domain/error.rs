//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::ObjectId;

/// Domain errors represent content or derivation rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid object definition: {message}")]
    InvalidObject { message: String },

    #[error("duplicate object id: {0}")]
    DuplicateObject(ObjectId),

    #[error("unknown object id: {0}")]
    UnknownObject(ObjectId),

    #[error("invalid category definition {path}: {message}")]
    InvalidCategory { path: String, message: String },

    #[error("recipe cycle detected at object: {0}")]
    RecipeCycle(ObjectId),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
