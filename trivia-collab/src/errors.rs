use thiserror::Error;

use crate::DatabaseError;

pub type CollabResult<T> = Result<T, CollabError>;

/// Errors returned by the collab services
#[derive(Debug, Error)]
pub enum CollabError {
    /// The input was rejected
    #[error("{0}")]
    Validation(String),
    /// The user is not allowed to act on the resource
    #[error("{0}")]
    Forbidden(String),
    #[error("{resource} not found")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    /// The resource already exists
    #[error("{0}")]
    Conflict(String),
    /// The resource is in a state that doesn't allow the operation
    #[error("{0}")]
    InvalidState(String),
    /// The store or something else outside of our control failed
    #[error(transparent)]
    Dependency(Box<dyn std::error::Error + Send + Sync>),
}

impl CollabError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub fn not_found(resource: &'static str, identifier: &'static str) -> Self {
        Self::NotFound {
            resource,
            identifier,
        }
    }
}

impl From<DatabaseError> for CollabError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            e @ DatabaseError::Conflict { .. } => Self::Conflict(e.to_string()),
            DatabaseError::Internal(e) => Self::Dependency(e),
        }
    }
}
