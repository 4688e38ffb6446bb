use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde::Serialize;
use thiserror::Error;
use trivia_collab::{AuthError, CollabError, DatabaseError};
use utoipa::ToSchema;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// The details are logged, never sent to the client
    #[error("Internal server error")]
    Internal(String),
}

/// The body of every error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "Invalid credentials")]
    pub error: String,
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let Self::Internal(detail) = &self {
            error!("Request failed: {}", detail);
        }

        let body = ErrorBody {
            error: self.to_string(),
        };

        (self.as_status_code(), Json(body)).into_response()
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            // Callers must not be able to tell which of the two failed
            AuthError::InvalidCredentials | AuthError::UserNotFound => {
                Self::unauthorized("Invalid credentials")
            }
            AuthError::InvalidToken => Self::unauthorized("Invalid or expired token"),
            e @ AuthError::UsernameTaken(_) => Self::Conflict(e.to_string()),
            AuthError::Db(e) => e.into(),
            e @ AuthError::HashError(_) => Self::Internal(e.to_string()),
        }
    }
}

impl From<CollabError> for ServerError {
    fn from(value: CollabError) -> Self {
        match value {
            CollabError::Validation(message) => Self::BadRequest(message),
            CollabError::Forbidden(message) => Self::Forbidden(message),
            e @ CollabError::NotFound { .. } => Self::NotFound(e.to_string()),
            CollabError::Conflict(message) | CollabError::InvalidState(message) => {
                Self::Conflict(message)
            }
            CollabError::Dependency(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        CollabError::from(value).into()
    }
}
