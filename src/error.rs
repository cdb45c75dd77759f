use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use model::RepositoryError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::password::PasswordError;
use crate::schemas::{ErrorResponse, FieldError};

/// Every failure a handler can report, mapped onto one HTTP status each.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("full authentication is required to access this resource")]
    Unauthenticated,

    #[error("invalid credentials")]
    InvalidCredentials { last_username: String },

    #[error("access denied, {0} required")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error("database error: {0}")]
    Database(DbErr),

    #[error(transparent)]
    Password(#[from] PasswordError),

    /// A code path the routing layer should never let through.
    #[error("{0}")]
    Misconfigured(&'static str),
}

impl ApiError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound(what.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InvalidBody(rejection) => rejection.status(),
            ApiError::Unauthenticated | ApiError::InvalidCredentials { .. } => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) | ApiError::Repository(RepositoryError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Repository(_)
            | ApiError::Database(_)
            | ApiError::Password(_)
            | ApiError::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::InvalidBody(_) => "INVALID_BODY",
            ApiError::Unauthenticated => "UNAUTHENTICATED",
            ApiError::InvalidCredentials { .. } => "INVALID_CREDENTIALS",
            ApiError::Forbidden(_) => "ACCESS_DENIED",
            ApiError::NotFound(_) | ApiError::Repository(RepositoryError::NotFound { .. }) => {
                "NOT_FOUND"
            }
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Repository(RepositoryError::UnsupportedUser(_)) => "UNSUPPORTED_USER",
            ApiError::Repository(RepositoryError::Database(_)) | ApiError::Database(_) => {
                "DATABASE_ERROR"
            }
            ApiError::Password(_) => "INTERNAL_ERROR",
            ApiError::Misconfigured(_) => "MISCONFIGURED",
        }
    }

    /// Message exposed to clients. Server-side failures stay opaque.
    fn public_message(&self) -> String {
        match self {
            ApiError::Repository(RepositoryError::Database(_)) | ApiError::Database(_) => {
                "Internal server error while accessing the database".to_string()
            }
            ApiError::Password(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                ApiError::Conflict(format!("unique constraint violated: {detail}"))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                ApiError::validation("relation", format!("referenced row does not exist: {detail}"))
            }
            _ => ApiError::Database(err),
        }
    }
}

// Database failures get the same classification whether or not they went
// through a repository.
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(db) => ApiError::from(db),
            other => ApiError::Repository(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.code(), "Request failed: {}", self);
        } else {
            warn!(code = self.code(), "Request rejected: {}", self);
        }

        let (details, last_username) = match &self {
            ApiError::Validation(details) => (details.clone(), None),
            ApiError::InvalidBody(rejection) => {
                (vec![FieldError::new("body", rejection.body_text())], None)
            }
            ApiError::InvalidCredentials { last_username } => {
                (Vec::new(), Some(last_username.clone()))
            }
            _ => (Vec::new(), None),
        };

        let body = ErrorResponse {
            error: self.public_message(),
            code: self.code().to_string(),
            success: false,
            details,
            last_username,
        };
        (status, Json(body)).into_response()
    }
}
