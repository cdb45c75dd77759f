use sea_orm::DbErr;
use thiserror::Error;

/// Errors raised by the repository helpers of the entity modules.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    /// The identity handed to a password-aware repository is not a stored user.
    #[error("instances of \"{0}\" are not supported")]
    UnsupportedUser(&'static str),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
}
