use hotel_core::error::CoreError;

/// Errors returned by storage backends and repositories.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A domain-level error (validation, not found, nothing to update).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A unique column already holds the value (in-memory backend).
    #[error("Duplicate value for {entity}.{column}")]
    Duplicate {
        entity: &'static str,
        column: &'static str,
    },
}

pub type DbResult<T> = Result<T, DbError>;

impl From<validator::ValidationErrors> for DbError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DbError::Core(CoreError::InvalidRequest(errors.to_string()))
    }
}
