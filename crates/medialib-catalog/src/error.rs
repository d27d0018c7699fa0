//! Error types for catalog operations.

use medialib_sql::SqlError;
use thiserror::Error;

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error type for catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Statement construction, execution or connection failure
    #[error(transparent)]
    Sql(#[from] SqlError),

    /// The record clashes with an existing one (duplicate tag name, reused path)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input rejected before any SQL was built
    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl CatalogError {
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// True for a missing record, whether reported by the catalog or the driver.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Sql(err) => err.is_not_found(),
            _ => false,
        }
    }
}
