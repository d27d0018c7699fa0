//! Error types for medialib-sql

use thiserror::Error;

/// Result type alias for statement building and execution
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised while building, rendering or executing statements
#[derive(Debug, Error)]
pub enum SqlError {
    /// Invalid table name, identifier or builder state
    #[error("Construction error: {0}")]
    Construction(String),

    /// A VALUES row whose length differs from the column list
    #[error("Row arity mismatch on '{table}': expected {expected} values, got {got}")]
    RowArity {
        table: String,
        expected: usize,
        got: usize,
    },

    /// INSERT rendered without any rows
    #[error("Empty insert: no rows supplied for '{table}'")]
    EmptyInsert { table: String },

    /// DELETE/UPDATE rendered without a WHERE predicate
    #[error("Missing WHERE: refusing unconditional {kind} on '{table}'")]
    MissingWhere { kind: &'static str, table: String },

    /// Template/argument mismatch during substitution
    #[error("Format error: {0}")]
    Format(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Invalid or missing configuration
    #[error("Config error: {0}")]
    Config(String),
}

impl SqlError {
    /// Create a construction error
    pub fn construction(message: impl Into<String>) -> Self {
        Self::Construction(message.into())
    }

    /// Create a format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Invalid construction, including row/column arity mismatches.
    pub fn is_construction(&self) -> bool {
        matches!(self, Self::Construction(_) | Self::RowArity { .. })
    }

    /// Check if this is the unconditional DELETE/UPDATE guard
    pub fn is_missing_where(&self) -> bool {
        matches!(self, Self::MissingWhere { .. })
    }

    /// Check if this is an empty insert
    pub fn is_empty_insert(&self) -> bool {
        matches!(self, Self::EmptyInsert { .. })
    }

    /// Check if this is a template formatting error
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Parse a tokio_postgres error into a more specific SqlError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for SqlError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
