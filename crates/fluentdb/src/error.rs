//! Error types for fluentdb

use crate::dialect::Dialect;
use thiserror::Error;

/// Result type alias for fluentdb operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for query building and execution
#[derive(Debug, Error)]
pub enum DbError {
    /// Connection requested with a driver other than mysql/postgres
    #[error("Driver {driver} not supported")]
    UnsupportedDriver { driver: String },

    /// The underlying connection attempt failed
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Operator outside the active dialect's whitelist
    #[error("Operator {operator} not supported for {dialect}")]
    UnsupportedOperator { operator: String, dialect: String },

    /// ORDER BY direction other than ASC/DESC
    #[error("Direction {direction} not supported")]
    UnsupportedDirection { direction: String },

    /// LIMIT/OFFSET given a negative or non-numeric value
    #[error("{clause} must be a non-negative integer, got '{value}'")]
    InvalidLimitOffset { clause: &'static str, value: String },

    /// Builder run on a connection of another dialect
    #[error("Builder for {builder} cannot run on a {connection} connection")]
    DialectMismatch { builder: Dialect, connection: Dialect },

    /// Compilation attempted without a table or FROM identifier
    #[error("Table not yet defined")]
    MissingTable,

    /// UPDATE attempted without any WHERE clause
    #[error("Where clause is not defined for UPDATE on '{table}'")]
    MissingWhereClause { table: String },

    /// A `:key` placeholder in SQL text has no registered value
    #[error("No value bound for placeholder ':{key}'")]
    UnboundPlaceholder { key: String },

    /// A value cannot be rendered for the given operator
    #[error("Invalid value for column '{column}': {message}")]
    InvalidValue { column: String, message: String },

    /// Insert row whose columns differ from the first row
    #[error("Insert row {index} does not match the first row: {message}")]
    MismatchedRow { index: usize, message: String },

    /// Postgres driver error
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// MySQL driver error
    #[error("MySQL error: {0}")]
    Mysql(#[from] sqlx::Error),

    /// Row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Expected row or field missing from a result
    #[error("Not found: {0}")]
    NotFound(String),
}

impl DbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this is an unsupported operator error
    pub fn is_unsupported_operator(&self) -> bool {
        matches!(self, Self::UnsupportedOperator { .. })
    }

    /// Check if this is an unsupported direction error
    pub fn is_unsupported_direction(&self) -> bool {
        matches!(self, Self::UnsupportedDirection { .. })
    }

    /// Check if this is an invalid limit/offset error
    pub fn is_invalid_limit_offset(&self) -> bool {
        matches!(self, Self::InvalidLimitOffset { .. })
    }

    /// Check if this is a dialect mismatch error
    pub fn is_dialect_mismatch(&self) -> bool {
        matches!(self, Self::DialectMismatch { .. })
    }

    /// Check if this is a missing WHERE clause error
    pub fn is_missing_where_clause(&self) -> bool {
        matches!(self, Self::MissingWhereClause { .. })
    }
}
