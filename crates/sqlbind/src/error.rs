//! Error types for sqlbind

use std::time::Duration;
use thiserror::Error;

/// Result type alias for sqlbind operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for placeholder binding and database operations
#[derive(Debug, Error)]
pub enum DbError {
    /// Placeholder/argument mismatch, detected before any driver call
    #[error("SQL binding error: {0}")]
    Bind(String),

    /// Affected-row count mismatch reported by `sized_execute`
    #[error("expected {expected} affected row(s), got {actual}")]
    Assertion {
        /// Count the caller asserted
        expected: u64,
        /// Count the driver reported
        actual: u64,
    },

    /// Database connection error
    #[error("connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("check constraint violation: {0}")]
    CheckViolation(String),

    /// Column decode error
    #[error("decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A driver failure annotated with the rewritten SQL and the bound
    /// argument count. Argument values are never captured here.
    #[error("statement failed ({param_count} params): {sql}: {source}")]
    Statement {
        sql: String,
        param_count: usize,
        #[source]
        source: Box<DbError>,
    },

    /// Query timeout error
    #[error("query timeout after {0:?}")]
    Timeout(Duration),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("pool error: {0}")]
    Pool(String),
}

impl DbError {
    /// Create a binding error
    pub fn bind(message: impl Into<String>) -> Self {
        Self::Bind(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a binding error (bad placeholder usage or arguments)
    pub fn is_bind(&self) -> bool {
        matches!(self, Self::Bind(_))
    }

    /// Check if this is a `sized_execute` assertion failure
    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion { .. })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Parse a tokio_postgres error into a more specific DbError
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

    /// Attach statement context to a driver-side error.
    ///
    /// Binding, assertion and timeout errors pass through untouched so
    /// callers can branch on the original kind.
    pub(crate) fn in_statement(self, sql: &str, param_count: usize) -> Self {
        match self {
            e @ (Self::Bind(_) | Self::Assertion { .. } | Self::Timeout(_)) => e,
            source => Self::Statement {
                sql: sql.to_string(),
                param_count,
                source: Box::new(source),
            },
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for DbError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_and_assertion_are_distinct_kinds() {
        let bind = DbError::bind("no argument supplied for placeholder '@id'");
        assert!(bind.is_bind());
        assert!(!bind.is_assertion());

        let assertion = DbError::Assertion {
            expected: 1,
            actual: 2,
        };
        assert!(assertion.is_assertion());
        assert!(!assertion.is_bind());
    }

    #[test]
    fn statement_context_skips_bind_errors() {
        let wrapped = DbError::bind("bad token").in_statement("SELECT 1", 0);
        assert!(wrapped.is_bind());
    }

    #[test]
    fn statement_context_skips_timeouts() {
        let wrapped = DbError::Timeout(Duration::from_secs(1)).in_statement("SELECT 1", 0);
        assert!(wrapped.is_timeout());
    }

    #[test]
    fn statement_context_wraps_driver_errors() {
        let wrapped =
            DbError::Connection("refused".to_string()).in_statement("SELECT $1", 1);
        match wrapped {
            DbError::Statement {
                sql, param_count, ..
            } => {
                assert_eq!(sql, "SELECT $1");
                assert_eq!(param_count, 1);
            }
            other => panic!("expected Statement, got {other:?}"),
        }
    }
}
