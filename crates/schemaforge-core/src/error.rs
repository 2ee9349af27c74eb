//! Error types for schema modeling, ordering, and DDL execution.
//!
//! # Error Handling Strategy
//!
//! Like the rest of the crate, errors come in two flavors:
//!
//! - [`DdlError`]: the requested operation cannot be satisfied (ordering never
//!   converges, a script mapping is inconsistent, the database rejected a
//!   statement). Returned as `Result<T, DdlError>`; callers are expected to
//!   abort the schema build.
//!
//! - [`crate::types::Issue`]: the world is not quite in the state we assumed
//!   (a table already exists, a reference points outside the batch). These are
//!   collected next to successful results and logged, never raised.
//!
//! Low-level driver failures are carried as [`DriverError`] inside the
//! variant that names the table or statement involved, so the user sees one
//! descriptive message instead of a raw driver exception.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a database driver or transaction manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    /// Driver message.
    pub message: String,
    /// SQLSTATE code, when the driver reports one.
    pub sql_state: Option<String>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sql_state: None,
        }
    }

    pub fn with_sql_state(mut self, state: impl Into<String>) -> Self {
        self.sql_state = Some(state.into());
        self
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sql_state {
            Some(state) => write!(f, "{} (SQLSTATE {state})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DriverError {}

/// DDL statement kind, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DdlOperation {
    Create,
    CreateIndex,
    Drop,
}

impl fmt::Display for DdlOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("CREATE TABLE"),
            Self::CreateIndex => f.write_str("CREATE INDEX"),
            Self::Drop => f.write_str("DROP TABLE"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DdlError {
    /// A descriptor is malformed or a table cannot be modeled.
    #[error("cannot model table {table}: {message}")]
    ModelBuild { table: String, message: String },

    /// The dependency orderer did not converge within its pass budget.
    #[error(
        "cannot order CREATE statements after {passes} passes; unresolved tables: {}",
        .unresolved.join(", ")
    )]
    Ordering {
        unresolved: Vec<String>,
        passes: usize,
    },

    /// A CREATE or DROP statement was rejected by the database.
    #[error("{operation} for table {table} failed: {source}\n  statement: {statement}")]
    Execution {
        operation: DdlOperation,
        table: String,
        statement: String,
        #[source]
        source: DriverError,
    },

    /// A vendor script mapping is internally inconsistent.
    #[error("invalid script mapping: {0}")]
    ScriptValidation(String),

    /// A vendor script could not be tokenized.
    #[error("cannot split script {}: {message}", .path.display())]
    ScriptParse { path: PathBuf, message: String },

    #[error("cannot read script {}: {source}", .path.display())]
    ScriptIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A statement from a vendor script was rejected by the database.
    #[error("script {} failed: {source}\n  statement: {statement}", .path.display())]
    ScriptExecution {
        path: PathBuf,
        statement: String,
        #[source]
        source: DriverError,
    },

    /// The ambient transaction could not be suspended.
    #[error("cannot suspend the ambient transaction: {0}")]
    TransactionScope(#[source] DriverError),

    #[error("cannot obtain a database connection: {0}")]
    Connection(#[source] DriverError),

    /// Statement text that does not name a table.
    #[error("statement does not name a table: {0}")]
    UnnamedStatement(String),
}

impl DdlError {
    /// Tables named by the error, for callers that surface them separately.
    pub fn tables(&self) -> Vec<&str> {
        match self {
            Self::ModelBuild { table, .. } | Self::Execution { table, .. } => vec![table.as_str()],
            Self::Ordering { unresolved, .. } => unresolved.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_display_includes_sql_state() {
        let err = DriverError::new("table not found").with_sql_state("42S02");
        assert_eq!(err.to_string(), "table not found (SQLSTATE 42S02)");
        assert_eq!(DriverError::new("boom").to_string(), "boom");
    }

    #[test]
    fn test_ordering_error_names_every_table() {
        let err = DdlError::Ordering {
            unresolved: vec!["a".into(), "b".into()],
            passes: 2,
        };
        assert_eq!(
            err.to_string(),
            "cannot order CREATE statements after 2 passes; unresolved tables: a, b"
        );
        assert_eq!(err.tables(), vec!["a", "b"]);
    }

    #[test]
    fn test_execution_error_names_table_and_statement() {
        let err = DdlError::Execution {
            operation: DdlOperation::Drop,
            table: "customers".into(),
            statement: "DROP TABLE customers".into(),
            source: DriverError::new("still referenced"),
        };
        let message = err.to_string();
        assert!(message.starts_with("DROP TABLE for table customers failed: still referenced"));
        assert!(message.contains("statement: DROP TABLE customers"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_trait() {
        let err = DdlError::ScriptValidation("oracle has no drop scripts".into());
        let _: &dyn std::error::Error = &err;
    }
}
