//! Diagnostics shared by every stage of a schema build.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A non-fatal diagnostic produced while modeling, ordering, or executing DDL.
///
/// Fatal conditions are returned as [`crate::DdlError`]; everything that lets
/// the build continue is collected as an `Issue` and handed back next to the
/// successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Severity level
    pub severity: Severity,

    /// Machine-readable issue code
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Optional: table the issue relates to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

impl Issue {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            table: None,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            table: None,
        }
    }

    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            code: code.into(),
            message: message.into(),
            table: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Counts of issues by severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct IssueCount {
    /// Number of error-level issues
    pub errors: usize,
    /// Number of warning-level issues
    pub warnings: usize,
    /// Number of info-level issues
    pub infos: usize,
}

impl IssueCount {
    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        issues
            .into_iter()
            .fold(Self::default(), |mut count, issue| {
                match issue.severity {
                    Severity::Error => count.errors += 1,
                    Severity::Warning => count.warnings += 1,
                    Severity::Info => count.infos += 1,
                }
                count
            })
    }
}

/// Machine-readable issue codes.
pub mod issue_codes {
    pub const MISSING_TABLE_NAME: &str = "MISSING_TABLE_NAME";
    pub const DUPLICATE_TABLE: &str = "DUPLICATE_TABLE";
    pub const EXTERNAL_REFERENCE: &str = "EXTERNAL_REFERENCE";
    pub const DANGLING_REFERENCE: &str = "DANGLING_REFERENCE";
    pub const UNKNOWN_COLUMN_TYPE: &str = "UNKNOWN_COLUMN_TYPE";
    pub const SHARED_TABLE: &str = "SHARED_TABLE";
    pub const TABLE_EXISTS: &str = "TABLE_EXISTS";
    pub const STATEMENT_FAILED: &str = "STATEMENT_FAILED";
}
