use super::remove_null_tokens;
use crate::statement::{strip_constraints, strip_trailing_semicolon};
use crate::types::DatabaseKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Statement shapes and failure policy for [`super::DdlExecutor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Prefix of the existence probe; the table name is appended.
    pub probe_prefix: String,

    /// Prefix of the DROP statement; the table name is appended.
    pub drop_prefix: String,

    /// Append `CASCADE CONSTRAINTS` to every DROP.
    pub cascade_constraints: bool,

    /// Record failed CREATE statements and keep going instead of aborting.
    pub continue_on_error: bool,

    /// Remove foreign-key clauses before executing CREATE statements.
    pub strip_foreign_keys: bool,

    /// Target database, for vendor fix-ups.
    pub database: DatabaseKind,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            probe_prefix: "SELECT count(*) from".to_string(),
            drop_prefix: "DROP TABLE".to_string(),
            cascade_constraints: false,
            continue_on_error: false,
            strip_foreign_keys: false,
            database: DatabaseKind::Default,
        }
    }
}

impl ExecutorConfig {
    pub fn for_database(database: DatabaseKind) -> Self {
        Self {
            database,
            ..Self::default()
        }
    }

    pub fn probe_sql(&self, table: &str) -> String {
        format!("{} {table}", self.probe_prefix.trim_end())
    }

    pub fn drop_sql(&self, table: &str) -> String {
        let mut sql = format!("{} {table}", self.drop_prefix.trim_end());
        if self.cascade_constraints {
            sql.push_str(" CASCADE CONSTRAINTS");
        }
        sql
    }

    /// Statement text as it will be executed: trailing `;` removed, foreign
    /// keys stripped when configured, bare `NULL` constraints removed for DB2.
    pub fn prepare_create(&self, text: &str) -> String {
        let mut sql = strip_trailing_semicolon(text).trim().to_string();
        if self.strip_foreign_keys {
            sql = strip_constraints(&sql);
        }
        if self.database == DatabaseKind::Db2 {
            sql = remove_null_tokens(&sql);
        }
        sql
    }
}
