//! DDL execution against a live connection.
//!
//! The executor probes for each table before touching it, so running the same
//! batch twice creates nothing the second time. Drops are retried in bounded
//! passes: a DROP that fails because another table still references the
//! target is deferred to the next pass, and only a failure that survives the
//! last pass is reported.

mod config;
mod connection;
mod scripts;

pub use config::ExecutorConfig;
pub use connection::{Connection, DataSource, TransactionManager};
pub use scripts::{
    resolve_placeholders, LoadedScripts, Script, ScriptMappingConfig, ScriptSet, VendorScripts,
};

use crate::error::{DdlError, DdlOperation, DriverError};
use crate::statement::{strip_trailing_semicolon, CreateStatement};
use crate::types::{issue_codes, Issue};
use regex::{Captures, Regex};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Outcome of [`DdlExecutor::create_tables`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReport {
    pub created: Vec<String>,
    /// Tables that already existed.
    pub skipped: Vec<String>,
    /// Tables dropped before creation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped: Vec<String>,
    /// Tables whose CREATE failed under `continue_on_error`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
    /// Index statements that failed under `continue_on_error`. Their tables
    /// were created and are listed in `created`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_indexes: Vec<String>,
    pub issues: Vec<Issue>,
}

impl CreateReport {
    /// Whether any table was created, i.e. whether initial data should be
    /// imported.
    pub fn any_created(&self) -> bool {
        !self.created.is_empty()
    }
}

/// Outcome of [`DdlExecutor::drop_tables`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DropReport {
    pub dropped: Vec<String>,
    /// Tables that did not exist.
    pub skipped: Vec<String>,
    pub passes: usize,
}

/// A script statement that failed and was tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptFailure {
    pub path: PathBuf,
    pub statement: String,
    pub message: String,
}

/// Outcome of [`DdlExecutor::run_scripts`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptReport {
    pub dropped: usize,
    pub created: usize,
    /// Drop statements that failed on every pass, usually because the
    /// table did not exist yet.
    pub drop_failures: Vec<ScriptFailure>,
    /// Create statements that failed under `tolerate_errors`.
    pub failed: Vec<ScriptFailure>,
}

impl ScriptReport {
    pub fn any_created(&self) -> bool {
        self.created > 0
    }
}

/// Items that still failed after the last retry pass, with the statement and
/// error of their final attempt.
struct RetryOutcome<T> {
    done: Vec<T>,
    outstanding: Vec<(T, String, DriverError)>,
    passes: usize,
}

/// Execute one statement per item, deferring failures to later passes.
///
/// At most `items.len()` passes are made, which is enough for any order of a
/// dependency chain: every pass succeeds on at least the items nothing else
/// depends on.
fn execute_with_retry<T>(
    connection: &mut dyn Connection,
    items: Vec<T>,
    describe: impl Fn(&T) -> String,
    statement_for: impl Fn(&T) -> String,
) -> RetryOutcome<T> {
    let max_passes = items.len();
    let mut pending = items;
    let mut outcome = RetryOutcome {
        done: Vec::new(),
        outstanding: Vec::new(),
        passes: 0,
    };

    while !pending.is_empty() && outcome.passes < max_passes {
        outcome.passes += 1;
        let mut failed = Vec::new();

        for item in pending {
            let statement = statement_for(&item);
            match connection.execute(&statement) {
                Ok(()) => outcome.done.push(item),
                Err(err) => {
                    debug!(
                        pass = outcome.passes,
                        item = %describe(&item),
                        error = %err,
                        "deferring statement to the next pass"
                    );
                    failed.push((item, statement, err));
                }
            }
        }

        if failed.is_empty() || outcome.passes == max_passes {
            outcome.outstanding = failed;
            break;
        }
        pending = failed.into_iter().map(|(item, _, _)| item).collect();
    }

    outcome
}

fn nullable_regex() -> &'static Regex {
    static NULLABLE: OnceLock<Regex> = OnceLock::new();
    NULLABLE.get_or_init(|| {
        Regex::new(r"(?i)(\b(?:NOT|DEFAULT|IS))?\s+NULL\b").expect("Invalid regex pattern")
    })
}

/// Drop bare `NULL` column constraints, keeping `NOT NULL` and `DEFAULT NULL`.
pub(crate) fn remove_null_tokens(sql: &str) -> String {
    nullable_regex()
        .replace_all(sql, |caps: &Captures<'_>| {
            if caps.get(1).is_some() {
                caps[0].to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

/// Runs CREATE and DROP statements over one connection.
pub struct DdlExecutor<'c> {
    connection: &'c mut dyn Connection,
    config: ExecutorConfig,
}

impl<'c> DdlExecutor<'c> {
    pub fn new(connection: &'c mut dyn Connection, config: ExecutorConfig) -> Self {
        Self { connection, config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Whether a query against `table` succeeds.
    ///
    /// Any error counts as "missing": catalog queries are not reliable on
    /// every database before the first table exists.
    pub fn table_exists(&mut self, table: &str) -> bool {
        let probe = self.config.probe_sql(table);
        match self.connection.execute(&probe) {
            Ok(()) => true,
            Err(err) => {
                debug!(table, error = %err, "existence probe failed; treating table as missing");
                false
            }
        }
    }

    /// Create every missing table in `statements`, in the given order.
    ///
    /// With `drop_existing_first`, all tables in the batch are dropped first
    /// in reverse order, and a drop failure that persists aborts the call
    /// before anything is created.
    pub fn create_tables(
        &mut self,
        statements: &[CreateStatement],
        drop_existing_first: bool,
    ) -> Result<CreateReport, DdlError> {
        let mut report = CreateReport::default();

        if drop_existing_first {
            let names: Vec<String> = statements
                .iter()
                .rev()
                .map(|statement| statement.table_name().to_string())
                .collect();
            report.dropped = self.drop_tables(&names)?.dropped;
        }

        for statement in statements {
            let table = statement.table_name();
            if self.table_exists(table) {
                info!(table, "table already exists; skipping");
                report.issues.push(
                    Issue::info(issue_codes::TABLE_EXISTS, format!("Table {table} already exists"))
                        .with_table(table),
                );
                report.skipped.push(table.to_string());
                continue;
            }

            match self.create_table(statement) {
                Ok(()) => {
                    info!(table, "created table");
                    report.created.push(table.to_string());
                }
                Err(err) if self.config.continue_on_error => {
                    warn!(table, error = %err, "CREATE failed; continuing");
                    report.issues.push(
                        Issue::error(issue_codes::STATEMENT_FAILED, err.to_string())
                            .with_table(table),
                    );
                    report.failed.push(table.to_string());
                    continue;
                }
                Err(err) => return Err(err),
            }

            for index in statement.index_statements() {
                match self.create_index(table, index) {
                    Ok(()) => {}
                    Err(err) if self.config.continue_on_error => {
                        warn!(table, error = %err, "CREATE INDEX failed; continuing");
                        report.issues.push(
                            Issue::error(issue_codes::STATEMENT_FAILED, err.to_string())
                                .with_table(table),
                        );
                        report
                            .failed_indexes
                            .push(strip_trailing_semicolon(index).trim().to_string());
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            failed_indexes = report.failed_indexes.len(),
            "create pass finished"
        );
        Ok(report)
    }

    fn create_table(&mut self, statement: &CreateStatement) -> Result<(), DdlError> {
        let sql = self.prepare_create(statement.text());
        self.connection
            .execute(&sql)
            .map_err(|source| DdlError::Execution {
                operation: DdlOperation::Create,
                table: statement.table_name().to_string(),
                statement: sql.clone(),
                source,
            })
    }

    fn create_index(&mut self, table: &str, index: &str) -> Result<(), DdlError> {
        let index = strip_trailing_semicolon(index).trim();
        self.connection
            .execute(index)
            .map_err(|source| DdlError::Execution {
                operation: DdlOperation::CreateIndex,
                table: table.to_string(),
                statement: index.to_string(),
                source,
            })
    }

    /// Apply the configured textual fix-ups to a CREATE statement.
    pub fn prepare_create(&self, text: &str) -> String {
        self.config.prepare_create(text)
    }

    /// Drop every existing table in `names`, retrying in bounded passes.
    ///
    /// Names should be given referencing tables first; any other order still
    /// converges within `names.len()` passes.
    pub fn drop_tables(&mut self, names: &[String]) -> Result<DropReport, DdlError> {
        let mut report = DropReport::default();
        let mut pending = Vec::new();
        for name in names {
            if self.table_exists(name) {
                pending.push(name.clone());
            } else {
                debug!(table = %name, "table does not exist; nothing to drop");
                report.skipped.push(name.clone());
            }
        }

        let config = &self.config;
        let outcome = execute_with_retry(
            &mut *self.connection,
            pending,
            |name| name.clone(),
            |name| config.drop_sql(name),
        );
        report.passes = outcome.passes;
        report.dropped = outcome.done;

        let mut outstanding = outcome.outstanding.into_iter();
        if let Some((table, statement, source)) = outstanding.next() {
            for (other, _, err) in outstanding {
                warn!(table = %other, error = %err, "table could not be dropped");
            }
            return Err(DdlError::Execution {
                operation: DdlOperation::Drop,
                table,
                statement,
                source,
            });
        }

        info!(dropped = report.dropped.len(), passes = report.passes, "drop pass finished");
        Ok(report)
    }

    /// Run vendor scripts: drop scripts first, then create scripts.
    ///
    /// Drop statements are retried in bounded passes because their order is
    /// unknown; ones that still fail are recorded, since the tables usually
    /// just do not exist yet. Create statements run once each, and a failure
    /// is fatal unless `tolerate_errors` is set.
    pub fn run_scripts(
        &mut self,
        scripts: &LoadedScripts,
        tolerate_errors: bool,
    ) -> Result<ScriptReport, DdlError> {
        let mut report = ScriptReport::default();

        let drops: Vec<(&Path, &str)> = scripts
            .drop
            .iter()
            .flat_map(|script| {
                script
                    .statements
                    .iter()
                    .map(move |statement| (script.path.as_path(), statement.as_str()))
            })
            .collect();

        let outcome = execute_with_retry(
            &mut *self.connection,
            drops,
            |(path, _)| path.display().to_string(),
            |(_, statement)| statement.to_string(),
        );
        report.dropped = outcome.done.len();
        for ((path, _), statement, err) in outcome.outstanding {
            warn!(path = %path.display(), error = %err, "drop script statement failed");
            report.drop_failures.push(ScriptFailure {
                path: path.to_path_buf(),
                statement,
                message: err.to_string(),
            });
        }

        for script in &scripts.create {
            for statement in &script.statements {
                match self.connection.execute(statement) {
                    Ok(()) => report.created += 1,
                    Err(err) if tolerate_errors => {
                        warn!(path = %script.path.display(), error = %err, "script statement failed; continuing");
                        report.failed.push(ScriptFailure {
                            path: script.path.clone(),
                            statement: statement.clone(),
                            message: err.to_string(),
                        });
                    }
                    Err(source) => {
                        return Err(DdlError::ScriptExecution {
                            path: script.path.clone(),
                            statement: statement.clone(),
                            source,
                        })
                    }
                }
            }
        }

        info!(
            dropped = report.dropped,
            created = report.created,
            drop_failures = report.drop_failures.len(),
            failed = report.failed.len(),
            "vendor scripts finished"
        );
        Ok(report)
    }
}
