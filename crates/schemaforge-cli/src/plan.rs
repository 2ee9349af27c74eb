//! Turning loaded inputs into an ordered plan, and applying it.

use crate::input::Inputs;
use schemaforge_core::{
    order_statements, AutoCommitScope, CreateReport, CreateStatement, DataSource, DatabaseKind,
    DdlError, DdlExecutor, ExecutorConfig, Issue, IssueCount, LoadedScripts,
    NoTransactionManager, SchemaModel, SchemaModelBuilder, SchemaTracker, ScriptReport, ScriptSet,
    TypeNameMap,
};
use serde::Serialize;
use tracing::info;

/// CREATE statements in creation order, with everything learned on the way.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub database: DatabaseKind,
    pub statements: Vec<CreateStatement>,
    /// Referencing tables first.
    pub drop_order: Vec<String>,
    /// Ordering passes needed after the immediate emissions.
    pub passes: usize,
    /// Vendor scripts that replace the generated statements when applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts: Option<ScriptSet>,
    pub issues: Vec<Issue>,
    pub summary: IssueCount,
}

impl Plan {
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }
}

/// Model every repository on top of `existing`, add the DDL statements, and
/// order the lot.
///
/// Repositories are built in the order given against one cumulative model,
/// so a repository can reference tables of the repositories before it.
pub fn build_plan(
    inputs: Inputs,
    existing: SchemaModel,
    database: DatabaseKind,
    type_names: &TypeNameMap,
) -> Result<Plan, DdlError> {
    let tracker = SchemaTracker::new();
    let builder = SchemaModelBuilder::new(&tracker, type_names);

    let mut model = existing;
    let mut statements = Vec::new();
    let mut issues = inputs.issues;

    for repository in &inputs.repositories {
        let build = builder.build(repository, model)?;
        statements.extend(build.create_statements(database));
        issues.extend(build.issues);
        model = build.model;
    }
    statements.extend(inputs.statements);

    let ordered = order_statements(statements)?;
    let drop_order = ordered.drop_order();
    issues.extend(ordered.issues);

    info!(
        statements = ordered.statements.len(),
        passes = ordered.passes,
        "plan ready"
    );
    Ok(Plan {
        database,
        statements: ordered.statements,
        drop_order,
        passes: ordered.passes,
        scripts: None,
        summary: IssueCount::from_issues(&issues),
        issues,
    })
}

/// What applying a plan did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ApplyReport {
    Generated(CreateReport),
    Scripts(ScriptReport),
}

impl ApplyReport {
    pub fn any_created(&self) -> bool {
        match self {
            Self::Generated(report) => report.any_created(),
            Self::Scripts(report) => report.any_created(),
        }
    }

    /// Statements that failed and were tolerated. Drop-script failures are
    /// not counted; the tables usually did not exist.
    pub fn has_failures(&self) -> bool {
        match self {
            Self::Generated(report) => {
                !report.failed.is_empty() || !report.failed_indexes.is_empty()
            }
            Self::Scripts(report) => !report.failed.is_empty(),
        }
    }
}

/// How [`apply_plan`] runs.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub executor: ExecutorConfig,
    pub drop_existing: bool,
    pub tolerate_script_errors: bool,
}

/// Execute `plan` on a fresh auto-commit connection from `data_source`.
///
/// `scripts`, when given, runs instead of the generated statements.
pub fn apply_plan<D: DataSource + ?Sized>(
    plan: &Plan,
    scripts: Option<&LoadedScripts>,
    data_source: &D,
    options: &ApplyOptions,
) -> Result<ApplyReport, DdlError> {
    AutoCommitScope::new(data_source, &NoTransactionManager).run(|connection| {
        let mut executor = DdlExecutor::new(connection, options.executor.clone());
        match scripts {
            Some(scripts) => executor
                .run_scripts(scripts, options.tolerate_script_errors)
                .map(ApplyReport::Scripts),
            None => executor
                .create_tables(&plan.statements, options.drop_existing)
                .map(ApplyReport::Generated),
        }
    })
}
