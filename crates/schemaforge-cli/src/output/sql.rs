//! SQL script output: the statements exactly as they would be executed.

use crate::plan::Plan;
use schemaforge_core::ExecutorConfig;
use std::fmt::Write;

/// Format the plan as a runnable script.
///
/// With `drop_existing`, DROP statements for every planned table come first,
/// referencing tables before the tables they reference.
pub fn format_sql(plan: &Plan, config: &ExecutorConfig, drop_existing: bool) -> String {
    let mut out = String::new();

    if let Some(scripts) = &plan.scripts {
        writeln!(
            out,
            "-- vendor scripts for {} replace the statements below",
            scripts.kind
        )
        .unwrap();
        for path in scripts.drop.iter().chain(&scripts.create) {
            writeln!(out, "--   {}", path.display()).unwrap();
        }
        writeln!(out).unwrap();
    }

    if drop_existing && !plan.drop_order.is_empty() {
        for table in &plan.drop_order {
            writeln!(out, "{};", config.drop_sql(table)).unwrap();
        }
        writeln!(out).unwrap();
    }

    for statement in &plan.statements {
        writeln!(out, "{};", config.prepare_create(statement.text())).unwrap();
        for index in statement.index_statements() {
            writeln!(out, "{index};").unwrap();
        }
        writeln!(out).unwrap();
    }

    out
}
