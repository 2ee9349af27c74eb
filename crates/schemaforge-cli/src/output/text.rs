//! Human-readable plan output formatting.

use crate::plan::{ApplyReport, Plan};
use owo_colors::OwoColorize;
use schemaforge_core::{CreateReport, Issue, IssueCount, ScriptFailure, ScriptReport, Severity};
use std::fmt::Write;

/// Format the plan, and what applying it did, as text with optional colors.
pub fn format_text(plan: &Plan, applied: Option<&ApplyReport>, colored: bool) -> String {
    let mut out = String::new();

    write_header(&mut out, colored);
    write_summary(&mut out, plan, colored);
    write_order(&mut out, plan, colored);
    let mut issues = plan.issues.clone();
    if let Some(report) = applied {
        write_applied(&mut out, report, colored);
        if let ApplyReport::Generated(report) = report {
            issues.extend(report.issues.iter().cloned());
        }
    }
    write_issues(&mut out, &issues, colored);

    out
}

fn heading(out: &mut String, text: &str, colored: bool) {
    if colored {
        writeln!(out, "{}", text.bold()).unwrap();
    } else {
        writeln!(out, "{text}").unwrap();
    }
}

fn write_header(out: &mut String, colored: bool) {
    let title = "Schemaforge Plan";
    let line = "═".repeat(50);

    if colored {
        writeln!(out, "{}", title.bold()).unwrap();
        writeln!(out, "{}", line.dimmed()).unwrap();
    } else {
        writeln!(out, "{title}").unwrap();
        writeln!(out, "{line}").unwrap();
    }
}

fn write_summary(out: &mut String, plan: &Plan, colored: bool) {
    let stats = format!(
        "Database: {} | {} tables | {} ordering passes",
        plan.database,
        plan.statements.len(),
        plan.passes
    );

    if colored {
        writeln!(out, "{}", stats.cyan()).unwrap();
    } else {
        writeln!(out, "{stats}").unwrap();
    }

    if let Some(scripts) = &plan.scripts {
        writeln!(
            out,
            "Vendor scripts replace generated statements: {} create, {} drop",
            scripts.create.len(),
            scripts.drop.len()
        )
        .unwrap();
    }

    writeln!(out).unwrap();
}

fn write_order(out: &mut String, plan: &Plan, colored: bool) {
    if plan.statements.is_empty() {
        writeln!(out, "No tables to create.").unwrap();
        writeln!(out).unwrap();
        return;
    }

    heading(out, "Creation order:", colored);
    let width = plan.statements.len().to_string().len();
    for (position, statement) in plan.statements.iter().enumerate() {
        let number = format!("{:>width$}.", position + 1);
        let number = if colored {
            number.dimmed().to_string()
        } else {
            number
        };

        if statement.references().is_empty() {
            writeln!(out, "  {number} {}", statement.table_name()).unwrap();
        } else {
            writeln!(
                out,
                "  {number} {} → {}",
                statement.table_name(),
                statement.references().join(", ")
            )
            .unwrap();
        }
    }
    writeln!(out).unwrap();

    heading(out, "Drop order:", colored);
    writeln!(out, "  {}", plan.drop_order.join(", ")).unwrap();
    writeln!(out).unwrap();
}

fn write_applied(out: &mut String, report: &ApplyReport, colored: bool) {
    heading(out, "Applied:", colored);
    match report {
        ApplyReport::Generated(report) => write_create_report(out, report, colored),
        ApplyReport::Scripts(report) => write_script_report(out, report, colored),
    }
    writeln!(out).unwrap();
}

fn write_list(out: &mut String, label: &str, tables: &[String]) {
    if !tables.is_empty() {
        writeln!(out, "  {label} ({}): {}", tables.len(), tables.join(", ")).unwrap();
    }
}

fn write_create_report(out: &mut String, report: &CreateReport, colored: bool) {
    write_list(out, "Dropped", &report.dropped);
    write_list(out, "Created", &report.created);
    write_list(out, "Already present", &report.skipped);
    if !report.failed.is_empty() {
        let line = format!(
            "  Failed ({}): {}",
            report.failed.len(),
            report.failed.join(", ")
        );
        if colored {
            writeln!(out, "{}", line.red()).unwrap();
        } else {
            writeln!(out, "{line}").unwrap();
        }
    }
    if !report.failed_indexes.is_empty() {
        let line = format!("  Failed indexes ({}):", report.failed_indexes.len());
        if colored {
            writeln!(out, "{}", line.red()).unwrap();
        } else {
            writeln!(out, "{line}").unwrap();
        }
        for index in &report.failed_indexes {
            writeln!(out, "    {index}").unwrap();
        }
    }
    if !report.any_created() && report.failed.is_empty() {
        writeln!(out, "  Nothing created; every table already exists.").unwrap();
    }
}

fn write_script_report(out: &mut String, report: &ScriptReport, colored: bool) {
    writeln!(
        out,
        "  Vendor scripts: {} drop and {} create statements succeeded",
        report.dropped, report.created
    )
    .unwrap();
    write_failures(out, "Drop statements skipped", &report.drop_failures, false);
    write_failures(out, "Failed", &report.failed, colored);
}

fn write_failures(out: &mut String, label: &str, failures: &[ScriptFailure], colored: bool) {
    if failures.is_empty() {
        return;
    }
    let line = format!("  {label} ({}):", failures.len());
    if colored {
        writeln!(out, "{}", line.red()).unwrap();
    } else {
        writeln!(out, "{line}").unwrap();
    }
    for failure in failures {
        writeln!(
            out,
            "    {}: {} ({})",
            failure.path.display(),
            failure.statement,
            failure.message
        )
        .unwrap();
    }
}

fn write_issues(out: &mut String, issues: &[Issue], colored: bool) {
    if issues.is_empty() {
        return;
    }

    let count = IssueCount::from_issues(issues);
    let mut parts = Vec::new();
    if count.errors > 0 {
        parts.push(format!("{} errors", count.errors));
    }
    if count.warnings > 0 {
        parts.push(format!("{} warnings", count.warnings));
    }
    if count.infos > 0 {
        parts.push(format!("{} info", count.infos));
    }

    heading(out, &format!("Issues ({}):", parts.join(", ")), colored);

    for issue in issues {
        let severity_str = match issue.severity {
            Severity::Error => {
                if colored {
                    "ERROR".red().to_string()
                } else {
                    "ERROR".to_string()
                }
            }
            Severity::Warning => {
                if colored {
                    "WARN".yellow().to_string()
                } else {
                    "WARN".to_string()
                }
            }
            Severity::Info => {
                if colored {
                    "INFO".blue().to_string()
                } else {
                    "INFO".to_string()
                }
            }
        };

        writeln!(out, "  [{}] {}: {}", severity_str, issue.code, issue.message).unwrap();
    }
}
