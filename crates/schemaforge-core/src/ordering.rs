//! Dependency ordering of CREATE statements.
//!
//! A batch of statements is reordered so that every table is created after
//! the tables it references. The orderer runs a bounded fixed-point
//! iteration: statements become eligible once everything they wait on has
//! been emitted, and a batch that cannot be drained within `N` passes (`N`
//! being the number of statements left after the first sweep) contains a
//! cycle.

use crate::error::DdlError;
use crate::statement::CreateStatement;
use crate::types::{issue_codes, table_key, Issue};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// A batch in creation order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedStatements {
    pub statements: Vec<CreateStatement>,
    pub issues: Vec<Issue>,
    /// Fixed-point passes needed after the initial sweep.
    pub passes: usize,
}

impl OrderedStatements {
    pub fn table_names(&self) -> Vec<String> {
        self.statements
            .iter()
            .map(|statement| statement.table_name().to_string())
            .collect()
    }

    /// Tables in an order that drops every referencing table before the
    /// tables it references.
    pub fn drop_order(&self) -> Vec<String> {
        let mut names = self.table_names();
        names.reverse();
        names
    }
}

/// Pending edges between the statements not yet emitted.
///
/// Keys are normalized table names; `refers_to` keeps the batch order of the
/// remaining statements so eligibility is checked in original order.
#[derive(Debug, Default)]
struct DependencyGraph {
    refers_to: IndexMap<String, IndexSet<String>>,
    referenced_by: HashMap<String, Vec<String>>,
}

impl DependencyGraph {
    fn add(&mut self, table: String, references: IndexSet<String>) {
        for target in &references {
            self.referenced_by
                .entry(target.clone())
                .or_default()
                .push(table.clone());
        }
        self.refers_to.insert(table, references);
    }

    fn is_empty(&self) -> bool {
        self.refers_to.is_empty()
    }

    /// Tables with nothing left to wait on, in batch order.
    fn ready(&self) -> Vec<String> {
        self.refers_to
            .iter()
            .filter(|(_, waiting_on)| waiting_on.is_empty())
            .map(|(table, _)| table.clone())
            .collect()
    }

    fn emit(&mut self, table: &str) {
        self.refers_to.shift_remove(table);
        if let Some(dependents) = self.referenced_by.remove(table) {
            for dependent in dependents {
                if let Some(waiting_on) = self.refers_to.get_mut(&dependent) {
                    waiting_on.shift_remove(table);
                }
            }
        }
    }

    fn unresolved(&self) -> impl Iterator<Item = &String> {
        self.refers_to.keys()
    }
}

/// Order `statements` so referenced tables are created first.
///
/// Statements without in-batch references keep their relative order and come
/// first. Self references never constrain order. A reference to a table that
/// is not in the batch is treated as already satisfied and reported as an
/// `EXTERNAL_REFERENCE` warning. When the same table appears twice, the first
/// statement wins and the duplicate is reported.
pub fn order_statements(statements: Vec<CreateStatement>) -> Result<OrderedStatements, DdlError> {
    let mut issues = Vec::new();

    let mut batch: IndexMap<String, CreateStatement> = IndexMap::new();
    for statement in statements {
        let key = table_key(statement.table_name());
        if batch.contains_key(&key) {
            warn!(table = statement.table_name(), "duplicate CREATE statement dropped");
            issues.push(
                Issue::warning(
                    issue_codes::DUPLICATE_TABLE,
                    format!(
                        "Table {} appears more than once; only the first statement is kept",
                        statement.table_name()
                    ),
                )
                .with_table(statement.table_name()),
            );
            continue;
        }
        batch.insert(key, statement);
    }

    let mut output: Vec<String> = Vec::with_capacity(batch.len());
    let mut graph = DependencyGraph::default();

    for (key, statement) in &batch {
        let mut references = IndexSet::new();
        for reference in statement.references() {
            let target = table_key(reference);
            if target == *key {
                continue;
            }
            if batch.contains_key(&target) {
                references.insert(target);
            } else {
                debug!(
                    table = statement.table_name(),
                    reference = %reference,
                    "reference outside the batch"
                );
                issues.push(
                    Issue::warning(
                        issue_codes::EXTERNAL_REFERENCE,
                        format!(
                            "Table {} references {reference}, which is not part of this batch",
                            statement.table_name()
                        ),
                    )
                    .with_table(statement.table_name()),
                );
            }
        }

        if references.is_empty() {
            output.push(key.clone());
        } else {
            graph.add(key.clone(), references);
        }
    }

    let emitted: HashSet<String> = output.iter().cloned().collect();
    for waiting_on in graph.refers_to.values_mut() {
        waiting_on.retain(|target| !emitted.contains(target));
    }

    let max_passes = graph.refers_to.len();
    let mut passes = 0;
    let mut stalled = false;

    while !graph.is_empty() && passes < max_passes {
        passes += 1;
        let ready = graph.ready();

        if ready.is_empty() {
            if !stalled {
                stalled = true;
                warn!(
                    pass = passes,
                    remaining = graph.refers_to.len(),
                    "ordering stalled; remaining statements wait on each other"
                );
            }
            continue;
        }

        for table in ready {
            graph.emit(&table);
            output.push(table);
        }
    }

    if !graph.is_empty() {
        let unresolved: Vec<String> = graph
            .unresolved()
            .filter_map(|key| batch.get(key))
            .map(|statement| statement.table_name().to_string())
            .collect();
        warn!(unresolved = ?unresolved, passes, "CREATE statements cannot be ordered");
        return Err(DdlError::Ordering { unresolved, passes });
    }

    let statements: Vec<CreateStatement> = output
        .iter()
        .filter_map(|key| batch.swap_remove(key))
        .collect();

    info!(statements = statements.len(), passes, "ordered CREATE statements");
    Ok(OrderedStatements {
        statements,
        issues,
        passes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(table: &str, references: &[&str]) -> CreateStatement {
        CreateStatement::from_parts(
            table,
            format!("CREATE TABLE {table} (id INT)"),
            references.iter().map(|r| r.to_string()).collect(),
            Vec::new(),
        )
    }

    fn names(ordered: &OrderedStatements) -> Vec<String> {
        ordered.table_names()
    }

    #[test]
    fn test_orders_referenced_table_first() {
        let ordered = order_statements(vec![
            CreateStatement::parse("CREATE TABLE ORDERS (id INT, cust INT references CUSTOMERS(id))")
                .unwrap(),
            CreateStatement::parse("CREATE TABLE CUSTOMERS (id INT)").unwrap(),
        ])
        .unwrap();

        assert_eq!(names(&ordered), vec!["CUSTOMERS", "ORDERS"]);
        assert_eq!(ordered.drop_order(), vec!["ORDERS", "CUSTOMERS"]);
        assert!(ordered.issues.is_empty());
    }

    #[test]
    fn test_independent_statements_keep_their_order() {
        let ordered = order_statements(vec![
            statement("c", &["a"]),
            statement("b", &[]),
            statement("d", &["a"]),
            statement("a", &[]),
        ])
        .unwrap();
        assert_eq!(names(&ordered), vec!["b", "a", "c", "d"]);
        assert_eq!(ordered.passes, 1);
    }

    #[test]
    fn test_chain_resolves_one_level_per_pass() {
        let ordered = order_statements(vec![
            statement("d", &["c"]),
            statement("c", &["b"]),
            statement("b", &["a"]),
            statement("a", &[]),
        ])
        .unwrap();
        assert_eq!(names(&ordered), vec!["a", "b", "c", "d"]);
        assert_eq!(ordered.passes, 3);
    }

    #[test]
    fn test_reference_case_is_ignored() {
        let ordered =
            order_statements(vec![statement("child", &["PARENT"]), statement("parent", &[])])
                .unwrap();
        assert_eq!(names(&ordered), vec!["parent", "child"]);
    }

    #[test]
    fn test_two_table_cycle_fails_naming_both() {
        let err = order_statements(vec![statement("a", &["b"]), statement("b", &["a"])])
            .unwrap_err();
        match err {
            DdlError::Ordering { unresolved, passes } => {
                assert_eq!(unresolved, vec!["a", "b"]);
                assert_eq!(passes, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cycle_does_not_block_unrelated_tables_from_being_reported() {
        let err = order_statements(vec![
            statement("root", &[]),
            statement("a", &["b"]),
            statement("b", &["a"]),
            statement("leaf", &["a"]),
        ])
        .unwrap_err();
        assert_eq!(err.tables(), vec!["a", "b", "leaf"]);
    }

    #[test]
    fn test_external_reference_is_satisfied_with_a_warning() {
        let ordered = order_statements(vec![statement("orders", &["customers"])]).unwrap();
        assert_eq!(names(&ordered), vec!["orders"]);
        assert_eq!(ordered.issues.len(), 1);
        assert_eq!(ordered.issues[0].code, issue_codes::EXTERNAL_REFERENCE);
        assert_eq!(ordered.issues[0].table.as_deref(), Some("orders"));
    }

    #[test]
    fn test_duplicate_tables_keep_the_first_statement() {
        let ordered = order_statements(vec![
            statement("a", &[]),
            CreateStatement::from_parts("A", "CREATE TABLE A (x INT)", Vec::new(), Vec::new()),
        ])
        .unwrap();
        assert_eq!(ordered.statements.len(), 1);
        assert_eq!(ordered.statements[0].text(), "CREATE TABLE a (id INT)");
        assert_eq!(ordered.issues[0].code, issue_codes::DUPLICATE_TABLE);
    }

    #[test]
    fn test_empty_batch() {
        let ordered = order_statements(Vec::new()).unwrap();
        assert!(ordered.statements.is_empty());
        assert_eq!(ordered.passes, 0);
    }
}
