//! In-memory database double for executor and transaction tests.
//!
//! Understands just enough SQL to behave like a strict database: probes fail
//! for missing tables, CREATE fails when a referenced table is missing, and
//! DROP fails while another table still references the target.

use crate::error::DriverError;
use crate::executor::{Connection, DataSource, TransactionManager};
use crate::statement::{extract_references, extract_table_name};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Default)]
struct FakeState {
    /// Lower-cased table name -> lower-cased referenced tables.
    tables: BTreeMap<String, Vec<String>>,
    log: Vec<String>,
    fail_patterns: Vec<String>,
    auto_commit: bool,
    auto_commit_changes: Vec<bool>,
}

#[derive(Debug, Clone)]
pub struct FakeDatabase {
    state: Rc<RefCell<FakeState>>,
}

impl Default for FakeDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(FakeState {
                auto_commit: true,
                ..FakeState::default()
            })),
        }
    }

    pub fn connection(&self) -> FakeConnection {
        FakeConnection {
            state: Rc::clone(&self.state),
        }
    }

    pub fn add_table(&self, name: &str, references: &[&str]) {
        self.state.borrow_mut().tables.insert(
            name.to_ascii_lowercase(),
            references.iter().map(|r| r.to_ascii_lowercase()).collect(),
        );
    }

    /// Fail every statement containing `pattern`.
    pub fn fail_when(&self, pattern: &str) {
        self.state.borrow_mut().fail_patterns.push(pattern.to_string());
    }

    pub fn set_auto_commit(&self, enabled: bool) {
        self.state.borrow_mut().auto_commit = enabled;
    }

    pub fn auto_commit(&self) -> bool {
        self.state.borrow().auto_commit
    }

    /// Every value passed to `set_auto_commit` on a connection.
    pub fn auto_commit_changes(&self) -> Vec<bool> {
        self.state.borrow().auto_commit_changes.clone()
    }

    /// Existing tables, lower-cased and sorted.
    pub fn tables(&self) -> Vec<String> {
        self.state.borrow().tables.keys().cloned().collect()
    }

    pub fn log(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }
}

impl DataSource for FakeDatabase {
    fn connection(&self) -> Result<Box<dyn Connection>, DriverError> {
        Ok(Box::new(FakeDatabase::connection(self)))
    }
}

pub struct FakeConnection {
    state: Rc<RefCell<FakeState>>,
}

fn first_word(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '(')
        .find(|word| !word.is_empty())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

impl Connection for FakeConnection {
    fn execute(&mut self, sql: &str) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.log.push(sql.to_string());

        if state.fail_patterns.iter().any(|pattern| sql.contains(pattern.as_str())) {
            return Err(DriverError::new(format!("injected failure: {sql}")));
        }

        let lower = sql.trim().to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("select count(*) from ") {
            let table = first_word(rest);
            return if state.tables.contains_key(&table) {
                Ok(())
            } else {
                Err(DriverError::new(format!("no such table: {table}")).with_sql_state("42S02"))
            };
        }

        if let Some(rest) = lower.strip_prefix("drop table ") {
            let table = first_word(rest);
            if !state.tables.contains_key(&table) {
                return Err(DriverError::new(format!("no such table: {table}")));
            }
            if let Some((dependent, _)) = state
                .tables
                .iter()
                .find(|(name, refs)| **name != table && refs.contains(&table))
            {
                return Err(DriverError::new(format!(
                    "table {table} is referenced by {dependent}"
                )));
            }
            state.tables.remove(&table);
            return Ok(());
        }

        if lower.starts_with("create table ") {
            let table = extract_table_name(sql, "CREATE TABLE ")
                .ok_or_else(|| DriverError::new("syntax error"))?
                .to_ascii_lowercase();
            if state.tables.contains_key(&table) {
                return Err(DriverError::new(format!("table {table} already exists")));
            }
            let references: Vec<String> = extract_references(sql, &table)
                .into_iter()
                .map(|r| r.to_ascii_lowercase())
                .collect();
            if let Some(missing) = references.iter().find(|r| !state.tables.contains_key(*r)) {
                return Err(DriverError::new(format!(
                    "referenced table {missing} does not exist"
                )));
            }
            state.tables.insert(table, references);
        }

        Ok(())
    }

    fn auto_commit(&mut self) -> Result<bool, DriverError> {
        Ok(self.state.borrow().auto_commit)
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), DriverError> {
        let mut state = self.state.borrow_mut();
        state.auto_commit = enabled;
        state.auto_commit_changes.push(enabled);
        Ok(())
    }
}

/// Transaction manager that records suspend/resume calls.
#[derive(Debug, Default)]
pub struct FakeTransactions {
    pub active: bool,
    pub fail_suspend: bool,
    pub fail_resume: bool,
    pub events: RefCell<Vec<&'static str>>,
}

impl TransactionManager for FakeTransactions {
    type Suspended = &'static str;

    fn suspend(&self) -> Result<Option<Self::Suspended>, DriverError> {
        if self.fail_suspend {
            return Err(DriverError::new("suspend refused"));
        }
        self.events.borrow_mut().push("suspend");
        Ok(self.active.then_some("tx-1"))
    }

    fn resume(&self, _suspended: Self::Suspended) -> Result<(), DriverError> {
        self.events.borrow_mut().push("resume");
        if self.fail_resume {
            return Err(DriverError::new("resume refused"));
        }
        Ok(())
    }
}
