//! Registry of which repository modeled which table.
//!
//! Cooperating repositories may declare the same physical table. The first
//! one to claim a table models it; later owners are recorded against the
//! entry and skip it. The tracker is shared explicitly (usually behind an
//! `Arc`) and every operation is a single critical section, so concurrent
//! builds cannot both claim the same table.

use crate::types::table_key;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of [`SchemaTracker::claim`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableClaim {
    /// The caller owns the table and should model it.
    Claimed,
    /// Another repository modeled the table first. `owners` lists every
    /// registered owner, the first modeler leading.
    AlreadyModeled { owners: Vec<String> },
}

#[derive(Debug, Clone)]
struct Registration {
    table: String,
    owners: Vec<String>,
}

#[derive(Debug, Default)]
pub struct SchemaTracker {
    tables: Mutex<HashMap<String, Registration>>,
}

impl SchemaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `owner` against `table`, reporting whether it should model it.
    ///
    /// Re-claiming a table the same owner modeled first returns
    /// [`TableClaim::Claimed`] so a repository can rebuild its own schema.
    pub fn claim(&self, table: &str, owner: &str) -> TableClaim {
        let mut tables = self.lock();
        let registration = tables
            .entry(table_key(table))
            .or_insert_with(|| Registration {
                table: table.trim().to_string(),
                owners: Vec::new(),
            });

        match registration.owners.first() {
            None => {
                registration.owners.push(owner.to_string());
                TableClaim::Claimed
            }
            Some(first) if first == owner => TableClaim::Claimed,
            Some(_) => {
                if !registration.owners.iter().any(|known| known == owner) {
                    registration.owners.push(owner.to_string());
                }
                TableClaim::AlreadyModeled {
                    owners: registration.owners.clone(),
                }
            }
        }
    }

    /// Withdraw `owner` from `table`, e.g. after modeling it failed.
    pub fn release(&self, table: &str, owner: &str) {
        let mut tables = self.lock();
        let key = table_key(table);
        if let Some(registration) = tables.get_mut(&key) {
            registration.owners.retain(|known| known != owner);
            if registration.owners.is_empty() {
                tables.remove(&key);
            }
        }
    }

    pub fn owners(&self, table: &str) -> Vec<String> {
        self.lock()
            .get(&table_key(table))
            .map(|registration| registration.owners.clone())
            .unwrap_or_default()
    }

    pub fn is_modeled(&self, table: &str) -> bool {
        self.lock().contains_key(&table_key(table))
    }

    /// Every registered table with its owners, sorted by table name.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.lock()
            .values()
            .map(|registration| (registration.table.clone(), registration.owners.clone()))
            .collect()
    }

    pub fn reset(&self) {
        self.lock().clear();
    }

    // A panic while holding the lock cannot leave a registration half-written,
    // so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Registration>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
