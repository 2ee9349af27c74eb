//! Normalized table model produced by the schema model builder.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Type classification of a column, independent of the vendor type string.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum JdbcType {
    Varchar,
    Integer,
    Blob,
    Longvarchar,
    Timestamp,
    Char,
    Date,
    Decimal,
    Unknown,
}

impl JdbcType {
    /// Every classifiable type, in the order the builder tries them.
    pub const CLASSIFIED: [JdbcType; 8] = [
        Self::Varchar,
        Self::Integer,
        Self::Blob,
        Self::Longvarchar,
        Self::Timestamp,
        Self::Char,
        Self::Date,
        Self::Decimal,
    ];
}

impl fmt::Display for JdbcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Varchar => "VARCHAR",
            Self::Integer => "INTEGER",
            Self::Blob => "BLOB",
            Self::Longvarchar => "LONGVARCHAR",
            Self::Timestamp => "TIMESTAMP",
            Self::Char => "CHAR",
            Self::Date => "DATE",
            Self::Decimal => "DECIMAL",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnModel {
    pub name: String,
    /// Vendor type string as declared, rendered verbatim into DDL.
    pub type_name: String,
    pub jdbc_type: JdbcType,
    pub required: bool,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexModel {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexModel {
    /// The named single-column unique index used in place of a native
    /// UNIQUE constraint.
    pub fn unique_for(table: &str, column: &str) -> Self {
        Self {
            name: format!("uidx_{table}_{column}"),
            columns: vec![column.to_string()],
            unique: true,
        }
    }
}

/// `(source_table, source_column) -> (target_table, target_column)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyEdge {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
    pub target_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableModel {
    pub name: String,
    /// Repository that modeled the table; `None` for introspected tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub columns: Vec<ColumnModel>,
    pub primary_key: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexes: Vec<IndexModel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKeyEdge>,
    /// The table was found in the live database rather than modeled here.
    #[serde(default)]
    pub existing: bool,
}

impl TableModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            existing: false,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnModel> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    /// Distinct tables this table's foreign keys point at, excluding itself.
    pub fn referenced_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = Vec::new();
        for edge in &self.foreign_keys {
            if edge.target_table.eq_ignore_ascii_case(&self.name) {
                continue;
            }
            if !tables
                .iter()
                .any(|known| known.eq_ignore_ascii_case(&edge.target_table))
            {
                tables.push(edge.target_table.clone());
            }
        }
        tables
    }
}

/// Cumulative table model for one or more schema builds.
///
/// Lookups are ASCII case-insensitive; iteration follows insertion order so
/// rendered statements keep the order tables were modeled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaModel {
    tables: IndexMap<String, TableModel>,
}

impl SchemaModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a model with tables discovered in the live database.
    pub fn from_existing(tables: impl IntoIterator<Item = TableModel>) -> Self {
        let mut model = Self::new();
        for mut table in tables {
            table.existing = true;
            model.insert(table);
        }
        model
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(&table_key(table))
    }

    pub fn get(&self, table: &str) -> Option<&TableModel> {
        self.tables.get(&table_key(table))
    }

    /// Insert or replace a table, keeping the original position on replace.
    pub fn insert(&mut self, table: TableModel) {
        self.tables.insert(table_key(&table.name), table);
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableModel> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Normalized lookup key for a table name.
pub(crate) fn table_key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}
