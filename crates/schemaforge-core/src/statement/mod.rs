//! Textual analysis of CREATE TABLE statements.
//!
//! The functions here work on statement text without parsing the full SQL
//! grammar. They rely on the shape the generator emits: `CREATE TABLE <name>`
//! up front, `REFERENCES <table>(<column>)` fragments inside column or
//! constraint definitions, and optional trailing `CREATE INDEX` statements in
//! the same blob. Statements produced by [`render`] are built from the model
//! directly and never go through this text path.

pub mod render;
pub mod script;

use crate::error::DdlError;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::warn;

pub use render::render_create;
pub use script::split_script;

/// Default marker preceding the table name in a CREATE statement.
pub const DEFAULT_BEGIN_DELIMITER: &str = "CREATE TABLE ";

const REFERENCES_MARKER: &str = " references ";

/// Return the table name that follows `begin_delimiter`.
///
/// The delimiter is matched ASCII case-insensitively; whitespace after it is
/// skipped and the name ends at the next whitespace or `(`.
pub fn extract_table_name(statement: &str, begin_delimiter: &str) -> Option<String> {
    let haystack = statement.to_ascii_lowercase();
    let needle = begin_delimiter.to_ascii_lowercase();

    let Some(start) = haystack.find(&needle) else {
        warn!(
            delimiter = begin_delimiter,
            "statement does not contain the CREATE delimiter: {}",
            preview(statement)
        );
        return None;
    };

    let name: String = statement[start + needle.len()..]
        .trim_start()
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '(')
        .collect();

    if name.is_empty() {
        warn!("no table name after the CREATE delimiter: {}", preview(statement));
        return None;
    }

    Some(name)
}

/// Return the distinct tables named after each `references` keyword.
///
/// References to `own_table` are dropped: a table may point at itself, and
/// that never constrains creation order. Names keep the case they were
/// written in and appear in order of first occurrence.
pub fn extract_references(statement: &str, own_table: &str) -> Vec<String> {
    let lower = statement.to_ascii_lowercase();
    let mut references: Vec<String> = Vec::new();
    let mut cursor = 0;

    while let Some(found) = lower[cursor..].find(REFERENCES_MARKER) {
        let start = cursor + found + REFERENCES_MARKER.len();
        cursor = start;

        let end = lower[start..]
            .find(['(', ',', ')', ';'])
            .map(|offset| start + offset)
            .unwrap_or(lower.len());
        let Some(name) = statement[start..end].split_whitespace().next() else {
            continue;
        };

        if name.eq_ignore_ascii_case(own_table)
            || references
                .iter()
                .any(|known| known.eq_ignore_ascii_case(name))
        {
            continue;
        }
        references.push(name.to_string());
    }

    references
}

fn create_index_regex() -> &'static Regex {
    static CREATE_INDEX: OnceLock<Regex> = OnceLock::new();
    CREATE_INDEX.get_or_init(|| {
        Regex::new(r"(?i)\bcreate\s+(?:unique\s+)?index\b").expect("Invalid regex pattern")
    })
}

/// Return the index statement(s) trailing a CREATE TABLE blob, if any.
pub fn extract_index_statement(text: &str) -> Option<&str> {
    let found = create_index_regex().find(text)?;
    let index = text[found.start()..].trim();
    (!index.is_empty()).then_some(index)
}

/// Return the CREATE TABLE part of a blob, without trailing index statements.
pub fn remove_index_statements(text: &str) -> &str {
    match create_index_regex().find(text) {
        Some(found) => text[..found.start()].trim_end(),
        None => text,
    }
}

/// Split an index blob into one statement per `CREATE [UNIQUE] INDEX`.
pub fn split_index_statements(index_text: &str) -> Vec<String> {
    let starts: Vec<usize> = create_index_regex()
        .find_iter(index_text)
        .map(|found| found.start())
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, start)| {
            let end = starts.get(i + 1).copied().unwrap_or(index_text.len());
            strip_trailing_semicolon(&index_text[*start..end]).trim().to_string()
        })
        .filter(|statement| !statement.is_empty())
        .collect()
}

/// Truncate at the first `;`.
pub fn strip_trailing_semicolon(text: &str) -> &str {
    match text.find(';') {
        Some(end) => &text[..end],
        None => text,
    }
}

const REFERENTIAL_ACTIONS: &str =
    r"(?:\s+ON\s+(?:DELETE|UPDATE)\s+(?:CASCADE|SET\s+NULL|SET\s+DEFAULT|NO\s+ACTION|RESTRICT))*";

fn foreign_key_regex() -> &'static Regex {
    static FOREIGN_KEY: OnceLock<Regex> = OnceLock::new();
    FOREIGN_KEY.get_or_init(|| {
        let pattern = format!(
            r"(?is),\s*(?:CONSTRAINT\s+\S+\s+)?FOREIGN\s+KEY\s*\([^)]*\)\s*REFERENCES\s+[^\s(]+\s*\([^)]*\){REFERENTIAL_ACTIONS}"
        );
        Regex::new(&pattern).expect("Invalid regex pattern")
    })
}

fn references_regex() -> &'static Regex {
    static REFERENCES: OnceLock<Regex> = OnceLock::new();
    REFERENCES.get_or_init(|| {
        let pattern = format!(r"(?is)\s+REFERENCES\s+[^\s(]+\s*\([^)]*\){REFERENTIAL_ACTIONS}");
        Regex::new(&pattern).expect("Invalid regex pattern")
    })
}

/// Remove comma-delimited `FOREIGN KEY (...) REFERENCES t(c)` trailers.
pub fn strip_foreign_key_clauses(text: &str) -> String {
    foreign_key_regex().replace_all(text, "").into_owned()
}

/// Remove inline `REFERENCES t(c)` fragments from column definitions.
///
/// Run [`strip_foreign_key_clauses`] first when a statement may contain both
/// shapes; otherwise a trailer loses its `REFERENCES` half and is left behind.
pub fn strip_references_clauses(text: &str) -> String {
    references_regex().replace_all(text, "").into_owned()
}

/// Remove every physical foreign-key constraint from a statement.
pub fn strip_constraints(text: &str) -> String {
    strip_references_clauses(&strip_foreign_key_clauses(text))
}

fn preview(statement: &str) -> String {
    const MAX: usize = 80;
    let flat = statement.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

/// A CREATE TABLE statement with its table name and dependencies cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStatement {
    table_name: String,
    text: String,
    references: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    index_statements: Vec<String>,
}

impl CreateStatement {
    /// Analyze generated statement text using the default delimiter.
    pub fn parse(text: &str) -> Result<Self, DdlError> {
        Self::parse_with_delimiter(text, DEFAULT_BEGIN_DELIMITER)
    }

    /// Analyze statement text: table name, references, and any trailing
    /// index statements are extracted once and cached.
    pub fn parse_with_delimiter(text: &str, begin_delimiter: &str) -> Result<Self, DdlError> {
        let table_part = remove_index_statements(text).trim();
        let table_name = extract_table_name(table_part, begin_delimiter)
            .ok_or_else(|| DdlError::UnnamedStatement(preview(text)))?;
        let references = extract_references(table_part, &table_name);
        let index_statements = extract_index_statement(text)
            .map(split_index_statements)
            .unwrap_or_default();

        Ok(Self {
            table_name,
            text: table_part.to_string(),
            references,
            index_statements,
        })
    }

    /// Build a statement whose facts are already known, skipping text
    /// analysis entirely.
    pub fn from_parts(
        table_name: impl Into<String>,
        text: impl Into<String>,
        references: Vec<String>,
        index_statements: Vec<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            text: text.into(),
            references,
            index_statements,
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    pub fn index_statements(&self) -> &[String] {
        &self.index_statements
    }

    /// Attach an index statement that arrived separately from the table
    /// text, as when a script terminates each statement with `;`.
    pub fn push_index_statement(&mut self, index: impl Into<String>) {
        self.index_statements
            .push(strip_trailing_semicolon(&index.into()).trim().to_string());
    }

    /// The table statement followed by its index statements, each
    /// terminated with `;`.
    pub fn to_script(&self) -> String {
        let mut script = format!("{};", strip_trailing_semicolon(&self.text).trim_end());
        for index in &self.index_statements {
            script.push('\n');
            script.push_str(index);
            script.push(';');
        }
        script
    }
}
