//! Read-only descriptor metadata consumed by the schema model builder.
//!
//! Descriptors are produced outside this crate (by the repository's item
//! metadata layer) and arrive here as plain data. Every field the builder
//! needs is public; nothing is reached through private internals.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A schema owner: one repository and the item descriptors it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDescriptor {
    /// Repository name, recorded as the owner of the tables it models.
    pub name: String,

    /// Versioned repositories compute row identity at query time and never
    /// get physical foreign-key constraints.
    #[serde(default)]
    pub versioned: bool,

    /// Item descriptors in declaration order.
    #[serde(default)]
    pub items: Vec<ItemDescriptor>,
}

/// One logical record type and the tables it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemDescriptor {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<TableDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub name: String,

    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,

    /// Primary-key column names, in key order.
    #[serde(default)]
    pub primary_key: Vec<String>,

    /// Name of the multi-valued column (list/map index) for multi tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_column_name: Option<String>,

    /// Holds the item's primary key.
    #[serde(default)]
    pub primary: bool,

    /// Declared by a parent descriptor; contributes no columns of its own.
    #[serde(default)]
    pub inherited: bool,

    #[serde(default)]
    pub auxiliary: bool,

    /// Stores a multi-valued property.
    #[serde(default)]
    pub multi: bool,
}

impl TableDescriptor {
    /// True when `column` takes part in the table's key, either declared or
    /// through the multi-valued column.
    pub fn is_key_column(&self, column: &str) -> bool {
        self.primary_key
            .iter()
            .any(|key| key.eq_ignore_ascii_case(column))
            || self
                .multi_column_name
                .as_deref()
                .is_some_and(|multi| multi.eq_ignore_ascii_case(column))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    pub name: String,

    /// Vendor type string, e.g. `VARCHAR(254)` or `NUMERIC(19,7)`.
    #[serde(rename = "type")]
    pub sql_type: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub unique: bool,

    /// Foreign-key reference in the form `table(column)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

impl ColumnDescriptor {
    /// The declared type split into its base name and parameters.
    pub fn raw_type(&self) -> RawColumnType {
        RawColumnType::parse(&self.sql_type)
    }

    /// The parsed reference target, if the column declares a non-empty one.
    ///
    /// Returns `Some(Err(..))` when the reference string is present but not of
    /// the form `table(column)`.
    pub fn reference_target(&self) -> Option<Result<ReferenceTarget, String>> {
        let raw = self.references.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(ReferenceTarget::parse(raw))
    }
}

/// A vendor type string split into base name and optional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumnType {
    /// Upper-cased base type name, e.g. `VARCHAR`.
    pub base: String,
    pub size: Option<u32>,
    pub scale: Option<u32>,
}

impl RawColumnType {
    /// Parse `TYPE`, `TYPE(size)` or `TYPE(precision,scale)`.
    ///
    /// Parameters that are not plain integers (e.g. `VARCHAR(MAX)`) leave
    /// `size` and `scale` empty; the base name is still extracted.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (base, params) = match raw.find('(') {
            Some(open) => {
                let close = raw[open..].find(')').map(|i| open + i).unwrap_or(raw.len());
                (&raw[..open], Some(&raw[open + 1..close]))
            }
            None => (raw, None),
        };

        let mut numbers = params
            .into_iter()
            .flat_map(|p| p.split(','))
            .map(|part| part.trim().parse::<u32>().ok());

        let size = numbers.next().flatten();
        let scale = numbers.next().flatten();

        Self {
            base: base.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase(),
            size,
            scale,
        }
    }
}

/// Parsed `table(column)` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTarget {
    pub table: String,
    pub column: String,
}

impl ReferenceTarget {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let open = raw
            .find('(')
            .ok_or_else(|| format!("reference '{raw}' is not of the form table(column)"))?;
        let close = raw
            .rfind(')')
            .filter(|close| *close > open)
            .ok_or_else(|| format!("reference '{raw}' is missing a closing parenthesis"))?;

        let table = raw[..open].trim();
        let column = raw[open + 1..close].trim();
        if table.is_empty() || column.is_empty() {
            return Err(format!("reference '{raw}' names no table or column"));
        }

        Ok(Self {
            table: table.to_string(),
            column: column.to_string(),
        })
    }
}
