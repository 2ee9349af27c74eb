//! Vendor type names per type classification.

use crate::types::{DatabaseKind, JdbcType};
use std::collections::BTreeMap;

/// Extra vendor type names per classification, as read from configuration.
pub type TypeNameOverrides = BTreeMap<JdbcType, Vec<String>>;

/// The vendor type names a database reports for each classification.
///
/// Names are stored upper-cased and compared against the base name of a
/// column's raw type (the part before any parameters).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNameMap {
    names: BTreeMap<JdbcType, Vec<String>>,
}

impl TypeNameMap {
    /// Names understood by every vendor.
    pub fn standard() -> Self {
        let mut map = Self {
            names: BTreeMap::new(),
        };
        map.extend(JdbcType::Varchar, ["VARCHAR", "CHARACTER VARYING"]);
        map.extend(JdbcType::Integer, ["INTEGER", "INT", "SMALLINT", "BIGINT"]);
        map.extend(JdbcType::Blob, ["BLOB"]);
        map.extend(JdbcType::Longvarchar, ["LONG VARCHAR", "CLOB"]);
        map.extend(JdbcType::Timestamp, ["TIMESTAMP"]);
        map.extend(JdbcType::Char, ["CHAR", "CHARACTER"]);
        map.extend(JdbcType::Date, ["DATE"]);
        map.extend(JdbcType::Decimal, ["DECIMAL", "NUMERIC"]);
        map
    }

    /// Names reported by `kind`: the standard names plus vendor spellings.
    pub fn for_database(kind: DatabaseKind) -> Self {
        let mut map = Self::standard();
        match kind {
            DatabaseKind::Oracle => {
                map.extend(JdbcType::Varchar, ["VARCHAR2", "NVARCHAR2"]);
                map.extend(JdbcType::Decimal, ["NUMBER"]);
                map.extend(JdbcType::Blob, ["LONG RAW", "RAW"]);
                map.extend(JdbcType::Longvarchar, ["LONG", "NCLOB"]);
            }
            DatabaseKind::Microsoft | DatabaseKind::Sybase => {
                map.extend(JdbcType::Varchar, ["NVARCHAR"]);
                map.extend(JdbcType::Integer, ["TINYINT"]);
                map.extend(JdbcType::Blob, ["IMAGE", "VARBINARY"]);
                map.extend(JdbcType::Longvarchar, ["TEXT", "NTEXT"]);
                map.extend(JdbcType::Timestamp, ["DATETIME", "SMALLDATETIME"]);
                map.extend(JdbcType::Char, ["NCHAR"]);
            }
            DatabaseKind::Informix => {
                map.extend(JdbcType::Varchar, ["LVARCHAR"]);
                map.extend(JdbcType::Blob, ["BYTE"]);
                map.extend(JdbcType::Longvarchar, ["TEXT"]);
                map.extend(JdbcType::Timestamp, ["DATETIME YEAR TO FRACTION"]);
            }
            DatabaseKind::Db2 => {
                map.extend(JdbcType::Blob, ["VARCHAR FOR BIT DATA"]);
                map.extend(JdbcType::Longvarchar, ["DBCLOB"]);
            }
            DatabaseKind::Postgres => {
                map.extend(JdbcType::Blob, ["BYTEA"]);
                map.extend(JdbcType::Longvarchar, ["TEXT"]);
                map.extend(JdbcType::Integer, ["SERIAL", "BIGSERIAL"]);
            }
            DatabaseKind::Mysql => {
                map.extend(JdbcType::Blob, ["LONGBLOB", "MEDIUMBLOB"]);
                map.extend(JdbcType::Longvarchar, ["TEXT", "MEDIUMTEXT", "LONGTEXT"]);
                map.extend(JdbcType::Integer, ["TINYINT"]);
                map.extend(JdbcType::Timestamp, ["DATETIME"]);
            }
            DatabaseKind::Sqlite => {
                map.extend(JdbcType::Longvarchar, ["TEXT"]);
                map.extend(JdbcType::Timestamp, ["DATETIME"]);
            }
            DatabaseKind::Default => {}
        }
        map
    }

    /// Add a vendor name for `jdbc_type`.
    pub fn with_name(mut self, jdbc_type: JdbcType, name: &str) -> Self {
        self.extend(jdbc_type, [name]);
        self
    }

    /// Add every configured name.
    pub fn with_overrides(mut self, overrides: &TypeNameOverrides) -> Self {
        for (jdbc_type, names) in overrides {
            self.extend(*jdbc_type, names.iter().map(String::as_str));
        }
        self
    }

    pub fn names(&self, jdbc_type: JdbcType) -> &[String] {
        self.names.get(&jdbc_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Classify a base type name; `UNKNOWN` when no classification lists it.
    pub fn classify(&self, base: &str) -> JdbcType {
        let base = base.trim().to_ascii_uppercase();
        JdbcType::CLASSIFIED
            .into_iter()
            .find(|jdbc_type| self.names(*jdbc_type).iter().any(|name| *name == base))
            .unwrap_or(JdbcType::Unknown)
    }

    fn extend<'a>(&mut self, jdbc_type: JdbcType, names: impl IntoIterator<Item = &'a str>) {
        let entry = self.names.entry(jdbc_type).or_default();
        for name in names {
            let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
            let name = name.to_ascii_uppercase();
            if !name.is_empty() && !entry.contains(&name) {
                entry.push(name);
            }
        }
    }
}

impl Default for TypeNameMap {
    fn default() -> Self {
        Self::standard()
    }
}
