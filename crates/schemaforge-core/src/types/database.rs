//! Database families the engine knows how to talk to.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database family, used to key vendor scripts, type-name tables, and
/// dialect-specific statement fix-ups.
///
/// The token set is closed: configuration keys that do not parse to one of
/// these variants are rejected.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
    Default,
)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    /// Shared fallback used when no vendor-specific entry exists.
    #[default]
    Default,
    Oracle,
    /// Microsoft SQL Server.
    Microsoft,
    Informix,
    Db2,
    /// Sybase Adaptive Server Enterprise.
    #[serde(alias = "adaptive server enterprise")]
    Sybase,
    Postgres,
    Mysql,
    Sqlite,
}

impl DatabaseKind {
    pub const ALL: [DatabaseKind; 9] = [
        Self::Default,
        Self::Oracle,
        Self::Microsoft,
        Self::Informix,
        Self::Db2,
        Self::Sybase,
        Self::Postgres,
        Self::Mysql,
        Self::Sqlite,
    ];

    /// Parse a configuration token. Matching is case-insensitive and accepts
    /// the product-name synonyms databases report about themselves.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Self::Default),
            "oracle" => Some(Self::Oracle),
            "microsoft" | "mssql" | "sqlserver" | "microsoft sql server" => Some(Self::Microsoft),
            "informix" => Some(Self::Informix),
            "db2" => Some(Self::Db2),
            "sybase" | "adaptive server enterprise" => Some(Self::Sybase),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::Mysql),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    pub fn as_token(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Oracle => "oracle",
            Self::Microsoft => "microsoft",
            Self::Informix => "informix",
            Self::Db2 => "db2",
            Self::Sybase => "sybase",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Tokenizer dialect used when splitting scripts written for this database.
    pub fn to_sqlparser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        use sqlparser::dialect::{
            GenericDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
        };
        match self {
            Self::Microsoft | Self::Sybase => Box::new(MsSqlDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::Mysql => Box::new(MySqlDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
            Self::Default | Self::Oracle | Self::Informix | Self::Db2 => {
                Box::new(GenericDialect {})
            }
        }
    }

    /// Whether scripts for this database use a standalone `GO` line as a
    /// batch separator.
    pub fn uses_go_separator(&self) -> bool {
        matches!(self, Self::Microsoft | Self::Sybase)
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for DatabaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s).ok_or_else(|| format!("unknown database type: {s}"))
    }
}
