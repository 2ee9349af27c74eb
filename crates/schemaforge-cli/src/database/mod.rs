//! Live database access for applying plans and introspecting existing tables.
//!
//! Connections go through sqlx's `Any` driver and are exposed to the engine
//! through its synchronous [`schemaforge_core::Connection`] trait.

use schemaforge_core::DatabaseKind;

#[cfg(feature = "database")]
mod sqlx_connection;

#[cfg(feature = "database")]
pub use sqlx_connection::{fetch_existing_tables, SqlxConnection, SqlxDataSource};

/// Database type inferred from connection URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    Postgres,
    Mysql,
    Sqlite,
}

impl DatabaseType {
    /// Infer database type from a connection URL.
    pub fn from_url(url: &str) -> Option<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Some(Self::Postgres)
        } else if url.starts_with("mysql://") || url.starts_with("mariadb://") {
            Some(Self::Mysql)
        } else if url.starts_with("sqlite://") || url.starts_with("sqlite:") {
            Some(Self::Sqlite)
        } else {
            None
        }
    }

    pub fn kind(self) -> DatabaseKind {
        match self {
            Self::Postgres => DatabaseKind::Postgres,
            Self::Mysql => DatabaseKind::Mysql,
            Self::Sqlite => DatabaseKind::Sqlite,
        }
    }
}
