//! SQLx-backed implementation of the engine's connection traits.
//!
//! Supports PostgreSQL, MySQL, and SQLite databases.

use schemaforge_core::{Connection, DataSource, DriverError, TableModel};
use sqlx::any::install_default_drivers;
use sqlx::AnyConnection;
use sqlx::Connection as _;
use sqlx::Row;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::debug;

use super::DatabaseType;

fn driver_error(err: sqlx::Error) -> DriverError {
    let sql_state = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned());
    let error = DriverError::new(err.to_string());
    match sql_state {
        Some(state) => error.with_sql_state(state),
        None => error,
    }
}

/// Opens connections to one database URL.
///
/// Owns the tokio runtime every connection it hands out blocks on, so the
/// engine can stay synchronous.
pub struct SqlxDataSource {
    url: String,
    db_type: DatabaseType,
    runtime: Arc<Runtime>,
}

impl SqlxDataSource {
    /// # Errors
    /// Returns an error if the URL scheme is not supported or the runtime
    /// cannot be started. No connection is made yet.
    pub fn new(url: &str) -> Result<Self, DriverError> {
        let db_type = DatabaseType::from_url(url)
            .ok_or_else(|| DriverError::new(format!("Unsupported database URL scheme: {url}")))?;

        install_default_drivers();
        let runtime = Runtime::new()
            .map_err(|err| DriverError::new(format!("cannot start async runtime: {err}")))?;

        Ok(Self {
            url: url.to_string(),
            db_type,
            runtime: Arc::new(runtime),
        })
    }

    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    pub fn connect(&self) -> Result<SqlxConnection, DriverError> {
        let connection = self
            .runtime
            .block_on(AnyConnection::connect(&self.url))
            .map_err(driver_error)?;
        debug!(database = ?self.db_type, "opened database connection");

        Ok(SqlxConnection {
            connection,
            runtime: Arc::clone(&self.runtime),
            in_transaction: false,
        })
    }

    /// Names of the base tables in the connection's default schema.
    pub fn existing_tables(&self) -> Result<Vec<TableModel>, DriverError> {
        let query = match self.db_type {
            DatabaseType::Postgres => {
                r#"
                SELECT table_name::text AS table_name
                FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_type = 'BASE TABLE'
                ORDER BY table_name
                "#
            }
            DatabaseType::Mysql => {
                r#"
                SELECT TABLE_NAME AS table_name
                FROM information_schema.TABLES
                WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
                ORDER BY TABLE_NAME
                "#
            }
            DatabaseType::Sqlite => {
                r#"
                SELECT name AS table_name FROM sqlite_master
                WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                ORDER BY name
                "#
            }
        };

        let mut connection = self.connect()?;
        let rows = self
            .runtime
            .block_on(sqlx::query(query).fetch_all(&mut connection.connection))
            .map_err(driver_error)?;

        let tables = rows
            .iter()
            .map(|row| {
                row.try_get::<String, _>("table_name")
                    .map(TableModel::new)
                    .map_err(driver_error)
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = tables.len(), "introspected existing tables");
        Ok(tables)
    }
}

impl DataSource for SqlxDataSource {
    fn connection(&self) -> Result<Box<dyn Connection>, DriverError> {
        Ok(Box::new(self.connect()?))
    }
}

/// One database connection.
///
/// sqlx has no auto-commit switch, so turning auto-commit off opens a
/// `BEGIN` block and turning it back on commits that block. Dropping the
/// connection closes it; the server rolls back a block still open.
pub struct SqlxConnection {
    connection: AnyConnection,
    runtime: Arc<Runtime>,
    in_transaction: bool,
}

impl Connection for SqlxConnection {
    fn execute(&mut self, sql: &str) -> Result<(), DriverError> {
        self.runtime
            .block_on(sqlx::raw_sql(sql).execute(&mut self.connection))
            .map(|_| ())
            .map_err(driver_error)
    }

    fn auto_commit(&mut self) -> Result<bool, DriverError> {
        Ok(!self.in_transaction)
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), DriverError> {
        match (enabled, self.in_transaction) {
            (false, false) => {
                self.execute("BEGIN")?;
                self.in_transaction = true;
            }
            (true, true) => {
                self.execute("COMMIT")?;
                self.in_transaction = false;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Connect to a database and list its tables.
///
/// This is the main entry point for `--include-existing`.
pub fn fetch_existing_tables(url: &str) -> Result<Vec<TableModel>, DriverError> {
    SqlxDataSource::new(url)?.existing_tables()
}
