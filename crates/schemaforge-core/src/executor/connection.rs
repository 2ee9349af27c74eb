//! Narrow database capabilities the executor and transaction scope need.
//!
//! Implementations live with whoever owns the driver: the CLI provides one
//! over sqlx, and tests use an in-memory fake.

use crate::error::DriverError;

/// A live database connection. Dropping the value closes it.
pub trait Connection {
    /// Execute one statement, discarding any rows it produces.
    fn execute(&mut self, sql: &str) -> Result<(), DriverError>;

    fn auto_commit(&mut self) -> Result<bool, DriverError>;

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), DriverError>;
}

impl<C: Connection + ?Sized> Connection for Box<C> {
    fn execute(&mut self, sql: &str) -> Result<(), DriverError> {
        (**self).execute(sql)
    }

    fn auto_commit(&mut self) -> Result<bool, DriverError> {
        (**self).auto_commit()
    }

    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), DriverError> {
        (**self).set_auto_commit(enabled)
    }
}

/// Source of connections.
pub trait DataSource {
    fn connection(&self) -> Result<Box<dyn Connection>, DriverError>;
}

/// Ambient transaction control.
///
/// `suspend` detaches the calling thread's transaction, if there is one, and
/// hands it back for a later `resume` on the same thread.
pub trait TransactionManager {
    type Suspended;

    fn suspend(&self) -> Result<Option<Self::Suspended>, DriverError>;

    fn resume(&self, suspended: Self::Suspended) -> Result<(), DriverError>;
}
