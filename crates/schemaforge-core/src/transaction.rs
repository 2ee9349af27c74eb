//! Running DDL outside the caller's transaction with auto-commit forced on.
//!
//! Some databases block when DDL runs inside an open distributed transaction,
//! so the ambient transaction is suspended for the duration of the work and
//! the connection is switched to auto-commit. Both are undone by guards, so
//! they are restored on every exit path, unwinding included.

use crate::error::{DdlError, DriverError};
use crate::executor::{Connection, DataSource, TransactionManager};
use tracing::{debug, warn};

/// Transaction manager for environments without an ambient transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransactionManager;

impl TransactionManager for NoTransactionManager {
    type Suspended = ();

    fn suspend(&self) -> Result<Option<()>, DriverError> {
        Ok(None)
    }

    fn resume(&self, _suspended: ()) -> Result<(), DriverError> {
        Ok(())
    }
}

pub struct AutoCommitScope<'a, D: DataSource + ?Sized, T: TransactionManager> {
    data_source: &'a D,
    transactions: &'a T,
}

impl<'a, D: DataSource + ?Sized, T: TransactionManager> AutoCommitScope<'a, D, T> {
    pub fn new(data_source: &'a D, transactions: &'a T) -> Self {
        Self {
            data_source,
            transactions,
        }
    }

    /// Run `work` on a fresh auto-commit connection.
    ///
    /// Failing to suspend the ambient transaction is an error and `work` is
    /// not run. Failing to resume it afterwards is only logged; the result of
    /// `work` is what the caller gets.
    pub fn run<R>(
        &self,
        work: impl FnOnce(&mut dyn Connection) -> Result<R, DdlError>,
    ) -> Result<R, DdlError> {
        let suspended = self
            .transactions
            .suspend()
            .map_err(DdlError::TransactionScope)?;
        if suspended.is_some() {
            debug!("suspended the ambient transaction");
        }
        let _resume = ResumeOnDrop {
            transactions: self.transactions,
            suspended,
        };

        let mut connection = self.data_source.connection().map_err(DdlError::Connection)?;
        let mut guard = AutoCommitGuard::force(connection.as_mut())?;
        work(guard.connection())
    }

    /// Like [`run`](Self::run), reporting success as a boolean and logging
    /// the failure.
    pub fn run_reporting<R>(
        &self,
        work: impl FnOnce(&mut dyn Connection) -> Result<R, DdlError>,
    ) -> bool {
        match self.run(work) {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "DDL work failed");
                false
            }
        }
    }
}

struct ResumeOnDrop<'t, T: TransactionManager> {
    transactions: &'t T,
    suspended: Option<T::Suspended>,
}

impl<T: TransactionManager> Drop for ResumeOnDrop<'_, T> {
    fn drop(&mut self) {
        let Some(suspended) = self.suspended.take() else {
            return;
        };
        match self.transactions.resume(suspended) {
            Ok(()) => debug!("resumed the ambient transaction"),
            Err(err) => warn!(error = %err, "failed to resume the suspended transaction"),
        }
    }
}

/// Holds a connection in auto-commit mode and restores the original
/// setting when dropped.
struct AutoCommitGuard<'c> {
    connection: &'c mut dyn Connection,
    original: bool,
}

impl<'c> AutoCommitGuard<'c> {
    fn force(connection: &'c mut dyn Connection) -> Result<Self, DdlError> {
        let original = connection.auto_commit().map_err(DdlError::Connection)?;
        connection
            .set_auto_commit(true)
            .map_err(DdlError::Connection)?;
        Ok(Self {
            connection,
            original,
        })
    }

    fn connection(&mut self) -> &mut dyn Connection {
        &mut *self.connection
    }
}

impl Drop for AutoCommitGuard<'_> {
    fn drop(&mut self) {
        if self.original {
            return;
        }
        if let Err(err) = self.connection.set_auto_commit(false) {
            warn!(error = %err, "failed to restore auto-commit");
        }
    }
}
