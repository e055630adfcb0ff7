//! Transactional in-memory ledger store.

use std::time::Duration;

use parking_lot::RwLock;
use tally_core::ledger::{LedgerError, LedgerRead, LedgerRepository, LedgerResult, LedgerTx};
use tally_shared::LedgerConfig;
use tracing::{debug, warn};

use super::journal::Journal;
use super::tables::LedgerTables;

/// In-memory store with serializable transactions.
///
/// Writers take the table lock exclusively and write in place through an
/// undo journal. The journal is committed only when the unit of work
/// succeeds; on an error or a panic it restores the rows it touched, so a
/// failed transaction leaves no trace. Readers share the lock and see
/// committed state only.
///
/// Waiting for the lock is bounded; a timeout surfaces as
/// [`LedgerError::StoreUnavailable`].
#[derive(Debug)]
pub struct InMemoryLedgerStore {
    tables: RwLock<LedgerTables>,
    lock_timeout: Duration,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            tables: RwLock::new(LedgerTables::new()),
            lock_timeout,
        }
    }

    /// Creates an empty store using the configured lock timeout.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.lock_timeout())
    }

    /// Lock timeout applied to every operation.
    #[must_use]
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    fn unavailable(&self, kind: &str) -> LedgerError {
        warn!(
            timeout_ms = u64::try_from(self.lock_timeout.as_millis()).unwrap_or(u64::MAX),
            kind,
            "Timed out waiting for store lock"
        );
        LedgerError::StoreUnavailable(format!(
            "timed out after {:?} waiting for {kind} lock",
            self.lock_timeout
        ))
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}

impl LedgerRepository for InMemoryLedgerStore {
    fn transaction<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut dyn LedgerTx) -> LedgerResult<T>,
    {
        let mut tables = self
            .tables
            .try_write_for(self.lock_timeout)
            .ok_or_else(|| self.unavailable("write"))?;

        let mut journal = Journal::new(&mut tables);
        match f(&mut journal) {
            Ok(value) => {
                journal.commit();
                Ok(value)
            }
            Err(err) => {
                drop(journal);
                debug!(error = %err, "Transaction rolled back");
                Err(err)
            }
        }
    }

    fn snapshot<T, F>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&dyn LedgerRead) -> LedgerResult<T>,
    {
        let tables = self
            .tables
            .try_read_for(self.lock_timeout)
            .ok_or_else(|| self.unavailable("read"))?;
        f(&*tables)
    }
}
