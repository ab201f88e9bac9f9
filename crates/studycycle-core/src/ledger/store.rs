//! Persistence port for the progress ledger.
//!
//! The ledger loads the whole map once at open and writes the whole map back
//! after every mutation. [`MemoryStore`] backs tests and dry runs; the SQLite
//! [`crate::storage::Database`] backs the CLI.

use crate::error::StorageError;

use super::LedgerMap;

/// Durable storage for the ledger map.
pub trait LedgerStore {
    /// Load the persisted map; an empty map when nothing was stored yet.
    fn load(&self) -> Result<LedgerMap, StorageError>;

    /// Replace the persisted map.
    fn save(&mut self, logs: &LedgerMap) -> Result<(), StorageError>;
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn load(&self) -> Result<LedgerMap, StorageError> {
        (**self).load()
    }

    fn save(&mut self, logs: &LedgerMap) -> Result<(), StorageError> {
        (**self).save(logs)
    }
}

/// In-memory ledger store.
///
/// Can be told to fail its first `n` saves, which exercises the ledger's
/// all-or-nothing writes and the sync coordinator's retry budget.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    logs: LedgerMap,
    saves: usize,
    failures_left: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose first `n` saves fail.
    pub fn failing_first(n: usize) -> Self {
        Self {
            failures_left: n,
            ..Self::default()
        }
    }

    /// The map as last persisted.
    pub fn persisted(&self) -> &LedgerMap {
        &self.logs
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<LedgerMap, StorageError> {
        Ok(self.logs.clone())
    }

    fn save(&mut self, logs: &LedgerMap) -> Result<(), StorageError> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(StorageError::QueryFailed("simulated write failure".into()));
        }
        self.logs = logs.clone();
        self.saves += 1;
        Ok(())
    }
}
