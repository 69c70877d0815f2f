//! Persistence layer.
//!
//! The ledger is loaded and saved wholesale through a `LedgerStore`.
//! There are no partial updates: every write replaces the whole collection,
//! so two concurrent writers resolve as last-write-wins.

pub mod sheet;

use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::types::{BetRecord, StoreError};

pub use sheet::JsonFileStore;

/// Whole-collection access to the stored ledger.
#[cfg_attr(test, mockall::automock)]
pub trait LedgerStore {
    /// Read every bet, in storage order.
    fn load(&self) -> Result<Vec<BetRecord>, StoreError>;

    /// Replace the stored ledger with `records`.
    fn save(&mut self, records: &[BetRecord]) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same underlying ledger, which lets a
/// test keep a handle on what a `Bookkeeper` wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<BetRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<BetRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<BetRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Vec<BetRecord>, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn save(&mut self, records: &[BetRecord]) -> Result<(), StoreError> {
        let mut stored = self.lock()?;
        *stored = records.to_vec();
        debug!(rows = stored.len(), "Ledger saved to memory");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
