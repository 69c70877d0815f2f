//! In-memory bet ledger and its mutation rules.
//!
//! A record is appended as Pending and settled exactly once. Won and Lost
//! are terminal; records are never deleted.

use tracing::{debug, info};

use crate::engine::aggregate::{aggregate, PerformanceSummary};
use crate::engine::settlement::settle;
use crate::types::{BetId, BetRecord, LedgerError, NewBet, Outcome};

/// The full, materialized collection of bets in storage order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    records: Vec<BetRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<BetRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[BetRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<BetRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: BetId) -> Option<&BetRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Bets still awaiting settlement, in ledger order.
    pub fn pending(&self) -> impl Iterator<Item = &BetRecord> {
        self.records.iter().filter(|r| !r.is_settled())
    }

    /// Append a new Pending bet with a freshly assigned id.
    ///
    /// No uniqueness or cross-field checks are made here.
    pub fn append(&mut self, bet: NewBet) -> &BetRecord {
        let record = BetRecord::pending(BetId::new(), bet);
        debug!(id = %record.id, bet = %record.label(), "Bet appended");
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Settle the bet identified by `id`.
    ///
    /// Only `outcome` and `profit_loss` change. Pending → Pending is a
    /// no-op; any change to an already settled bet is rejected. On any
    /// error the ledger is left as it was.
    pub fn update_outcome(
        &mut self,
        id: BetId,
        outcome: Outcome,
    ) -> Result<&BetRecord, LedgerError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(LedgerError::UnknownBet(id))?;

        if record.is_settled() {
            return Err(LedgerError::AlreadySettled {
                id,
                outcome: record.outcome,
            });
        }

        if outcome.is_settled() {
            record.profit_loss = settle(record.stake, record.staked_odd, outcome)?;
            record.outcome = outcome;
            info!(
                id = %id,
                outcome = %outcome,
                profit_loss = %record.profit_loss,
                "Bet settled"
            );
        }

        Ok(&*record)
    }

    /// Aggregate performance of the whole ledger.
    pub fn summary(&self) -> Result<PerformanceSummary, LedgerError> {
        aggregate(&self.records)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
