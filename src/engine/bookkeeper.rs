//! Bookkeeper — one user action per call: load the whole ledger, apply a
//! single pure computation, and write the whole ledger back if it changed.
//!
//! The store handle is owned explicitly; nothing is cached between calls,
//! so every action works on what the store holds right now.

use tracing::{info, warn};

use crate::engine::aggregate::PerformanceSummary;
use crate::engine::ledger::Ledger;
use crate::storage::LedgerStore;
use crate::types::{BetId, BetRecord, LedgerError, NewBet, Outcome};

pub struct Bookkeeper {
    store: Box<dyn LedgerStore + Send>,
}

impl Bookkeeper {
    pub fn new(store: Box<dyn LedgerStore + Send>) -> Self {
        Self { store }
    }

    /// Load the current ledger.
    pub fn ledger(&self) -> Result<Ledger, LedgerError> {
        Ok(Ledger::from_records(self.store.load()?))
    }

    /// Performance metrics over the current ledger.
    pub fn summary(&self) -> Result<PerformanceSummary, LedgerError> {
        self.ledger()?.summary()
    }

    /// Bets awaiting settlement, in ledger order.
    pub fn pending(&self) -> Result<Vec<BetRecord>, LedgerError> {
        Ok(self.ledger()?.pending().cloned().collect())
    }

    /// Validate and append a new Pending bet, then save.
    pub fn record_bet(&mut self, bet: NewBet) -> Result<BetRecord, LedgerError> {
        bet.validate()?;
        if bet.staked_odd <= rust_decimal::Decimal::ONE {
            warn!(odd = %bet.staked_odd, "Recording a bet with odd <= 1.0");
        }

        let mut ledger = self.ledger()?;
        let record = ledger.append(bet).clone();
        self.store.save(ledger.records())?;

        info!(
            id = %record.id,
            bet = %record.label(),
            stake = %record.stake,
            odd = %record.staked_odd,
            "Bet recorded"
        );
        Ok(record)
    }

    /// Settle a bet by id, then save. Pending → Pending skips the write.
    pub fn settle_bet(&mut self, id: BetId, outcome: Outcome) -> Result<BetRecord, LedgerError> {
        let mut ledger = self.ledger()?;
        let record = ledger.update_outcome(id, outcome)?.clone();

        if record.is_settled() {
            self.store.save(ledger.records())?;
        }
        Ok(record)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
