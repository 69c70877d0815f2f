//! Settlement — turns a stake, an odd, and an outcome into realized P&L.
//!
//! Values are kept at full `Decimal` precision; rounding to cents happens
//! only when formatting for display.

use rust_decimal::Decimal;

use crate::types::{LedgerError, Outcome};

/// Realized profit/loss of a bet.
///
/// - Won: net return, `stake * odd - stake` (not the gross payout).
/// - Lost: `-stake`.
/// - Pending: zero. Not a real settlement.
///
/// Returns `LedgerError::Overflow` when the payout does not fit a `Decimal`.
pub fn settle(
    stake: Decimal,
    staked_odd: Decimal,
    outcome: Outcome,
) -> Result<Decimal, LedgerError> {
    match outcome {
        Outcome::Won => stake
            .checked_mul(staked_odd)
            .and_then(|payout| payout.checked_sub(stake))
            .ok_or(LedgerError::Overflow("settlement payout")),
        Outcome::Lost => Ok(-stake),
        Outcome::Pending => Ok(Decimal::ZERO),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
