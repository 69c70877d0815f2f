//! Aggregation — rolls a ledger of bets into performance metrics.
//!
//! Only settled bets (Won or Lost) count. Pending bets are excluded from
//! every metric and from the equity curve.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;

use crate::types::{BetId, BetRecord, LedgerError, Outcome};

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

/// One point of the cumulative profit curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    /// Position in the curve, 0..n-1.
    pub index: usize,
    pub match_date: NaiveDate,
    pub bet_id: BetId,
    /// Running sum of profit/loss up to and including this bet.
    pub cumulative: Decimal,
}

/// Portfolio-level performance of a ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub total_profit: Decimal,
    pub total_staked: Decimal,
    /// `total_profit / total_staked * 100`, or 0 when nothing was staked.
    pub roi_percent: Decimal,
    pub settled_count: usize,
    pub won_count: usize,
    pub lost_count: usize,
    pub pending_count: usize,
    /// Percentage of settled bets that won, or 0 when none are settled.
    pub win_rate: Decimal,
    pub equity_curve: Vec<EquityPoint>,
}

impl PerformanceSummary {
    /// Summary of a ledger with no settled bets.
    pub fn empty() -> Self {
        Self {
            total_profit: Decimal::ZERO,
            total_staked: Decimal::ZERO,
            roi_percent: Decimal::ZERO,
            settled_count: 0,
            won_count: 0,
            lost_count: 0,
            pending_count: 0,
            win_rate: Decimal::ZERO,
            equity_curve: Vec::new(),
        }
    }

    /// Cumulative values of the equity curve, in curve order.
    pub fn equity_values(&self) -> Vec<Decimal> {
        self.equity_curve.iter().map(|p| p.cumulative).collect()
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "profit={:.2} staked={:.2} roi={:.2}% | settled={} (W{}/L{}) pending={} | win_rate={:.1}%",
            self.total_profit,
            self.total_staked,
            self.roi_percent,
            self.settled_count,
            self.won_count,
            self.lost_count,
            self.pending_count,
            self.win_rate,
        )
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregate a ledger into a `PerformanceSummary`.
///
/// Fails with `LedgerError::Overflow` when a total leaves the `Decimal` range.
pub fn aggregate(records: &[BetRecord]) -> Result<PerformanceSummary, LedgerError> {
    let mut settled: Vec<&BetRecord> = records.iter().filter(|r| r.is_settled()).collect();
    let pending_count = records.len() - settled.len();

    if settled.is_empty() {
        return Ok(PerformanceSummary {
            pending_count,
            ..PerformanceSummary::empty()
        });
    }

    let total_profit = checked_sum(settled.iter().map(|r| r.profit_loss), "total profit")?;
    let total_staked = checked_sum(settled.iter().map(|r| r.stake), "total staked")?;
    let roi_percent = if total_staked > Decimal::ZERO {
        total_profit
            .checked_div(total_staked)
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .ok_or(LedgerError::Overflow("ROI"))?
    } else {
        Decimal::ZERO
    };

    let won_count = settled.iter().filter(|r| r.outcome == Outcome::Won).count();
    let lost_count = settled.len() - won_count;
    let win_rate = Decimal::from(won_count) / Decimal::from(settled.len()) * dec!(100);

    // Stable: bets on the same date keep their ledger order.
    settled.sort_by_key(|r| r.match_date);
    let equity_curve = equity_curve(&settled)?;

    Ok(PerformanceSummary {
        total_profit,
        total_staked,
        roi_percent,
        settled_count: settled.len(),
        won_count,
        lost_count,
        pending_count,
        win_rate,
        equity_curve,
    })
}

fn checked_sum(
    mut values: impl Iterator<Item = Decimal>,
    what: &'static str,
) -> Result<Decimal, LedgerError> {
    values.try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(v).ok_or(LedgerError::Overflow(what))
    })
}

/// Running cumulative sum of profit/loss over already-ordered bets.
fn equity_curve(ordered: &[&BetRecord]) -> Result<Vec<EquityPoint>, LedgerError> {
    let mut running = Decimal::ZERO;
    ordered
        .iter()
        .enumerate()
        .map(|(index, r)| {
            running = running
                .checked_add(r.profit_loss)
                .ok_or(LedgerError::Overflow("equity curve"))?;
            Ok(EquityPoint {
                index,
                match_date: r.match_date,
                bet_id: r.id,
                cumulative: running,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
