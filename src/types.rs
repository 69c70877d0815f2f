//! Shared types for the STAKEBOOK ledger.
//!
//! These types form the data model used across all modules. The engine
//! only ever sees the strongly-typed `BetRecord`; loosely-typed sheet rows
//! are parsed into it at the storage boundary.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable identifier of a bet, assigned once when the bet is recorded.
///
/// Settlement looks bets up by this id, never by their position in the
/// stored sheet, so reordering or inserting rows cannot retarget an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BetId(Uuid);

impl BetId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BetId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for BetId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for BetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BetId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Settlement state of a bet.
///
/// `Pending` is the only initial state; `Won` and `Lost` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Outcome {
    #[default]
    Pending,
    Won,
    Lost,
}

impl Outcome {
    /// All outcomes, in the order the settle action offers them.
    pub const ALL: &'static [Outcome] = &[Outcome::Pending, Outcome::Won, Outcome::Lost];

    /// Whether the bet has been settled (Won or Lost).
    pub fn is_settled(&self) -> bool {
        !matches!(self, Outcome::Pending)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pending => write!(f, "Pending"),
            Outcome::Won => write!(f, "Won"),
            Outcome::Lost => write!(f, "Lost"),
        }
    }
}

/// Parse an outcome label (case-insensitive). Legacy sheet labels
/// (`Pendente`, `Green`, `Red`) are accepted as aliases.
impl std::str::FromStr for Outcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "pendente" => Ok(Outcome::Pending),
            "won" | "win" | "green" => Ok(Outcome::Won),
            "lost" | "loss" | "red" => Ok(Outcome::Lost),
            _ => Err(anyhow::anyhow!("Unknown outcome: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Bets
// ---------------------------------------------------------------------------

/// Largest stake a bet may record.
pub const MAX_STAKE: Decimal = dec!(1_000_000_000);

/// Largest odd a bet may record.
pub const MAX_ODD: Decimal = dec!(1_000_000);

/// User-supplied fields of a bet, before it enters the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBet {
    pub match_date: NaiveDate,
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    /// Betting market label, e.g. "Over 1.5" (open set).
    pub market: String,
    /// Informational only; not used in settlement.
    pub site_probability: Decimal,
    /// Informational only; not used in settlement.
    pub reference_odd: Decimal,
    pub bookmaker: String,
    /// The odd actually obtained.
    pub staked_odd: Decimal,
    /// Amount risked.
    pub stake: Decimal,
}

impl NewBet {
    /// Check the numeric invariants of a bet: `0 <= stake <= MAX_STAKE`,
    /// `0 < staked_odd <= MAX_ODD`.
    ///
    /// An odd at or below 1.0 is degenerate (a win returns nothing) but is
    /// accepted.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.stake < Decimal::ZERO {
            return Err(LedgerError::InvalidBet(format!(
                "stake must be non-negative, got {}",
                self.stake
            )));
        }
        if self.stake > MAX_STAKE {
            return Err(LedgerError::InvalidBet(format!(
                "stake must be at most {MAX_STAKE}, got {}",
                self.stake
            )));
        }
        if self.staked_odd <= Decimal::ZERO {
            return Err(LedgerError::InvalidBet(format!(
                "staked odd must be positive, got {}",
                self.staked_odd
            )));
        }
        if self.staked_odd > MAX_ODD {
            return Err(LedgerError::InvalidBet(format!(
                "staked odd must be at most {MAX_ODD}, got {}",
                self.staked_odd
            )));
        }
        Ok(())
    }
}

/// One row of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetRecord {
    pub id: BetId,
    pub match_date: NaiveDate,
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    pub market: String,
    pub site_probability: Decimal,
    pub reference_odd: Decimal,
    pub bookmaker: String,
    pub staked_odd: Decimal,
    pub stake: Decimal,
    pub outcome: Outcome,
    /// Realized result; always zero while `outcome` is Pending.
    pub profit_loss: Decimal,
}

impl BetRecord {
    /// Build a fresh Pending record from user input.
    pub fn pending(id: BetId, bet: NewBet) -> Self {
        Self {
            id,
            match_date: bet.match_date,
            league: bet.league,
            home_team: bet.home_team,
            away_team: bet.away_team,
            market: bet.market,
            site_probability: bet.site_probability,
            reference_odd: bet.reference_odd,
            bookmaker: bet.bookmaker,
            staked_odd: bet.staked_odd,
            stake: bet.stake,
            outcome: Outcome::Pending,
            profit_loss: Decimal::ZERO,
        }
    }

    /// Short human label used in pending lists: `Home x Away (Market)`.
    pub fn label(&self) -> String {
        format!("{} x {} ({})", self.home_team, self.away_team, self.market)
    }

    pub fn is_settled(&self) -> bool {
        self.outcome.is_settled()
    }

    #[cfg(test)]
    pub fn sample() -> Self {
        BetRecord::pending(
            BetId::new(),
            NewBet {
                match_date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
                league: "Brasileirão".to_string(),
                home_team: "Flamengo".to_string(),
                away_team: "Palmeiras".to_string(),
                market: "Over 1.5".to_string(),
                site_probability: Decimal::ZERO,
                reference_odd: Decimal::ZERO,
                bookmaker: "Bet365".to_string(),
                staked_odd: Decimal::new(150, 2),
                stake: Decimal::new(50, 0),
            },
        )
    }
}

impl fmt::Display for BetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} @ {} stake={:.2} odd={:.2} {} pnl={:.2}",
            self.match_date,
            self.label(),
            self.bookmaker,
            self.stake,
            self.staked_odd,
            self.outcome,
            self.profit_loss,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures of the ledger store collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Ledger store unavailable: {0}")]
    Unavailable(String),

    #[error("Ledger store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Malformed ledger row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },
}

/// Domain errors raised by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Bet not found: {0}")]
    UnknownBet(BetId),

    #[error("Bet {id} is already settled as {outcome}")]
    AlreadySettled { id: BetId, outcome: Outcome },

    #[error("Invalid bet: {0}")]
    InvalidBet(String),

    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
