//! Core engine — settlement, aggregation, and ledger mutation.

pub mod settlement;
pub mod aggregate;
pub mod ledger;
pub mod bookkeeper;

pub use aggregate::{aggregate, EquityPoint, PerformanceSummary};
pub use bookkeeper::Bookkeeper;
pub use ledger::Ledger;
pub use settlement::settle;
