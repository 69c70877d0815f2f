//! STAKEBOOK — personal sports-bet ledger.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod engine;
pub mod storage;
pub mod format;
pub mod dashboard;
