//! Configuration loading from TOML.
//!
//! Reads `config.toml` (or the file named by `STAKEBOOK_CONFIG`) and
//! deserializes into strongly-typed structs.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;

/// Default config file path.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub ledger: LedgerConfig,
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LedgerConfig {
    /// Path of the JSON ledger file.
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

/// Choices and defaults offered when recording a bet.
#[derive(Debug, Deserialize, Clone)]
pub struct FormConfig {
    pub markets: Vec<String>,
    pub bookmakers: Vec<String>,
    pub default_odd: Decimal,
    pub default_stake: Decimal,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            markets: vec!["Over 1.5".into(), "Under 3.5".into(), "Match Odds".into()],
            bookmakers: vec!["Bet365".into(), "Betfair".into(), "Pinnacle".into()],
            default_odd: dec!(1.50),
            default_stake: dec!(50.0),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    /// Currency symbol prefixed to money amounts.
    pub currency: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency: "R$".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Config path from `STAKEBOOK_CONFIG`, falling back to `config.toml`.
    pub fn path_from_env() -> String {
        std::env::var("STAKEBOOK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config() {
        // Only runs its assertions when config.toml is in the working directory.
        let result = AppConfig::load("config.toml");
        if let Ok(cfg) = result {
            assert!(!cfg.ledger.path.is_empty());
            assert!(cfg.dashboard.port > 0);
            assert!(!cfg.form.markets.is_empty());
            assert!(cfg.form.default_odd > Decimal::ZERO);
        }
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [ledger]
            path = "bets.json"

            [dashboard]
            enabled = false
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(cfg.ledger.path, "bets.json");
        assert!(!cfg.dashboard.enabled);
        assert_eq!(cfg.form.bookmakers, vec!["Bet365", "Betfair", "Pinnacle"]);
        assert_eq!(cfg.form.default_odd, dec!(1.5));
        assert_eq!(cfg.form.default_stake, dec!(50));
        assert_eq!(cfg.display.currency, "R$");
    }

    #[test]
    fn test_form_section_overrides() {
        let cfg = AppConfig::from_toml(
            r#"
            [ledger]
            path = "bets.json"

            [dashboard]
            enabled = true
            port = 3000

            [form]
            markets = ["BTTS"]
            bookmakers = ["Betano"]
            default_odd = 2.0
            default_stake = 10.0

            [display]
            currency = "€"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.form.markets, vec!["BTTS"]);
        assert_eq!(cfg.form.default_odd, dec!(2));
        assert_eq!(cfg.display.currency, "€");
    }

    #[test]
    fn test_missing_ledger_section_fails() {
        assert!(AppConfig::from_toml("[dashboard]\nenabled = true\nport = 1\n").is_err());
    }
}
