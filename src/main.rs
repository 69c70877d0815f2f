//! STAKEBOOK — personal sports-bet ledger.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the ledger file, prints the current performance, and serves the
//! dashboard API until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use stakebook::config;
use stakebook::dashboard::{self, DashboardState};
use stakebook::engine::Bookkeeper;
use stakebook::format;
use stakebook::storage::JsonFileStore;

const BANNER: &str = r#"
 ___ _        _         _              _
/ __| |_ __ _| |_____  | |__  ___  ___| |__
\__ \  _/ _` | / / -_) | '_ \/ _ \/ _ \ / /
|___/\__\__,_|_\_\___| |_.__/\___/\___/_\_\

  Bet ledger, settlement and ROI
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load(&config::AppConfig::path_from_env())?;

    init_logging();

    println!("{BANNER}");
    info!(
        ledger = %cfg.ledger.path,
        dashboard = cfg.dashboard.enabled,
        currency = %cfg.display.currency,
        "STAKEBOOK starting up"
    );

    // -- Open ledger -----------------------------------------------------

    let store = JsonFileStore::open(&cfg.ledger.path)?;
    let bookkeeper = Bookkeeper::new(Box::new(store));

    match bookkeeper.summary() {
        Ok(summary) if summary.settled_count == 0 && summary.pending_count == 0 => {
            info!("Ledger is empty. Record a bet to get started.");
        }
        Ok(summary) => {
            info!(
                profit = %format::money(summary.total_profit, &cfg.display.currency),
                roi = %format::percent(summary.roi_percent),
                settled = summary.settled_count,
                pending = summary.pending_count,
                "Current performance"
            );
        }
        Err(e) => warn!(error = %e, "Could not compute current performance"),
    }

    if !cfg.dashboard.enabled {
        info!("Dashboard disabled. Exiting.");
        return Ok(());
    }

    // -- Serve -----------------------------------------------------------

    let state = Arc::new(DashboardState::new(
        bookkeeper,
        cfg.form.clone(),
        cfg.display.currency.clone(),
    ));

    info!(port = cfg.dashboard.port, "Press Ctrl+C to stop.");
    dashboard::serve(state, cfg.dashboard.port, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received.");
    })
    .await?;

    info!("STAKEBOOK shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stakebook=info"));

    let json_logging = std::env::var("STAKEBOOK_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
