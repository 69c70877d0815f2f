//! Dashboard API route handlers.
//!
//! All endpoints return JSON. Every handler takes the bookkeeper lock for
//! the whole load → compute → save cycle, so a process has one writer.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, warn};

use crate::config::FormConfig;
use crate::engine::{Bookkeeper, EquityPoint, PerformanceSummary};
use crate::format;
use crate::types::{BetId, BetRecord, LedgerError, NewBet, Outcome};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub bookkeeper: Mutex<Bookkeeper>,
    pub form: FormConfig,
    pub currency: String,
}

impl DashboardState {
    pub fn new(bookkeeper: Bookkeeper, form: FormConfig, currency: impl Into<String>) -> Self {
        Self {
            bookkeeper: Mutex::new(bookkeeper),
            form,
            currency: currency.into(),
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error returned to API clients as `{ "error": "..." }`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Ledger(LedgerError),
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        ApiError::Ledger(e)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Ledger(e) => {
                let status = match &e {
                    LedgerError::UnknownBet(_) => StatusCode::NOT_FOUND,
                    LedgerError::AlreadySettled { .. } => StatusCode::CONFLICT,
                    LedgerError::InvalidBet(_) => StatusCode::BAD_REQUEST,
                    LedgerError::Overflow(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    LedgerError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                if status == StatusCode::SERVICE_UNAVAILABLE {
                    error!(error = %e, "Ledger store failure");
                } else {
                    warn!(error = %e, "Request rejected");
                }
                (status, e.to_string())
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: PerformanceSummary,
    pub profit_display: String,
    pub staked_display: String,
    pub roi_display: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingBetView {
    pub id: BetId,
    pub match_date: NaiveDate,
    pub label: String,
    pub staked_odd: Decimal,
    pub stake: Decimal,
    /// Outcomes the settle action offers.
    pub choices: Vec<Outcome>,
}

impl From<&BetRecord> for PendingBetView {
    fn from(r: &BetRecord) -> Self {
        Self {
            id: r.id,
            match_date: r.match_date,
            label: r.label(),
            staked_odd: r.staked_odd,
            stake: r.stake,
            choices: Outcome::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FormOptions {
    pub markets: Vec<String>,
    pub bookmakers: Vec<String>,
    pub default_odd: Decimal,
    pub default_stake: Decimal,
    pub today: NaiveDate,
}

/// Body of `POST /api/bets`. Omitted fields take the configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewBetRequest {
    pub match_date: Option<NaiveDate>,
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    pub market: Option<String>,
    pub site_probability: Option<Decimal>,
    pub reference_odd: Option<Decimal>,
    pub bookmaker: Option<String>,
    pub staked_odd: Option<Decimal>,
    pub stake: Option<Decimal>,
}

impl NewBetRequest {
    fn into_new_bet(self, form: &FormConfig) -> NewBet {
        NewBet {
            match_date: self.match_date.unwrap_or_else(|| Local::now().date_naive()),
            league: self.league,
            home_team: self.home_team,
            away_team: self.away_team,
            market: self
                .market
                .or_else(|| form.markets.first().cloned())
                .unwrap_or_default(),
            site_probability: self.site_probability.unwrap_or(Decimal::ZERO),
            reference_odd: self.reference_odd.unwrap_or(Decimal::ZERO),
            bookmaker: self
                .bookmaker
                .or_else(|| form.bookmakers.first().cloned())
                .unwrap_or_default(),
            staked_odd: self.staked_odd.unwrap_or(form.default_odd),
            stake: self.stake.unwrap_or(form.default_stake),
        }
    }
}

/// Body of `POST /api/bets/:id/settle`.
#[derive(Debug, Clone, Deserialize)]
pub struct SettleRequest {
    pub outcome: String,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/summary
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state.bookkeeper.lock().await.summary()?;
    Ok(Json(SummaryResponse {
        profit_display: format::money(summary.total_profit, &state.currency),
        staked_display: format::money(summary.total_staked, &state.currency),
        roi_display: format::percent(summary.roi_percent),
        summary,
    }))
}

/// GET /api/equity-curve
pub async fn get_equity_curve(
    State(state): State<AppState>,
) -> Result<Json<Vec<EquityPoint>>, ApiError> {
    let summary = state.bookkeeper.lock().await.summary()?;
    Ok(Json(summary.equity_curve))
}

/// GET /api/bets
pub async fn get_bets(State(state): State<AppState>) -> Result<Json<Vec<BetRecord>>, ApiError> {
    let ledger = state.bookkeeper.lock().await.ledger()?;
    Ok(Json(ledger.into_records()))
}

/// GET /api/bets/pending
pub async fn get_pending(
    State(state): State<AppState>,
) -> Result<Json<Vec<PendingBetView>>, ApiError> {
    let pending = state.bookkeeper.lock().await.pending()?;
    Ok(Json(pending.iter().map(PendingBetView::from).collect()))
}

/// GET /api/form-options
pub async fn get_form_options(State(state): State<AppState>) -> Json<FormOptions> {
    Json(FormOptions {
        markets: state.form.markets.clone(),
        bookmakers: state.form.bookmakers.clone(),
        default_odd: state.form.default_odd,
        default_stake: state.form.default_stake,
        today: Local::now().date_naive(),
    })
}

/// POST /api/bets
pub async fn create_bet(
    State(state): State<AppState>,
    Json(req): Json<NewBetRequest>,
) -> Result<(StatusCode, Json<BetRecord>), ApiError> {
    let bet = req.into_new_bet(&state.form);
    let record = state.bookkeeper.lock().await.record_bet(bet)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /api/bets/:id/settle
pub async fn settle_bet(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SettleRequest>,
) -> Result<Json<BetRecord>, ApiError> {
    let id: BetId = id
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid bet id {id:?}: {e}")))?;
    let outcome: Outcome = req
        .outcome
        .parse()
        .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?;

    let record = state.bookkeeper.lock().await.settle_bet(id, outcome)?;
    Ok(Json(record))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
