use crate::errors::{SimError, SimResult};
use crate::models::payoff::{self, PayoffCurve};
use crate::models::{volatility, OptionKind};
use crate::state::{lookup_symbol, AppState, SYMBOLS};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use portable_atomic::Ordering::Relaxed;
use std::sync::Arc;

/// Strike input is only accepted within this band around spot.
const STRIKE_BAND_LOW: f64 = 0.8;
const STRIKE_BAND_HIGH: f64 = 1.2;
const MAX_DAYS_TO_EXPIRY: u32 = 180;

#[derive(serde::Deserialize)]
pub struct HistoryQuery {
    pub symbol: String,
}

#[derive(serde::Deserialize)]
pub struct SimulateQuery {
    pub symbol: String,
    pub kind: OptionKind,
    pub days: u32,
    pub strike: f64,
    pub investment: f64,
}

#[derive(serde::Serialize)]
pub struct SimulateResponse {
    pub symbol: &'static str,
    pub name: &'static str,
    pub name_kr: &'static str,
    pub kind: OptionKind,
    pub spot: f64,
    pub strike: f64,
    pub days_to_expiry: u32,
    pub investment: f64,
    pub risk_free_rate: f64,
    pub annual_volatility: f64,
    pub theoretical_price: f64,
    pub contracts: f64,
    pub contract_multiplier: f64,
    /// Set when the theoretical price came out non-positive and the payoff
    /// degenerated to the flat loss line.
    pub warning: Option<String>,
    pub payoff: PayoffCurve,
}

/// GET /api/symbols -- the fixed three-equity catalog
pub async fn get_symbols() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "symbols": SYMBOLS }))
}

/// GET /api/history -- daily bars for the candlestick chart, plus spot and
/// the allowed strike band
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    state.counters.history_requests.fetch_add(1, Relaxed);

    let sym = lookup_symbol(&params.symbol)
        .ok_or_else(|| reject(&SimError::BadParam(format!("unknown symbol: {}", params.symbol))))?;

    let bars = state
        .history
        .get(sym.ticker, state.config.history_window_days)
        .await
        .map_err(|e| {
            state.counters.provider_errors.fetch_add(1, Relaxed);
            tracing::warn!(symbol = sym.ticker, error = %e, "history fetch failed");
            reject(&e)
        })?;

    // The provider never returns an empty Ok, so last() is present.
    let spot = bars.last().map(|b| b.close).unwrap_or(0.0);

    Ok(Json(serde_json::json!({
        "symbol": sym.ticker,
        "name": sym.name,
        "name_kr": sym.name_kr,
        "spot": spot,
        "strike_min": STRIKE_BAND_LOW * spot,
        "strike_max": STRIKE_BAND_HIGH * spot,
        "bars": &*bars,
    })))
}

/// GET /api/simulate -- the full pipeline: history -> volatility ->
/// Black-Scholes -> payoff grid
pub async fn get_simulate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SimulateQuery>,
) -> Result<Json<SimulateResponse>, (StatusCode, Json<serde_json::Value>)> {
    let sym = lookup_symbol(&params.symbol)
        .ok_or_else(|| reject(&SimError::BadParam(format!("unknown symbol: {}", params.symbol))))?;

    validate_days(params.days).map_err(|e| reject(&e))?;
    validate_investment(params.investment).map_err(|e| reject(&e))?;

    let bars = state
        .history
        .get(sym.ticker, state.config.history_window_days)
        .await
        .map_err(|e| {
            state.counters.provider_errors.fetch_add(1, Relaxed);
            tracing::warn!(symbol = sym.ticker, error = %e, "history fetch failed");
            reject(&e)
        })?;

    let spot = bars.last().map(|b| b.close).unwrap_or(0.0);
    validate_strike(params.strike, spot).map_err(|e| reject(&e))?;

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let sigma = volatility::estimate_annual_volatility(&closes, state.config.trading_days_per_year)
        .map_err(|e| {
            tracing::warn!(symbol = sym.ticker, error = %e, "refusing to price");
            reject(&e)
        })?;

    let t_years = params.days as f64 / 365.0;
    let price = state.pricer.price(
        spot,
        params.strike,
        t_years,
        state.config.risk_free_rate,
        sigma,
        params.kind,
    );

    let warning = if price <= 0.0 {
        state.counters.degenerate_prices.fetch_add(1, Relaxed);
        tracing::warn!(
            symbol = sym.ticker,
            kind = %params.kind,
            strike = params.strike,
            price = price,
            "theoretical price is non-positive, falling back to zero contracts"
        );
        Some("theoretical price is zero or negative; check the parameters".to_string())
    } else {
        None
    };

    let curve = payoff::simulate_payoff(
        price,
        params.investment,
        state.config.contract_multiplier,
        spot,
        params.strike,
        params.kind,
        payoff::DEFAULT_GRID_SIZE,
    );

    state.counters.simulations_served.fetch_add(1, Relaxed);
    tracing::info!(
        symbol = sym.ticker,
        kind = %params.kind,
        days = params.days,
        sigma = sigma,
        price = price,
        contracts = curve.contracts,
        "simulation served"
    );

    Ok(Json(SimulateResponse {
        symbol: sym.ticker,
        name: sym.name,
        name_kr: sym.name_kr,
        kind: params.kind,
        spot,
        strike: params.strike,
        days_to_expiry: params.days,
        investment: params.investment,
        risk_free_rate: state.config.risk_free_rate,
        annual_volatility: sigma,
        theoretical_price: price,
        contracts: curve.contracts,
        contract_multiplier: state.config.contract_multiplier,
        warning,
        payoff: curve,
    }))
}

/// GET /api/counters -- performance counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "simulations_served": state.counters.simulations_served.load(Relaxed),
        "history_requests": state.counters.history_requests.load(Relaxed),
        "history_fetches": state.history.fetches.load(Relaxed),
        "cache_hits": state.history.hits.load(Relaxed),
        "provider_errors": state.counters.provider_errors.load(Relaxed),
        "degenerate_prices": state.counters.degenerate_prices.load(Relaxed),
    }))
}

// ── Validation ──

fn validate_days(days: u32) -> SimResult<()> {
    if days == 0 || days > MAX_DAYS_TO_EXPIRY {
        return Err(SimError::BadParam(format!(
            "days must be in 1..={MAX_DAYS_TO_EXPIRY}, got {days}"
        )));
    }
    Ok(())
}

fn validate_investment(investment: f64) -> SimResult<()> {
    if !investment.is_finite() || investment <= 0.0 {
        return Err(SimError::BadParam(format!(
            "investment must be a positive amount, got {investment}"
        )));
    }
    Ok(())
}

fn validate_strike(strike: f64, spot: f64) -> SimResult<()> {
    if !strike.is_finite() || strike <= 0.0 {
        return Err(SimError::BadParam(format!(
            "strike must be positive, got {strike}"
        )));
    }
    let (lo, hi) = (STRIKE_BAND_LOW * spot, STRIKE_BAND_HIGH * spot);
    if strike < lo || strike > hi {
        return Err(SimError::BadParam(format!(
            "strike {strike} outside allowed band [{lo:.0}, {hi:.0}]"
        )));
    }
    Ok(())
}

fn reject(e: &SimError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match e {
        SimError::BadParam(_) => StatusCode::BAD_REQUEST,
        SimError::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SimError::DataUnavailable(_)
        | SimError::Provider { .. }
        | SimError::Network(_)
        | SimError::Parse(_) => StatusCode::BAD_GATEWAY,
        SimError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": e.to_string() })))
}
