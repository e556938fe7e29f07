// HTTP request handlers for the VantagePoint API
//
// Callers are identified by a plain address string in each request body —
// the explicit-capability style: the engine checks the supplied identity
// against its configured roles, and no signature verification happens at
// this layer. Mutating handlers hold the state lock for the whole
// operation, so each request is one atomic engine step.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app_state::SharedState;
use crate::engine::VAULT;
use crate::errors::EngineError;
use crate::market::{Outcome, Side};
use crate::orderbook::OrderDirection;

fn now_ts() -> u64 {
    Utc::now().timestamp().max(0) as u64
}

// ============================================================================
// REQUEST TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct FaucetRequest {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub owner: String,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateMarketRequest {
    pub caller: String,
    pub question: String,
    #[serde(default)]
    pub category: String,
    pub end_time: u64,
    pub resolution_time: u64,
    pub initial_liquidity: u64,
}

#[derive(Debug, Deserialize)]
pub struct TradeRequest {
    pub caller: String,
    pub side: Side,
    /// Collateral in for buys, shares in for sells.
    pub amount: u64,
    /// Slippage bound: min shares out (buy) or min collateral out (sell).
    #[serde(default)]
    pub min_out: u64,
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    pub side: Side,
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub caller: String,
    pub market_id: u64,
    pub direction: OrderDirection,
    pub limit_price_bps: u64,
    pub collateral: u64,
}

#[derive(Debug, Deserialize)]
pub struct CallerRequest {
    pub caller: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitOutcomeRequest {
    pub caller: String,
    pub outcome: Outcome,
}

#[derive(Debug, Deserialize)]
pub struct FileDisputeRequest {
    pub caller: String,
    pub proposed_outcome: Outcome,
}

#[derive(Debug, Deserialize)]
pub struct ResolveDisputeRequest {
    pub caller: String,
    pub upheld: bool,
    #[serde(default = "unresolved")]
    pub final_outcome: Outcome,
}

fn unresolved() -> Outcome {
    Outcome::Unresolved
}

#[derive(Debug, Deserialize)]
pub struct SetOracleRequest {
    pub caller: String,
    pub oracle: String,
}

// ============================================================================
// HEALTH & LEDGER
// ============================================================================

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "vantagepoint-engine",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": now_ts(),
    }))
}

pub async fn faucet(
    State(state): State<SharedState>,
    Json(req): Json<FaucetRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    let amount = app.config.faucet_amount;
    app.engine.collateral.mint(&req.address, amount)?;
    Ok(Json(json!({
        "success": true,
        "address": req.address,
        "granted": amount,
        "balance": app.engine.collateral.balance_of(&req.address),
    })))
}

pub async fn approve(
    State(state): State<SharedState>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    app.engine
        .collateral
        .approve(&req.owner, VAULT, req.amount as u128);
    Ok(Json(json!({
        "success": true,
        "owner": req.owner,
        "spender": VAULT,
        "allowance": req.amount,
    })))
}

pub async fn get_balance(
    State(state): State<SharedState>,
    Path(address): Path<String>,
) -> Json<Value> {
    let app = state.lock().unwrap();
    Json(json!({
        "address": address,
        "balance": app.engine.collateral.balance_of(&address),
        "allowance": app.engine.collateral.allowance(&address, VAULT),
    }))
}

// ============================================================================
// MARKETS
// ============================================================================

pub async fn create_market(
    State(state): State<SharedState>,
    Json(req): Json<CreateMarketRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    let market_id = app.engine.create_market(
        &req.caller,
        req.question,
        req.category,
        req.end_time,
        req.resolution_time,
        req.initial_liquidity as u128,
        now_ts(),
    )?;
    Ok(Json(json!({ "success": true, "market_id": market_id })))
}

pub async fn list_markets(State(state): State<SharedState>) -> Result<Json<Value>, EngineError> {
    let app = state.lock().unwrap();
    let mut markets = Vec::new();
    for id in app.engine.active_markets() {
        let market = app.engine.market(*id)?;
        markets.push(json!({
            "market_id": market.id,
            "question": market.question,
            "category": market.category,
            "status": market.status,
            "yes_price_bps": app.engine.price(*id)?,
            "total_liquidity": market.total_liquidity,
            "total_volume": market.total_volume,
            "end_time": market.end_time,
        }));
    }
    Ok(Json(json!({ "count": markets.len(), "markets": markets })))
}

pub async fn get_market(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, EngineError> {
    let app = state.lock().unwrap();
    let market = app.engine.market(id)?;
    Ok(Json(json!({ "market": market })))
}

pub async fn get_price(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, EngineError> {
    let app = state.lock().unwrap();
    let yes = app.engine.price(id)?;
    Ok(Json(json!({
        "market_id": id,
        "yes_price_bps": yes,
        "no_price_bps": 10_000 - yes,
    })))
}

pub async fn preview_trade(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Query(params): Query<PreviewParams>,
) -> Result<Json<Value>, EngineError> {
    let app = state.lock().unwrap();
    let preview = app.engine.preview(id, params.side, params.amount as u128)?;
    Ok(Json(json!({ "market_id": id, "preview": preview })))
}

pub async fn buy(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(req): Json<TradeRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    let shares_out = app.engine.buy(
        &req.caller,
        id,
        req.side,
        req.amount as u128,
        req.min_out as u128,
        now_ts(),
    )?;
    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "side": req.side,
        "shares_out": shares_out,
        "yes_price_bps": app.engine.price(id)?,
    })))
}

pub async fn sell(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(req): Json<TradeRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    let payout = app.engine.sell(
        &req.caller,
        id,
        req.side,
        req.amount as u128,
        req.min_out as u128,
        now_ts(),
    )?;
    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "side": req.side,
        "collateral_out": payout,
        "yes_price_bps": app.engine.price(id)?,
    })))
}

pub async fn get_position(
    State(state): State<SharedState>,
    Path((id, address)): Path<(u64, String)>,
) -> Result<Json<Value>, EngineError> {
    let app = state.lock().unwrap();
    // Market lookup first so unknown ids are a 404, not an empty position.
    app.engine.market(id)?;
    let position = app.engine.position(id, &address);
    Ok(Json(json!({
        "market_id": id,
        "address": address,
        "position": position,
    })))
}

pub async fn markets_by_creator(
    State(state): State<SharedState>,
    Path(address): Path<String>,
) -> Json<Value> {
    let app = state.lock().unwrap();
    Json(json!({
        "creator": address,
        "market_ids": app.engine.markets_by_creator(&address),
    }))
}

// ============================================================================
// LIMIT ORDERS
// ============================================================================

pub async fn place_order(
    State(state): State<SharedState>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    let order_id = app.engine.place_order(
        &req.caller,
        req.market_id,
        req.direction,
        req.limit_price_bps,
        req.collateral as u128,
        now_ts(),
    )?;
    Ok(Json(json!({ "success": true, "order_id": order_id })))
}

pub async fn get_order(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, EngineError> {
    let app = state.lock().unwrap();
    let order = app.engine.order(id)?;
    Ok(Json(json!({ "order": order })))
}

pub async fn list_orders(
    State(state): State<SharedState>,
    Path(market_id): Path<u64>,
) -> Result<Json<Value>, EngineError> {
    let app = state.lock().unwrap();
    app.engine.market(market_id)?;
    let orders = app.engine.orders_for_market(market_id);
    Ok(Json(json!({ "market_id": market_id, "orders": orders })))
}

pub async fn cancel_order(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    app.engine.cancel_order(&req.caller, id, now_ts())?;
    Ok(Json(json!({ "success": true, "order_id": id })))
}

pub async fn fill_order(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    let shares = app.engine.fill_order(&req.caller, id, now_ts())?;
    Ok(Json(json!({
        "success": true,
        "order_id": id,
        "shares_out": shares,
    })))
}

// ============================================================================
// RESOLUTION & SETTLEMENT
// ============================================================================

pub async fn submit_outcome(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(req): Json<SubmitOutcomeRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    app.engine
        .submit_outcome(&req.caller, id, req.outcome, now_ts())?;
    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "outcome": req.outcome,
    })))
}

pub async fn file_dispute(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(req): Json<FileDisputeRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    let bond_id = app
        .engine
        .file_dispute(&req.caller, id, req.proposed_outcome, now_ts())?;
    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "bond_id": bond_id,
    })))
}

pub async fn resolve_dispute(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(req): Json<ResolveDisputeRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    app.engine
        .resolve_dispute(&req.caller, id, req.upheld, req.final_outcome, now_ts())?;
    let market = app.engine.market(id)?;
    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "upheld": req.upheld,
        "outcome": market.outcome,
    })))
}

pub async fn finalize(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    app.engine.finalize(id, now_ts())?;
    let market = app.engine.market(id)?;
    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "outcome": market.outcome,
    })))
}

pub async fn claim(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    let payout = app.engine.claim(&req.caller, id, now_ts())?;
    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "payout": payout,
    })))
}

// ============================================================================
// OBSERVABILITY & ADMIN
// ============================================================================

pub async fn get_events(State(state): State<SharedState>) -> Json<Value> {
    let app = state.lock().unwrap();
    Json(json!({ "events": app.engine.events() }))
}

pub async fn set_oracle(
    State(state): State<SharedState>,
    Json(req): Json<SetOracleRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    app.engine.set_oracle(&req.caller, req.oracle.clone())?;
    Ok(Json(json!({ "success": true, "oracle": req.oracle })))
}

pub async fn sweep_fees(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(req): Json<CallerRequest>,
) -> Result<Json<Value>, EngineError> {
    let mut app = state.lock().unwrap();
    let amount = app.engine.sweep_fees(&req.caller, id)?;
    Ok(Json(json!({
        "success": true,
        "market_id": id,
        "swept": amount,
    })))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Builds the full API router. Shared between main and the integration
/// tests, which drive it in-process.
pub fn router(state: SharedState) -> Router {
    Router::new()
        // ===== HEALTH & LEDGER =====
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/faucet", post(faucet))
        .route("/approve", post(approve))
        .route("/balance/:address", get(get_balance))
        // ===== MARKETS & TRADING =====
        .route("/markets", get(list_markets).post(create_market))
        .route("/markets/:id", get(get_market))
        .route("/markets/:id/price", get(get_price))
        .route("/markets/:id/preview", get(preview_trade))
        .route("/markets/:id/buy", post(buy))
        .route("/markets/:id/sell", post(sell))
        .route("/markets/:id/position/:address", get(get_position))
        .route("/markets/:id/orders", get(list_orders))
        .route("/creators/:address/markets", get(markets_by_creator))
        // ===== LIMIT ORDERS =====
        .route("/orders", post(place_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/fill", post(fill_order))
        // ===== RESOLUTION & SETTLEMENT =====
        .route("/markets/:id/outcome", post(submit_outcome))
        .route("/markets/:id/dispute", post(file_dispute))
        .route("/markets/:id/dispute/resolve", post(resolve_dispute))
        .route("/markets/:id/finalize", post(finalize))
        .route("/markets/:id/claim", post(claim))
        // ===== OBSERVABILITY & ADMIN =====
        .route("/events", get(get_events))
        .route("/admin/oracle", post(set_oracle))
        .route("/admin/sweep/:id", post(sweep_fees))
        .with_state(state)
}
