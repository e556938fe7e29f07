// ============================================================================
// Engine - VantagePoint Market Engine
// ============================================================================
//
// The single top-level owner of every mutable store: market records with
// their two share ledgers, the limit-order registry, truth bonds, per-holder
// positions, the collateral ledger, and the event stream. All ids are
// monotonically increasing u64s starting at 1, never reused.
//
// Every mutating method is check-first: parameters, authorization, balances,
// and all fallible arithmetic are verified before the first state change, so
// a failure is always a whole-operation no-op. Time-gated methods take an
// explicit `now` (unix seconds) supplied by the HTTP layer, which keeps the
// state machine deterministic under test.
//
// ============================================================================

mod orders;
mod resolve;
mod settle;
mod trade;

use crate::errors::EngineError;
use crate::events::{EngineEvent, EventRecord};
use crate::ledger::CollateralLedger;
use crate::market::{
    amm, Market, MarketStatus, Outcome, Side, INITIAL_SHARE_SUPPLY, MIN_INITIAL_LIQUIDITY,
};
use crate::orderbook::LimitOrder;
use crate::position::Position;
use crate::resolution::TruthBond;
use crate::shares::ShareLedger;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

/// Address identity under which the engine holds pooled collateral, share
/// reserves, and order escrow.
pub const VAULT: &str = "vp:vault";

/// A market record together with its two outcome share ledgers.
#[derive(Debug, Clone, Serialize)]
pub struct MarketState {
    pub market: Market,
    pub yes_ledger: ShareLedger,
    pub no_ledger: ShareLedger,
}

impl MarketState {
    pub fn ledger(&self, side: Side) -> &ShareLedger {
        match side {
            Side::Yes => &self.yes_ledger,
            Side::No => &self.no_ledger,
        }
    }

    pub fn ledger_mut(&mut self, side: Side) -> &mut ShareLedger {
        match side {
            Side::Yes => &mut self.yes_ledger,
            Side::No => &mut self.no_ledger,
        }
    }
}

/// The prediction-market state machine.
#[derive(Debug)]
pub struct Engine {
    pub collateral: CollateralLedger,

    markets: HashMap<u64, MarketState>,
    orders: HashMap<u64, LimitOrder>,
    bonds: HashMap<u64, TruthBond>,
    positions: HashMap<(u64, String), Position>,

    /// Ids of markets that have not reached a terminal status.
    active_markets: Vec<u64>,
    markets_by_creator: HashMap<String, Vec<u64>>,
    orders_by_market: HashMap<u64, Vec<u64>>,

    events: Vec<EventRecord>,

    next_market_id: u64,
    next_order_id: u64,
    next_bond_id: u64,

    oracle: String,
    governance: String,
}

impl Engine {
    pub fn new(oracle: String, governance: String) -> Self {
        Self {
            collateral: CollateralLedger::new(),
            markets: HashMap::new(),
            orders: HashMap::new(),
            bonds: HashMap::new(),
            positions: HashMap::new(),
            active_markets: Vec::new(),
            markets_by_creator: HashMap::new(),
            orders_by_market: HashMap::new(),
            events: Vec::new(),
            next_market_id: 1,
            next_order_id: 1,
            next_bond_id: 1,
            oracle,
            governance,
        }
    }

    // ========================================================================
    // MARKET REGISTRY
    // ========================================================================

    /// Opens a new binary market seeded with `initial_liquidity` collateral
    /// pulled from the caller. Both share reserves start at
    /// INITIAL_SHARE_SUPPLY, so the opening YES price is exactly 50%.
    #[allow(clippy::too_many_arguments)]
    pub fn create_market(
        &mut self,
        caller: &str,
        question: String,
        category: String,
        end_time: u64,
        resolution_time: u64,
        initial_liquidity: u128,
        now: u64,
    ) -> Result<u64, EngineError> {
        if question.trim().is_empty() {
            return Err(EngineError::InvalidParams("question must not be empty".into()));
        }
        if initial_liquidity < MIN_INITIAL_LIQUIDITY {
            return Err(EngineError::BelowMinimumLiquidity);
        }
        if end_time <= now {
            return Err(EngineError::InvalidParams("end_time must be in the future".into()));
        }
        if resolution_time <= end_time {
            return Err(EngineError::InvalidParams(
                "resolution_time must follow end_time".into(),
            ));
        }
        let dispute_end_time = resolution_time
            .checked_add(crate::market::DISPUTE_WINDOW_SECS)
            .ok_or(EngineError::ArithmeticOverflow)?;
        self.collateral.can_pull(VAULT, caller, initial_liquidity)?;

        let id = self.next_market_id;
        self.next_market_id += 1;

        self.collateral
            .transfer_from(VAULT, caller, VAULT, initial_liquidity)?;

        let mut market = Market {
            id,
            question: question.clone(),
            category,
            creator: caller.to_string(),
            end_time,
            resolution_time,
            dispute_end_time,
            status: MarketStatus::Open,
            outcome: Outcome::Unresolved,
            yes_reserve: 0,
            no_reserve: 0,
            k: 0,
            total_liquidity: initial_liquidity,
            total_volume: 0,
            yes_volume: 0,
            no_volume: 0,
            fees_accrued: 0,
            oracle_settled: false,
            truth_bond: None,
            created_at: now,
        };
        market.set_reserves(INITIAL_SHARE_SUPPLY, INITIAL_SHARE_SUPPLY);

        let state = MarketState {
            market,
            yes_ledger: ShareLedger::new(VAULT, format!("VP-{}-YES", id), INITIAL_SHARE_SUPPLY),
            no_ledger: ShareLedger::new(VAULT, format!("VP-{}-NO", id), INITIAL_SHARE_SUPPLY),
        };
        self.markets.insert(id, state);
        self.active_markets.push(id);
        self.markets_by_creator
            .entry(caller.to_string())
            .or_default()
            .push(id);

        info!(market_id = id, creator = caller, "market created");
        self.emit(
            now,
            EngineEvent::MarketCreated {
                market_id: id,
                creator: caller.to_string(),
                question,
                initial_liquidity,
                end_time,
                resolution_time,
            },
        );
        Ok(id)
    }

    // ========================================================================
    // READ SURFACE
    // ========================================================================

    pub fn market(&self, id: u64) -> Result<&Market, EngineError> {
        self.markets
            .get(&id)
            .map(|s| &s.market)
            .ok_or(EngineError::MarketNotFound(id))
    }

    pub fn market_state(&self, id: u64) -> Result<&MarketState, EngineError> {
        self.markets.get(&id).ok_or(EngineError::MarketNotFound(id))
    }

    /// Current YES price of a market in basis points.
    pub fn price(&self, id: u64) -> Result<u64, EngineError> {
        let market = self.market(id)?;
        amm::yes_price_bps(market.yes_reserve, market.no_reserve)
    }

    pub fn active_markets(&self) -> &[u64] {
        &self.active_markets
    }

    pub fn markets_by_creator(&self, creator: &str) -> &[u64] {
        self.markets_by_creator
            .get(creator)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn order(&self, id: u64) -> Result<&LimitOrder, EngineError> {
        self.orders.get(&id).ok_or(EngineError::OrderNotFound(id))
    }

    pub fn orders_for_market(&self, market_id: u64) -> Vec<&LimitOrder> {
        self.orders_by_market
            .get(&market_id)
            .map(|ids| ids.iter().filter_map(|id| self.orders.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn bond(&self, id: u64) -> Option<&TruthBond> {
        self.bonds.get(&id)
    }

    pub fn position(&self, market_id: u64, holder: &str) -> Position {
        self.positions
            .get(&(market_id, holder.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    pub fn oracle(&self) -> &str {
        &self.oracle
    }

    pub fn governance(&self) -> &str {
        &self.governance
    }

    // ========================================================================
    // ADMINISTRATION
    // ========================================================================

    /// Rotates the oracle identity. Governance only.
    pub fn set_oracle(&mut self, caller: &str, new_oracle: String) -> Result<(), EngineError> {
        self.require_governance(caller)?;
        info!(oracle = %new_oracle, "oracle rotated");
        self.oracle = new_oracle;
        Ok(())
    }

    /// Moves a market's accrued protocol fees to the governance treasury.
    pub fn sweep_fees(&mut self, caller: &str, market_id: u64) -> Result<u128, EngineError> {
        self.require_governance(caller)?;
        let governance = self.governance.clone();
        let amount = self.market(market_id)?.fees_accrued;
        if amount > 0 {
            self.collateral.transfer(VAULT, &governance, amount)?;
        }
        self.state_mut(market_id)?.market.fees_accrued = 0;
        info!(market_id, amount, "protocol fees swept");
        Ok(amount)
    }

    // ========================================================================
    // INTERNAL HELPERS
    // ========================================================================

    pub(crate) fn state_mut(&mut self, id: u64) -> Result<&mut MarketState, EngineError> {
        self.markets.get_mut(&id).ok_or(EngineError::MarketNotFound(id))
    }

    pub(crate) fn require_governance(&self, caller: &str) -> Result<(), EngineError> {
        if caller != self.governance {
            return Err(EngineError::NotGovernance);
        }
        Ok(())
    }

    pub(crate) fn require_oracle(&self, caller: &str) -> Result<(), EngineError> {
        if caller != self.oracle {
            return Err(EngineError::NotOracle);
        }
        Ok(())
    }

    pub(crate) fn position_mut(&mut self, market_id: u64, holder: &str) -> &mut Position {
        self.positions
            .entry((market_id, holder.to_string()))
            .or_default()
    }

    pub(crate) fn next_order_id(&mut self) -> u64 {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }

    pub(crate) fn next_bond_id(&mut self) -> u64 {
        let id = self.next_bond_id;
        self.next_bond_id += 1;
        id
    }

    pub(crate) fn insert_order(&mut self, order: LimitOrder) {
        self.orders_by_market
            .entry(order.market_id)
            .or_default()
            .push(order.id);
        self.orders.insert(order.id, order);
    }

    pub(crate) fn order_mut(&mut self, id: u64) -> Result<&mut LimitOrder, EngineError> {
        self.orders.get_mut(&id).ok_or(EngineError::OrderNotFound(id))
    }

    pub(crate) fn bond_mut(&mut self, id: u64) -> Result<&mut TruthBond, EngineError> {
        self.bonds
            .get_mut(&id)
            .ok_or(EngineError::InvalidParams(format!("bond {} not found", id)))
    }

    pub(crate) fn insert_bond(&mut self, bond: TruthBond) {
        self.bonds.insert(bond.id, bond);
    }

    /// Drops a market from the active index once it reaches a terminal
    /// status. Market records themselves are never deleted.
    pub(crate) fn retire_market(&mut self, id: u64) {
        self.active_markets.retain(|m| *m != id);
    }

    pub(crate) fn emit(&mut self, now: u64, event: EngineEvent) {
        self.events.push(EventRecord::new(now, event));
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    pub const ORACLE: &str = "vp:oracle";
    pub const GOV: &str = "vp:governance";
    pub const USDC: u128 = 1_000_000;
    pub const END_TIME: u64 = 10_000;
    pub const RESOLUTION_TIME: u64 = 20_000;
    pub const DISPUTE_END: u64 = RESOLUTION_TIME + crate::market::DISPUTE_WINDOW_SECS;
    /// Alice's collateral after funding and creating the standard market.
    pub const ALICE_LEFTOVER: u128 = 1_000_000 * USDC - 500 * USDC;

    /// An engine with one open market (id 1, 500 USDC seed, 50% price) and
    /// two funded traders: alice (creator) and bob.
    pub fn funded_market() -> (Engine, u64) {
        let mut engine = Engine::new(ORACLE.into(), GOV.into());
        for user in ["alice", "bob"] {
            engine.collateral.mint(user, 1_000_000 * USDC).unwrap();
            engine.collateral.approve(user, VAULT, u128::MAX);
        }
        let id = engine
            .create_market(
                "alice",
                "Will the Fed cut rates by 50bps before June?".into(),
                "POLITICS".into(),
                END_TIME,
                RESOLUTION_TIME,
                500 * USDC,
                100,
            )
            .unwrap();
        (engine, id)
    }
}
