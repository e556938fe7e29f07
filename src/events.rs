// ============================================================================
// Event Stream - VantagePoint Market Engine
// ============================================================================
//
// Append-only record of everything the engine does: market creation, every
// trade with its resulting price, order placement/fill/cancellation, oracle
// submission, dispute filing/arbitration, resolution, and claims. External
// consumers (indexers, charts, feeds) reconstruct full history from this
// stream without re-deriving engine state.
//
// ============================================================================

use crate::market::{Outcome, Side};
use crate::orderbook::OrderDirection;
use serde::Serialize;
use uuid::Uuid;

/// Typed payload of one engine event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    MarketCreated {
        market_id: u64,
        creator: String,
        question: String,
        initial_liquidity: u128,
        end_time: u64,
        resolution_time: u64,
    },
    Trade {
        market_id: u64,
        trader: String,
        side: Side,
        is_buy: bool,
        collateral_gross: u128,
        shares: u128,
        /// YES price after the trade, in basis points.
        price_bps: u64,
    },
    OrderPlaced {
        order_id: u64,
        market_id: u64,
        trader: String,
        direction: OrderDirection,
        limit_price_bps: u64,
        collateral: u128,
    },
    OrderFilled {
        order_id: u64,
        market_id: u64,
        keeper: String,
        shares: u128,
        price_bps: u64,
    },
    OrderCancelled {
        order_id: u64,
        market_id: u64,
    },
    OutcomeSubmitted {
        market_id: u64,
        outcome: Outcome,
    },
    DisputeFiled {
        market_id: u64,
        bond_id: u64,
        disputer: String,
        proposed_outcome: Outcome,
        bond: u128,
    },
    DisputeResolved {
        market_id: u64,
        bond_id: u64,
        upheld: bool,
        final_outcome: Outcome,
    },
    MarketResolved {
        market_id: u64,
        outcome: Outcome,
    },
    Claimed {
        market_id: u64,
        holder: String,
        shares: u128,
        payout: u128,
    },
}

/// One entry in the stream.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub timestamp: u64,
    #[serde(flatten)]
    pub event: EngineEvent,
}

impl EventRecord {
    pub fn new(timestamp: u64, event: EngineEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            event,
        }
    }
}
