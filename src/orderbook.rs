// ============================================================================
// Limit Orders - VantagePoint Market Engine
// ============================================================================
//
// Price-triggered orders resting against the AMM. An order escrows a fixed
// collateral amount at placement; any keeper may fire it once the current
// AMM price satisfies the limit, at which point the escrow runs through the
// ordinary buy path at the *current* price — the trader may fill materially
// better than their limit, never worse.
//
// Price convention: basis points in [0, 10000]. A BuyYes order with limit
// 6500 fires while the YES price is at or below 65%. A BuyNo order's limit
// is compared against the NO price (10000 - yes price).
//
// Orders are created once and mutate exactly once: filled or cancelled,
// mutually exclusive, both terminal.
//
// ============================================================================

use crate::market::Side;
use serde::{Deserialize, Serialize};

/// Upper bound of a limit price in basis points.
pub const MAX_LIMIT_PRICE_BPS: u64 = 10_000;

/// Which outcome token the escrow buys when the order fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    BuyYes,
    BuyNo,
}

impl OrderDirection {
    pub fn side(&self) -> Side {
        match self {
            OrderDirection::BuyYes => Side::Yes,
            OrderDirection::BuyNo => Side::No,
        }
    }
}

/// A resting limit order with its escrowed collateral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitOrder {
    /// Monotonically increasing id, never reused.
    pub id: u64,

    pub market_id: u64,

    /// Address that placed the order, owns the escrow, and receives shares.
    pub trader: String,

    pub direction: OrderDirection,

    /// Trigger threshold in basis points, inclusive.
    pub limit_price_bps: u64,

    /// Collateral held by the vault until fill or cancel.
    pub collateral: u128,

    pub filled: bool,
    pub cancelled: bool,

    pub created_at: u64,
}

impl LimitOrder {
    pub fn is_active(&self) -> bool {
        !self.filled && !self.cancelled
    }

    /// Whether the current YES price satisfies this order's limit.
    pub fn is_triggered(&self, yes_price_bps: u64) -> bool {
        match self.direction {
            OrderDirection::BuyYes => yes_price_bps <= self.limit_price_bps,
            OrderDirection::BuyNo => {
                MAX_LIMIT_PRICE_BPS - yes_price_bps <= self.limit_price_bps
            }
        }
    }
}
