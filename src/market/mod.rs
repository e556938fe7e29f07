// ============================================================================
// Market Model - VantagePoint Market Engine
// ============================================================================
//
// Core market record plus its lifecycle enums and the protocol constants.
//
// Lifecycle:  Open → Resolving → Resolved
//                        ↓          ↑
//                    Disputed ──────┘
//
// Closed and Voided are declared but reserved: no transition in the engine
// produces them.
//
// ============================================================================

pub mod amm;

use serde::{Deserialize, Serialize};
use std::fmt;

/// String-encoded u128 for JSON fields that can exceed u64 range.
mod u128_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

// ============================================================================
// CONSTANTS
// ============================================================================

/// Shares pre-minted to the vault on each side at market creation. Both AMM
/// reserves start at this value, so the opening YES price is exactly 50%.
/// Sized so the cached product `k` and every reserve*amount intermediate
/// stay inside u128 under checked arithmetic.
pub const INITIAL_SHARE_SUPPLY: u128 = 1_000_000_000_000;

/// Minimum collateral to open a market (100 USDC at 6 decimals).
pub const MIN_INITIAL_LIQUIDITY: u128 = 100_000_000;

/// Protocol fee on the gross input of buys, and on the gross payout of
/// sells, in basis points (1%).
pub const PROTOCOL_FEE_BPS: u64 = 100;

/// Creator fee on the gross input of buys only, in basis points (0.25%).
/// Sells pay no creator fee.
pub const CREATOR_FEE_BPS: u64 = 25;

/// Fixed bond posted to dispute an oracle report (500 USDC at 6 decimals).
pub const TRUTH_BOND_AMOUNT: u128 = 500_000_000;

/// Bonus paid to a vindicated disputer, in basis points of the bond (50%).
pub const DISPUTE_BONUS_BPS: u64 = 5_000;

/// Length of the dispute window after resolutionTime: 24 hours.
pub const DISPUTE_WINDOW_SECS: u64 = 86_400;

// ============================================================================
// ENUMS
// ============================================================================

/// Market lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    /// Trading and order placement permitted until endTime.
    Open,
    /// Reserved, unreachable.
    Closed,
    /// Oracle has reported; dispute window running.
    Resolving,
    /// A truth bond is pending governance arbitration.
    Disputed,
    /// Final. Only claims may act.
    Resolved,
    /// Reserved, unreachable.
    Voided,
}

impl MarketStatus {
    pub fn is_trading_open(&self) -> bool {
        matches!(self, MarketStatus::Open)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MarketStatus::Resolved | MarketStatus::Voided)
    }
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketStatus::Open => "open",
            MarketStatus::Closed => "closed",
            MarketStatus::Resolving => "resolving",
            MarketStatus::Disputed => "disputed",
            MarketStatus::Resolved => "resolved",
            MarketStatus::Voided => "voided",
        };
        write!(f, "{}", s)
    }
}

/// A market's reported or final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Unresolved,
    Yes,
    No,
}

impl Outcome {
    pub fn is_decided(&self) -> bool {
        !matches!(self, Outcome::Unresolved)
    }
}

/// Which outcome token a trade or position refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Yes,
    No,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Yes => Side::No,
            Side::No => Side::Yes,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Yes => "yes",
            Side::No => "no",
        }
    }

    /// The side that wins under a decided outcome.
    pub fn wins(&self, outcome: Outcome) -> bool {
        matches!(
            (self, outcome),
            (Side::Yes, Outcome::Yes) | (Side::No, Outcome::No)
        )
    }
}

// ============================================================================
// MARKET RECORD
// ============================================================================

/// A binary prediction market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Monotonically increasing id, never reused.
    pub id: u64,

    /// The yes/no question being traded.
    pub question: String,

    /// Category label (POLITICS, CRYPTO, SPORTS, CULTURE, ...).
    pub category: String,

    /// Address that opened the market and receives creator fees.
    pub creator: String,

    /// Trading stops at this unix timestamp.
    pub end_time: u64,

    /// Oracle reports at or after this timestamp. Strictly after end_time.
    pub resolution_time: u64,

    /// resolution_time + DISPUTE_WINDOW_SECS, fixed at creation.
    pub dispute_end_time: u64,

    pub status: MarketStatus,
    pub outcome: Outcome,

    /// AMM reserve of YES shares. Strictly positive after creation.
    pub yes_reserve: u128,

    /// AMM reserve of NO shares. Strictly positive after creation.
    pub no_reserve: u128,

    /// Cached product of the reserves. Informational only: recomputed after
    /// every reserve change, never independently enforced. Serialized as a
    /// string: the product exceeds the integer range JSON consumers handle.
    #[serde(with = "u128_string")]
    pub k: u128,

    /// Net collateral retained by the pool after fees — the redeemable
    /// settlement pot for the winning side.
    pub total_liquidity: u128,

    /// Gross collateral across all trades.
    pub total_volume: u128,
    pub yes_volume: u128,
    pub no_volume: u128,

    /// Protocol fee accrued and awaiting a governance sweep.
    pub fees_accrued: u128,

    /// Set once the oracle has reported.
    pub oracle_settled: bool,

    /// Pending truth bond id, if a dispute is open.
    pub truth_bond: Option<u64>,

    pub created_at: u64,
}

impl Market {
    pub fn reserve(&self, side: Side) -> u128 {
        match side {
            Side::Yes => self.yes_reserve,
            Side::No => self.no_reserve,
        }
    }

    pub fn set_reserves(&mut self, yes: u128, no: u128) {
        self.yes_reserve = yes;
        self.no_reserve = no;
        // Informational cache; never read by the pricing path.
        self.k = yes.saturating_mul(no);
    }

    /// Trading gate: status Open and strictly before endTime.
    pub fn can_trade(&self, now: u64) -> bool {
        self.status.is_trading_open() && now < self.end_time
    }
}
