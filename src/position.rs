// ============================================================================
// Position Ledger - VantagePoint Market Engine
// ============================================================================
//
// Per (market, holder) share counts with a running weighted-average
// acquisition price per side, expressed in basis points of collateral per
// share. The average moves only when shares are acquired (AMM buys and
// limit-order fills); disposals reduce the count and leave the average
// untouched. realized_pnl is reserved: serialized, never written.
//
// ============================================================================

use crate::errors::EngineError;
use crate::market::Side;
use crate::math::{checked_add, BPS};
use serde::{Deserialize, Serialize};

/// One holder's stake in one market.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    pub yes_shares: u128,
    pub no_shares: u128,

    /// Weighted-average price paid per YES share, in basis points.
    pub yes_avg_cost_bps: u64,
    /// Weighted-average price paid per NO share, in basis points.
    pub no_avg_cost_bps: u64,

    /// Reserved for a future disposal-side extension.
    pub realized_pnl: i128,
}

impl Position {
    pub fn shares(&self, side: Side) -> u128 {
        match side {
            Side::Yes => self.yes_shares,
            Side::No => self.no_shares,
        }
    }

    pub fn avg_cost_bps(&self, side: Side) -> u64 {
        match side {
            Side::Yes => self.yes_avg_cost_bps,
            Side::No => self.no_avg_cost_bps,
        }
    }

    /// Records an acquisition of `new_shares` for `gross_spent` collateral:
    ///   new_avg = (old_shares * old_avg + gross_spent * 10000)
    ///             / (old_shares + new_shares)
    pub fn record_buy(
        &mut self,
        side: Side,
        new_shares: u128,
        gross_spent: u128,
    ) -> Result<(), EngineError> {
        let old_shares = self.shares(side);
        let old_avg = self.avg_cost_bps(side) as u128;

        let total_shares = checked_add(old_shares, new_shares)?;
        if total_shares == 0 {
            return Ok(());
        }
        let weighted_old = old_shares
            .checked_mul(old_avg)
            .ok_or(EngineError::ArithmeticOverflow)?;
        let spent_scaled = gross_spent
            .checked_mul(BPS)
            .ok_or(EngineError::ArithmeticOverflow)?;
        let new_avg = (checked_add(weighted_old, spent_scaled)? / total_shares) as u64;

        match side {
            Side::Yes => {
                self.yes_shares = total_shares;
                self.yes_avg_cost_bps = new_avg;
            }
            Side::No => {
                self.no_shares = total_shares;
                self.no_avg_cost_bps = new_avg;
            }
        }
        Ok(())
    }

    /// Records a disposal. Average cost is intentionally untouched. The
    /// share ledger is authoritative (shares can arrive by transfer), so
    /// the mirror clamps instead of blocking a burn the ledger allowed.
    pub fn record_sell(&mut self, side: Side, shares: u128) {
        let held = self.shares(side);
        match side {
            Side::Yes => self.yes_shares = held.saturating_sub(shares),
            Side::No => self.no_shares = held.saturating_sub(shares),
        }
    }

    /// Zeroes the winning side after a claim so it cannot be repeated.
    pub fn clear(&mut self, side: Side) {
        match side {
            Side::Yes => self.yes_shares = 0,
            Side::No => self.no_shares = 0,
        }
    }
}
