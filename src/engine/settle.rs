// ============================================================================
// Settlement - VantagePoint Market Engine
// ============================================================================
//
// Claims distribute a resolved market's retained collateral pool pro-rata
// among winning-side holders:
//
//   payout = total_liquidity * winner_shares / winning_supply
//
// with supply snapshotted before the claimant's burn and the pool debited
// by each payout. Debiting keeps successive claims at the same pro-rata
// rate and bounds the payout sum by the pool. The vault's own seeded
// reserve counts toward supply, so the pool is never fully distributed.
//
// ============================================================================

use crate::engine::{Engine, VAULT};
use crate::errors::EngineError;
use crate::events::EngineEvent;
use crate::market::{MarketStatus, Side};
use crate::math::{checked_sub, mul_div};
use tracing::info;

impl Engine {
    /// Redeems the caller's winning shares for their pro-rata slice of the
    /// market's retained pool. One-shot per holder: the winning balance is
    /// burned and the position zeroed.
    pub fn claim(&mut self, caller: &str, market_id: u64, now: u64) -> Result<u128, EngineError> {
        let state = self.market_state(market_id)?;
        let market = &state.market;
        if market.status != MarketStatus::Resolved {
            return Err(EngineError::InvalidStatus(market.status.to_string()));
        }
        let winning_side = match market.outcome {
            crate::market::Outcome::Yes => Side::Yes,
            crate::market::Outcome::No => Side::No,
            crate::market::Outcome::Unresolved => {
                return Err(EngineError::InvalidStatus("outcome unresolved".into()))
            }
        };

        let ledger = state.ledger(winning_side);
        let shares = ledger.balance_of(caller);
        if shares == 0 {
            return Err(EngineError::NoWinnings);
        }
        let supply = ledger.total_supply();

        // Stage: payout and pool debit, checked before any mutation.
        let payout = mul_div(market.total_liquidity, shares, supply)?;
        let new_total_liquidity = checked_sub(market.total_liquidity, payout)
            .map_err(|_| EngineError::InsufficientLiquidity)?;
        if self.collateral.balance_of(VAULT) < payout {
            return Err(EngineError::InsufficientLiquidity);
        }

        // Commit.
        let state = self.state_mut(market_id)?;
        state
            .ledger_mut(winning_side)
            .burn_from(VAULT, caller, shares)?;
        state.market.total_liquidity = new_total_liquidity;
        self.position_mut(market_id, caller).clear(winning_side);
        self.collateral.transfer(VAULT, caller, payout)?;

        info!(market_id, holder = caller, shares, payout, "winnings claimed");
        self.emit(
            now,
            EngineEvent::Claimed {
                market_id,
                holder: caller.to_string(),
                shares,
                payout,
            },
        );
        Ok(payout)
    }
}
