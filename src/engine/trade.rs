// ============================================================================
// AMM Trading - VantagePoint Market Engine
// ============================================================================
//
// Buy, sell, and preview against a market's constant-product pool. Quotes
// come from market::amm; this module owns validation, fund movement, and
// the commit of a quote's effects. The limit-order fill path reuses
// settle_buy so a triggered order runs the identical accounting as a
// direct buy.
//
// Fee model per trade:
//   buy:  gross -> 1% protocol fee (accrues to the market) and
//         0.25% creator fee (paid out immediately); the remainder enters
//         the pool.
//   sell: 1% protocol fee on the gross payout, no creator fee.
//
// ============================================================================

use crate::engine::{Engine, VAULT};
use crate::errors::EngineError;
use crate::events::EngineEvent;
use crate::market::amm::{self, BuyQuote, TradePreview};
use crate::market::Side;
use crate::math::{checked_add, checked_sub};
use tracing::debug;

impl Engine {
    /// Buys `side` shares with `collateral_in` collateral pulled from the
    /// caller. Fails with SlippageExceeded (state unchanged) when the
    /// computed shares fall below `min_shares_out`.
    pub fn buy(
        &mut self,
        caller: &str,
        market_id: u64,
        side: Side,
        collateral_in: u128,
        min_shares_out: u128,
        now: u64,
    ) -> Result<u128, EngineError> {
        let state = self.market_state(market_id)?;
        if !state.market.can_trade(now) {
            return Err(EngineError::TradingClosed);
        }

        let quote = amm::quote_buy(&state.market, side, collateral_in)?;
        if quote.shares_out < min_shares_out {
            return Err(EngineError::SlippageExceeded);
        }
        self.collateral.can_pull(VAULT, caller, collateral_in)?;

        self.collateral
            .transfer_from(VAULT, caller, VAULT, collateral_in)?;
        self.settle_buy(market_id, caller, side, &quote, now)?;
        Ok(quote.shares_out)
    }

    /// Sells `shares_in` shares of `side` back to the pool. The shares are
    /// burned first; the net payout (gross minus the protocol fee) is
    /// checked against `min_collateral_out` before anything mutates.
    pub fn sell(
        &mut self,
        caller: &str,
        market_id: u64,
        side: Side,
        shares_in: u128,
        min_collateral_out: u128,
        now: u64,
    ) -> Result<u128, EngineError> {
        let state = self.market_state(market_id)?;
        if !state.market.can_trade(now) {
            return Err(EngineError::TradingClosed);
        }
        if state.ledger(side).balance_of(caller) < shares_in {
            return Err(EngineError::InsufficientShares);
        }

        let quote = amm::quote_sell(&state.market, side, shares_in)?;
        if quote.net_payout < min_collateral_out {
            return Err(EngineError::SlippageExceeded);
        }

        // Stage every fallible computation before the first mutation.
        let market = &state.market;
        let new_total_liquidity = checked_sub(market.total_liquidity, quote.gross_payout)
            .map_err(|_| EngineError::InsufficientLiquidity)?;
        let new_fees = checked_add(market.fees_accrued, quote.protocol_fee)?;
        let new_total_volume = checked_add(market.total_volume, quote.gross_payout)?;
        let new_side_volume = checked_add(
            match side {
                Side::Yes => market.yes_volume,
                Side::No => market.no_volume,
            },
            quote.gross_payout,
        )?;
        let (new_yes, new_no) = match side {
            Side::Yes => (quote.new_requested_reserve, quote.new_opposite_reserve),
            Side::No => (quote.new_opposite_reserve, quote.new_requested_reserve),
        };
        let price_after = amm::yes_price_bps(new_yes, new_no)?;
        if self.collateral.balance_of(VAULT) < quote.net_payout {
            return Err(EngineError::InsufficientLiquidity);
        }

        // Commit.
        let state = self.state_mut(market_id)?;
        state.ledger_mut(side).burn_from(VAULT, caller, shares_in)?;
        state.market.set_reserves(new_yes, new_no);
        state.market.total_liquidity = new_total_liquidity;
        state.market.fees_accrued = new_fees;
        state.market.total_volume = new_total_volume;
        match side {
            Side::Yes => state.market.yes_volume = new_side_volume,
            Side::No => state.market.no_volume = new_side_volume,
        }
        self.position_mut(market_id, caller).record_sell(side, shares_in);
        self.collateral.transfer(VAULT, caller, quote.net_payout)?;

        debug!(
            market_id,
            trader = caller,
            side = side.as_str(),
            shares_in,
            net_payout = quote.net_payout,
            "sell executed"
        );
        self.emit(
            now,
            EngineEvent::Trade {
                market_id,
                trader: caller.to_string(),
                side,
                is_buy: false,
                collateral_gross: quote.gross_payout,
                shares: shares_in,
                price_bps: price_after,
            },
        );
        Ok(quote.net_payout)
    }

    /// Pure trade simulation; reproduces buy's fees and formula exactly.
    pub fn preview(
        &self,
        market_id: u64,
        side: Side,
        collateral_in: u128,
    ) -> Result<TradePreview, EngineError> {
        let market = self.market(market_id)?;
        amm::preview_buy(market, side, collateral_in)
    }

    /// Commits a buy quote whose gross collateral is already in the vault.
    /// Shared by the direct buy path and the limit-order fill path; returns
    /// the YES price after the trade.
    pub(crate) fn settle_buy(
        &mut self,
        market_id: u64,
        trader: &str,
        side: Side,
        quote: &BuyQuote,
        now: u64,
    ) -> Result<u64, EngineError> {
        // Stage every fallible computation before the first mutation.
        let state = self.market_state(market_id)?;
        let market = &state.market;

        let new_total_liquidity = checked_add(market.total_liquidity, quote.net_in)?;
        let new_fees = checked_add(market.fees_accrued, quote.protocol_fee)?;
        let new_total_volume = checked_add(market.total_volume, quote.gross_in)?;
        let new_side_volume = checked_add(
            match side {
                Side::Yes => market.yes_volume,
                Side::No => market.no_volume,
            },
            quote.gross_in,
        )?;
        let (new_yes, new_no) = match side {
            Side::Yes => (quote.new_requested_reserve, quote.new_opposite_reserve),
            Side::No => (quote.new_opposite_reserve, quote.new_requested_reserve),
        };
        let price_after = amm::yes_price_bps(new_yes, new_no)?;
        checked_add(state.ledger(side).total_supply(), quote.shares_out)?;

        let mut position = self.position(market_id, trader);
        position.record_buy(side, quote.shares_out, quote.gross_in)?;

        let creator = market.creator.clone();

        // Commit.
        if quote.creator_fee > 0 {
            self.collateral.transfer(VAULT, &creator, quote.creator_fee)?;
        }
        let state = self.state_mut(market_id)?;
        state.ledger_mut(side).mint(VAULT, trader, quote.shares_out)?;
        state.market.set_reserves(new_yes, new_no);
        state.market.total_liquidity = new_total_liquidity;
        state.market.fees_accrued = new_fees;
        state.market.total_volume = new_total_volume;
        match side {
            Side::Yes => state.market.yes_volume = new_side_volume,
            Side::No => state.market.no_volume = new_side_volume,
        }
        *self.position_mut(market_id, trader) = position;

        debug!(
            market_id,
            trader,
            side = side.as_str(),
            gross_in = quote.gross_in,
            shares_out = quote.shares_out,
            price_after,
            "buy executed"
        );
        self.emit(
            now,
            EngineEvent::Trade {
                market_id,
                trader: trader.to_string(),
                side,
                is_buy: true,
                collateral_gross: quote.gross_in,
                shares: quote.shares_out,
                price_bps: price_after,
            },
        );
        Ok(price_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests_support::*;
    use crate::market::{CREATOR_FEE_BPS, PROTOCOL_FEE_BPS};
    use crate::math::bps_of;

    #[test]
    fn test_buy_applies_worked_example() {
        let (mut engine, id) = funded_market();
        let market_before = engine.market(id).unwrap().clone();
        let r = market_before.yes_reserve;

        let gross = 100 * USDC;
        let shares = engine.buy("bob", id, Side::Yes, gross, 0, 200).unwrap();

        let fee = bps_of(gross, PROTOCOL_FEE_BPS).unwrap();
        let creator_fee = bps_of(gross, CREATOR_FEE_BPS).unwrap();
        let net_in = gross - fee - creator_fee;
        let expected_shares = r * net_in / (r + net_in);
        assert_eq!(shares, expected_shares);

        let market = engine.market(id).unwrap();
        assert_eq!(market.yes_reserve, r - expected_shares);
        assert_eq!(market.no_reserve, r + net_in);
        assert_eq!(market.k, market.yes_reserve * market.no_reserve);
        assert_eq!(
            market.total_liquidity,
            market_before.total_liquidity + net_in
        );
        assert_eq!(market.total_volume, gross);
        assert_eq!(market.yes_volume, gross);
        assert_eq!(market.fees_accrued, fee);

        // Shares minted to the buyer, creator fee paid out immediately.
        let state = engine.market_state(id).unwrap();
        assert_eq!(state.yes_ledger.balance_of("bob"), expected_shares);
        assert_eq!(engine.collateral.balance_of("alice"), ALICE_LEFTOVER + creator_fee);

        // Position mirror updated with the gross spend.
        let position = engine.position(id, "bob");
        assert_eq!(position.yes_shares, expected_shares);
        assert!(position.yes_avg_cost_bps > 0);
    }

    #[test]
    fn test_buy_slippage_is_a_no_op() {
        let (mut engine, id) = funded_market();
        let before = engine.market(id).unwrap().clone();
        let bob_before = engine.collateral.balance_of("bob");

        let err = engine
            .buy("bob", id, Side::Yes, 100 * USDC, u128::MAX, 200)
            .unwrap_err();
        assert_eq!(err, EngineError::SlippageExceeded);

        let after = engine.market(id).unwrap();
        assert_eq!(after.yes_reserve, before.yes_reserve);
        assert_eq!(after.no_reserve, before.no_reserve);
        assert_eq!(after.total_volume, 0);
        assert_eq!(engine.collateral.balance_of("bob"), bob_before);
    }

    #[test]
    fn test_buy_gates_on_status_and_time() {
        let (mut engine, id) = funded_market();
        // Past end_time.
        assert_eq!(
            engine.buy("bob", id, Side::Yes, 100 * USDC, 0, END_TIME),
            Err(EngineError::TradingClosed)
        );
    }

    #[test]
    fn test_preview_matches_buy_exactly() {
        let (mut engine, id) = funded_market();

        // Skew the pool first so the preview runs off-center.
        engine.buy("bob", id, Side::Yes, 250 * USDC, 0, 200).unwrap();

        let preview = engine.preview(id, Side::No, 75 * USDC).unwrap();
        let shares = engine.buy("bob", id, Side::No, 75 * USDC, 0, 201).unwrap();
        assert_eq!(preview.shares_out, shares);
        assert_eq!(engine.price(id).unwrap() , 10_000 - preview.price_after_bps);
    }

    #[test]
    fn test_sell_round_trips_with_fees() {
        let (mut engine, id) = funded_market();
        let bob_start = engine.collateral.balance_of("bob");

        let shares = engine.buy("bob", id, Side::Yes, 200 * USDC, 0, 200).unwrap();
        let payout = engine.sell("bob", id, Side::Yes, shares, 0, 201).unwrap();

        // Fees and price impact guarantee a strict loss on an immediate
        // round trip.
        assert!(payout < 200 * USDC);
        assert_eq!(
            engine.collateral.balance_of("bob"),
            bob_start - 200 * USDC + payout
        );

        let state = engine.market_state(id).unwrap();
        assert_eq!(state.yes_ledger.balance_of("bob"), 0);
        assert_eq!(engine.position(id, "bob").yes_shares, 0);
    }

    #[test]
    fn test_sell_requires_share_balance() {
        let (mut engine, id) = funded_market();
        assert_eq!(
            engine.sell("bob", id, Side::Yes, 1_000, 0, 200),
            Err(EngineError::InsufficientShares)
        );
    }

    #[test]
    fn test_sell_slippage_is_a_no_op() {
        let (mut engine, id) = funded_market();
        let shares = engine.buy("bob", id, Side::No, 100 * USDC, 0, 200).unwrap();
        let before = engine.market(id).unwrap().clone();

        let err = engine
            .sell("bob", id, Side::No, shares, u128::MAX, 201)
            .unwrap_err();
        assert_eq!(err, EngineError::SlippageExceeded);

        let after = engine.market(id).unwrap();
        assert_eq!(after.no_reserve, before.no_reserve);
        let state = engine.market_state(id).unwrap();
        assert_eq!(state.no_ledger.balance_of("bob"), shares);
    }

    #[test]
    fn test_reserves_stay_positive_under_heavy_flow() {
        let (mut engine, id) = funded_market();
        engine.collateral.mint("whale", 10_000_000 * USDC).unwrap();
        engine.collateral.approve("whale", VAULT, u128::MAX);

        for _ in 0..10 {
            engine
                .buy("whale", id, Side::Yes, 1_000_000 * USDC, 0, 200)
                .unwrap();
        }
        let market = engine.market(id).unwrap();
        assert!(market.yes_reserve > 0);
        assert!(market.no_reserve > 0);
        assert!(engine.price(id).unwrap() > 5_000);
    }
}
