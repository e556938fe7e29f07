// ============================================================================
// Limit Order Operations - VantagePoint Market Engine
// ============================================================================
//
// place escrows collateral with the vault; cancel refunds it in full; fill
// is permissionless and runs the escrow through the identical buy path at
// the current AMM price once the order's limit is satisfied. An order
// mutates exactly once — filled or cancelled — and is inert afterwards.
//
// ============================================================================

use crate::engine::{Engine, VAULT};
use crate::errors::EngineError;
use crate::events::EngineEvent;
use crate::market::amm;
use crate::orderbook::{LimitOrder, OrderDirection, MAX_LIMIT_PRICE_BPS};
use tracing::debug;

impl Engine {
    /// Places a limit order, escrowing `collateral` from the caller.
    pub fn place_order(
        &mut self,
        caller: &str,
        market_id: u64,
        direction: OrderDirection,
        limit_price_bps: u64,
        collateral: u128,
        now: u64,
    ) -> Result<u64, EngineError> {
        let state = self.market_state(market_id)?;
        if !state.market.can_trade(now) {
            return Err(EngineError::TradingClosed);
        }
        if limit_price_bps > MAX_LIMIT_PRICE_BPS {
            return Err(EngineError::InvalidParams(
                "limit price must be at most 10000 bps".into(),
            ));
        }
        if collateral == 0 {
            return Err(EngineError::InvalidParams("collateral must be positive".into()));
        }
        self.collateral.can_pull(VAULT, caller, collateral)?;

        let id = self.next_order_id();
        self.collateral.transfer_from(VAULT, caller, VAULT, collateral)?;
        self.insert_order(LimitOrder {
            id,
            market_id,
            trader: caller.to_string(),
            direction,
            limit_price_bps,
            collateral,
            filled: false,
            cancelled: false,
            created_at: now,
        });

        debug!(order_id = id, market_id, trader = caller, "order placed");
        self.emit(
            now,
            EngineEvent::OrderPlaced {
                order_id: id,
                market_id,
                trader: caller.to_string(),
                direction,
                limit_price_bps,
                collateral,
            },
        );
        Ok(id)
    }

    /// Cancels an active order, refunding the full escrow to its owner.
    pub fn cancel_order(&mut self, caller: &str, order_id: u64, now: u64) -> Result<(), EngineError> {
        let order = self.order(order_id)?;
        if order.trader != caller {
            return Err(EngineError::NotOrderOwner);
        }
        if !order.is_active() {
            return Err(EngineError::OrderInactive(order_id));
        }
        let refund = order.collateral;
        let market_id = order.market_id;

        self.collateral.transfer(VAULT, caller, refund)?;
        self.order_mut(order_id)?.cancelled = true;

        debug!(order_id, market_id, "order cancelled");
        self.emit(now, EngineEvent::OrderCancelled { order_id, market_id });
        Ok(())
    }

    /// Keeper entry point: fires an order whose limit is satisfied by the
    /// current price. Any caller may invoke this; the shares and position
    /// go to the order's trader. The fill executes at the current AMM
    /// price, which can only be at or better than the limit.
    pub fn fill_order(&mut self, keeper: &str, order_id: u64, now: u64) -> Result<u128, EngineError> {
        let order = self.order(order_id)?.clone();
        if !order.is_active() {
            return Err(EngineError::OrderInactive(order_id));
        }

        let state = self.market_state(order.market_id)?;
        if !state.market.can_trade(now) {
            return Err(EngineError::TradingClosed);
        }
        let yes_price = amm::yes_price_bps(state.market.yes_reserve, state.market.no_reserve)?;
        if !order.is_triggered(yes_price) {
            return Err(EngineError::OrderNotTriggered(order_id));
        }

        // Escrow is already in the vault; run the standard buy accounting.
        let side = order.direction.side();
        let quote = amm::quote_buy(&state.market, side, order.collateral)?;
        let price_after = self.settle_buy(order.market_id, &order.trader, side, &quote, now)?;
        self.order_mut(order_id)?.filled = true;

        debug!(
            order_id,
            market_id = order.market_id,
            keeper,
            shares_out = quote.shares_out,
            "order filled"
        );
        self.emit(
            now,
            EngineEvent::OrderFilled {
                order_id,
                market_id: order.market_id,
                keeper: keeper.to_string(),
                shares: quote.shares_out,
                price_bps: price_after,
            },
        );
        Ok(quote.shares_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests_support::*;
    use crate::market::Side;

    #[test]
    fn test_place_escrows_collateral() {
        let (mut engine, id) = funded_market();
        let bob_before = engine.collateral.balance_of("bob");
        let vault_before = engine.collateral.balance_of(VAULT);

        let order_id = engine
            .place_order("bob", id, OrderDirection::BuyYes, 5_500, 50 * USDC, 200)
            .unwrap();
        assert_eq!(order_id, 1);
        assert_eq!(engine.collateral.balance_of("bob"), bob_before - 50 * USDC);
        assert_eq!(engine.collateral.balance_of(VAULT), vault_before + 50 * USDC);

        let order = engine.order(order_id).unwrap();
        assert!(order.is_active());
        assert_eq!(order.trader, "bob");
        assert_eq!(engine.orders_for_market(id).len(), 1);
    }

    #[test]
    fn test_place_validations() {
        let (mut engine, id) = funded_market();
        assert!(matches!(
            engine.place_order("bob", id, OrderDirection::BuyYes, 10_001, 50 * USDC, 200),
            Err(EngineError::InvalidParams(_))
        ));
        assert!(matches!(
            engine.place_order("bob", id, OrderDirection::BuyYes, 5_000, 0, 200),
            Err(EngineError::InvalidParams(_))
        ));
        assert_eq!(
            engine.place_order("bob", id, OrderDirection::BuyYes, 5_000, 50 * USDC, END_TIME),
            Err(EngineError::TradingClosed)
        );
    }

    #[test]
    fn test_cancel_refunds_exactly_and_is_terminal() {
        let (mut engine, id) = funded_market();
        let bob_before = engine.collateral.balance_of("bob");
        let order_id = engine
            .place_order("bob", id, OrderDirection::BuyYes, 4_000, 50 * USDC, 200)
            .unwrap();

        // Only the owner may cancel.
        assert_eq!(
            engine.cancel_order("alice", order_id, 201),
            Err(EngineError::NotOrderOwner)
        );

        engine.cancel_order("bob", order_id, 201).unwrap();
        assert_eq!(engine.collateral.balance_of("bob"), bob_before);
        assert!(engine.order(order_id).unwrap().cancelled);

        // Terminal both ways.
        assert_eq!(
            engine.cancel_order("bob", order_id, 202),
            Err(EngineError::OrderInactive(order_id))
        );
        assert_eq!(
            engine.fill_order("keeper", order_id, 202),
            Err(EngineError::OrderInactive(order_id))
        );
    }

    #[test]
    fn test_fill_requires_trigger() {
        let (mut engine, id) = funded_market();
        // Price is 5000; a BuyYes order at 4000 waits for YES to get cheaper.
        let order_id = engine
            .place_order("bob", id, OrderDirection::BuyYes, 4_000, 50 * USDC, 200)
            .unwrap();
        assert_eq!(
            engine.fill_order("keeper", order_id, 201),
            Err(EngineError::OrderNotTriggered(order_id))
        );

        // Someone buys NO heavily; YES price drops below 4000.
        engine
            .buy("alice", id, Side::No, 300_000 * USDC, 0, 202)
            .unwrap();
        assert!(engine.price(id).unwrap() <= 4_000);

        let shares = engine.fill_order("keeper", order_id, 203).unwrap();
        assert!(shares > 0);
        let order = engine.order(order_id).unwrap();
        assert!(order.filled);
        assert!(!order.is_active());

        // Shares and position belong to the trader, not the keeper.
        let state = engine.market_state(id).unwrap();
        assert_eq!(state.yes_ledger.balance_of("bob"), shares);
        assert_eq!(state.yes_ledger.balance_of("keeper"), 0);
        assert_eq!(engine.position(id, "bob").yes_shares, shares);

        // Not retryable.
        assert_eq!(
            engine.fill_order("keeper", order_id, 204),
            Err(EngineError::OrderInactive(order_id))
        );
    }

    #[test]
    fn test_fill_matches_direct_buy_accounting() {
        // Two identical markets: a filled order must produce exactly the
        // accounting of a direct buy of the escrowed amount.
        let (mut engine, id_a) = funded_market();
        let id_b = engine
            .create_market(
                "alice",
                "Will the Fed cut rates by 50bps before July?".into(),
                "POLITICS".into(),
                END_TIME,
                RESOLUTION_TIME,
                500 * USDC,
                100,
            )
            .unwrap();

        let order_id = engine
            .place_order("bob", id_a, OrderDirection::BuyYes, 5_000, 80 * USDC, 200)
            .unwrap();
        let filled = engine.fill_order("keeper", order_id, 201).unwrap();
        let direct = engine.buy("bob", id_b, Side::Yes, 80 * USDC, 0, 201).unwrap();
        assert_eq!(filled, direct);

        let a = engine.market(id_a).unwrap();
        let b = engine.market(id_b).unwrap();
        assert_eq!(a.yes_reserve, b.yes_reserve);
        assert_eq!(a.no_reserve, b.no_reserve);
        assert_eq!(a.total_liquidity, b.total_liquidity);
        assert_eq!(a.fees_accrued, b.fees_accrued);
    }

    #[test]
    fn test_buy_no_order_triggers_on_no_price() {
        let (mut engine, id) = funded_market();
        // NO currently costs 5000; a BuyNo at 4500 needs NO to get cheaper,
        // i.e. YES to rise above 5500.
        let order_id = engine
            .place_order("bob", id, OrderDirection::BuyNo, 4_500, 40 * USDC, 200)
            .unwrap();
        assert_eq!(
            engine.fill_order("keeper", order_id, 201),
            Err(EngineError::OrderNotTriggered(order_id))
        );

        engine
            .buy("alice", id, Side::Yes, 500_000 * USDC, 0, 202)
            .unwrap();
        assert!(engine.price(id).unwrap() >= 5_500);
        let shares = engine.fill_order("keeper", order_id, 203).unwrap();
        let state = engine.market_state(id).unwrap();
        assert_eq!(state.no_ledger.balance_of("bob"), shares);
    }
}
