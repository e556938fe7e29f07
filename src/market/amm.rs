// ============================================================================
// Constant-Product Pricing - VantagePoint Market Engine
// ============================================================================
//
// Pure pricing math over a market's two share reserves. Nothing in this
// module mutates state or touches ledgers; the engine applies quotes
// produced here after its own validation. Keeping quote and apply separate
// is what makes `preview` exact by construction: both paths call the same
// functions.
//
// Price model (basis points):
//   yes_price = no_reserve * 10000 / (yes_reserve + no_reserve)
//
// A side's price is proportional to the *opposite* reserve — the standard
// constant-product duality.
//
// Buy:  net collateral enters the opposite reserve, shares leave the
//       requested reserve:
//         shares_out = requested * net_in / (opposite + net_in)
// Sell: shares enter the requested reserve, gross payout leaves the
//       opposite reserve:
//         payout = opposite * shares_in / (requested + shares_in)
//
// ============================================================================

use crate::errors::EngineError;
use crate::market::{Market, Side, CREATOR_FEE_BPS, PROTOCOL_FEE_BPS};
use crate::math::{bps_of, checked_add, checked_sub, mul_div, BPS};
use serde::Serialize;

/// Current YES probability in basis points.
pub fn yes_price_bps(yes_reserve: u128, no_reserve: u128) -> Result<u64, EngineError> {
    let total = checked_add(yes_reserve, no_reserve)?;
    let price = mul_div(no_reserve, BPS, total)?;
    Ok(price as u64)
}

/// Price of one side in basis points.
pub fn price_bps(market: &Market, side: Side) -> Result<u64, EngineError> {
    let yes = yes_price_bps(market.yes_reserve, market.no_reserve)?;
    Ok(match side {
        Side::Yes => yes,
        Side::No => (BPS as u64) - yes,
    })
}

/// Fully-computed effect of a buy, before any state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuyQuote {
    pub gross_in: u128,
    pub protocol_fee: u128,
    pub creator_fee: u128,
    /// gross_in minus both fees: what actually enters the pool.
    pub net_in: u128,
    pub shares_out: u128,
    /// Requested-side reserve after the trade.
    pub new_requested_reserve: u128,
    /// Opposite-side reserve after the trade.
    pub new_opposite_reserve: u128,
}

/// Quotes a buy of `side` for `gross_in` collateral against the current
/// reserves. Rejects trades that would drain the requested reserve.
pub fn quote_buy(market: &Market, side: Side, gross_in: u128) -> Result<BuyQuote, EngineError> {
    if gross_in == 0 {
        return Err(EngineError::InvalidParams("collateral_in must be positive".into()));
    }

    let protocol_fee = bps_of(gross_in, PROTOCOL_FEE_BPS)?;
    let creator_fee = bps_of(gross_in, CREATOR_FEE_BPS)?;
    let net_in = checked_sub(checked_sub(gross_in, protocol_fee)?, creator_fee)?;
    if net_in == 0 {
        return Err(EngineError::InvalidParams("trade too small after fees".into()));
    }

    let requested = market.reserve(side);
    let opposite = market.reserve(side.opposite());

    let shares_out = mul_div(requested, net_in, checked_add(opposite, net_in)?)?;
    if shares_out >= requested {
        return Err(EngineError::ReserveDepleted);
    }

    Ok(BuyQuote {
        gross_in,
        protocol_fee,
        creator_fee,
        net_in,
        shares_out,
        new_requested_reserve: requested - shares_out,
        new_opposite_reserve: checked_add(opposite, net_in)?,
    })
}

/// Fully-computed effect of a sell, before any state is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SellQuote {
    pub shares_in: u128,
    /// Collateral leaving the pool before the protocol fee.
    pub gross_payout: u128,
    pub protocol_fee: u128,
    /// What the seller receives.
    pub net_payout: u128,
    pub new_requested_reserve: u128,
    pub new_opposite_reserve: u128,
}

/// Quotes a sell of `shares_in` shares of `side`. No creator fee on sells.
pub fn quote_sell(market: &Market, side: Side, shares_in: u128) -> Result<SellQuote, EngineError> {
    if shares_in == 0 {
        return Err(EngineError::InvalidParams("shares_in must be positive".into()));
    }

    let requested = market.reserve(side);
    let opposite = market.reserve(side.opposite());

    let gross_payout = mul_div(opposite, shares_in, checked_add(requested, shares_in)?)?;
    if gross_payout >= opposite {
        return Err(EngineError::ReserveDepleted);
    }

    let protocol_fee = bps_of(gross_payout, PROTOCOL_FEE_BPS)?;
    let net_payout = checked_sub(gross_payout, protocol_fee)?;

    Ok(SellQuote {
        shares_in,
        gross_payout,
        protocol_fee,
        net_payout,
        new_requested_reserve: checked_add(requested, shares_in)?,
        new_opposite_reserve: opposite - gross_payout,
    })
}

/// Non-mutating trade preview returned to callers choosing slippage bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TradePreview {
    pub side: Side,
    pub collateral_in: u128,
    pub protocol_fee: u128,
    pub creator_fee: u128,
    pub net_in: u128,
    pub shares_out: u128,
    pub price_before_bps: u64,
    pub price_after_bps: u64,
    /// Absolute move of the requested side's price.
    pub price_impact_bps: u64,
}

/// Simulates `buy` exactly: same fees, same formula, same rejections.
pub fn preview_buy(
    market: &Market,
    side: Side,
    collateral_in: u128,
) -> Result<TradePreview, EngineError> {
    let quote = quote_buy(market, side, collateral_in)?;
    let price_before = price_bps(market, side)?;

    let (yes_after, no_after) = match side {
        Side::Yes => (quote.new_requested_reserve, quote.new_opposite_reserve),
        Side::No => (quote.new_opposite_reserve, quote.new_requested_reserve),
    };
    let yes_price_after = yes_price_bps(yes_after, no_after)?;
    let price_after = match side {
        Side::Yes => yes_price_after,
        Side::No => (BPS as u64) - yes_price_after,
    };

    Ok(TradePreview {
        side,
        collateral_in,
        protocol_fee: quote.protocol_fee,
        creator_fee: quote.creator_fee,
        net_in: quote.net_in,
        shares_out: quote.shares_out,
        price_before_bps: price_before,
        price_after_bps: price_after,
        price_impact_bps: price_after.abs_diff(price_before),
    })
}
