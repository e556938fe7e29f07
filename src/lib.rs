/// VantagePoint Prediction Market Engine
/// Exports all modules for use as a library crate

pub mod app_state;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod ledger;
pub mod market;
pub mod math;
pub mod orderbook;
pub mod position;
pub mod resolution;
pub mod shares;

pub use app_state::{AppState, SharedState};
pub use config::Config;
pub use engine::{Engine, MarketState, VAULT};
pub use errors::EngineError;
pub use events::{EngineEvent, EventRecord};
pub use ledger::{CollateralLedger, COLLATERAL_DECIMALS};
pub use market::{
    amm, Market, MarketStatus, Outcome, Side, CREATOR_FEE_BPS, DISPUTE_BONUS_BPS,
    DISPUTE_WINDOW_SECS, INITIAL_SHARE_SUPPLY, MIN_INITIAL_LIQUIDITY, PROTOCOL_FEE_BPS,
    TRUTH_BOND_AMOUNT,
};
pub use orderbook::{LimitOrder, OrderDirection, MAX_LIMIT_PRICE_BPS};
pub use position::Position;
pub use resolution::TruthBond;
pub use shares::{ShareLedger, SHARE_DECIMALS};
