// ============================================================================
// Outcome Share Ledger - VantagePoint Market Engine
// ============================================================================
//
// One ShareLedger exists per market per side (YES and NO). Shares follow an
// 18-decimal convention and are fully fungible, but mint and burn_from are
// restricted to the engine vault identity: nothing else may create or
// destroy shares. The vault's own balance is the AMM reserve seeded at
// market creation; the engine never holds shares on a user's behalf beyond
// that reserve.
//
// ============================================================================

use crate::errors::EngineError;
use crate::math::checked_add;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Advertised decimal convention of outcome share tokens.
pub const SHARE_DECIMALS: u32 = 18;

/// Fungible outcome shares for one side of one market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLedger {
    /// Identity allowed to mint and burn (the engine vault).
    owner: String,
    /// Display symbol, e.g. "VP-7-YES".
    pub symbol: String,
    balances: HashMap<String, u128>,
    total_supply: u128,
}

impl ShareLedger {
    /// Creates the ledger with `seed` pre-minted to the owner. The seed is
    /// the AMM reserve that keeps the pool priced from day one.
    pub fn new(owner: &str, symbol: String, seed: u128) -> Self {
        let mut balances = HashMap::new();
        balances.insert(owner.to_string(), seed);
        Self {
            owner: owner.to_string(),
            symbol,
            balances,
            total_supply: seed,
        }
    }

    pub fn balance_of(&self, holder: &str) -> u128 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    fn require_owner(&self, caller: &str) -> Result<(), EngineError> {
        if caller != self.owner {
            return Err(EngineError::InvalidParams(
                "share mint/burn restricted to the market engine".into(),
            ));
        }
        Ok(())
    }

    /// Mints new shares to a holder. Engine vault only.
    pub fn mint(&mut self, caller: &str, to: &str, amount: u128) -> Result<(), EngineError> {
        self.require_owner(caller)?;
        let new_balance = checked_add(self.balance_of(to), amount)?;
        self.total_supply = checked_add(self.total_supply, amount)?;
        self.balances.insert(to.to_string(), new_balance);
        Ok(())
    }

    /// Burns shares out of a holder's balance. Engine vault only; fails if
    /// the holder cannot cover the amount.
    pub fn burn_from(
        &mut self,
        caller: &str,
        holder: &str,
        amount: u128,
    ) -> Result<(), EngineError> {
        self.require_owner(caller)?;
        let balance = self.balance_of(holder);
        if balance < amount {
            return Err(EngineError::InsufficientShares);
        }
        self.balances.insert(holder.to_string(), balance - amount);
        self.total_supply -= amount; // cannot underflow: balance <= total_supply
        Ok(())
    }

    /// Holder-to-holder transfer, unrestricted.
    pub fn transfer(&mut self, from: &str, to: &str, amount: u128) -> Result<(), EngineError> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(EngineError::InsufficientShares);
        }
        let to_balance = checked_add(self.balance_of(to), amount)?;
        self.balances.insert(from.to_string(), from_balance - amount);
        self.balances.insert(to.to_string(), to_balance);
        Ok(())
    }
}
