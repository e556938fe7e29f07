// ============================================================================
// Collateral Ledger - VantagePoint Market Engine
// ============================================================================
//
// In-process model of the external settlement asset: a 6-decimal fungible
// balance ledger with allowance semantics. The engine never moves a user's
// collateral directly; it pulls via transfer_from (requiring a prior
// approval of the engine vault) and pays out via transfer from the vault.
//
// All amounts are u128 base units (1 unit = 10^-6 of the asset).
//
// ============================================================================

use crate::errors::EngineError;
use crate::math::checked_add;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Decimal places of the settlement asset.
pub const COLLATERAL_DECIMALS: u32 = 6;

/// Fungible collateral balances with allowances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollateralLedger {
    /// address -> balance
    balances: HashMap<String, u128>,
    /// (owner, spender) -> remaining allowance
    allowances: HashMap<(String, String), u128>,
    total_supply: u128,
}

impl CollateralLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, address: &str) -> u128 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &str, spender: &str) -> u128 {
        self.allowances
            .get(&(owner.to_string(), spender.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Faucet-style issuance. Test and dev funding path only; a deployment
    /// backed by a real asset would replace this with deposits.
    pub fn mint(&mut self, to: &str, amount: u128) -> Result<(), EngineError> {
        let new_balance = checked_add(self.balance_of(to), amount)?;
        self.total_supply = checked_add(self.total_supply, amount)?;
        self.balances.insert(to.to_string(), new_balance);
        Ok(())
    }

    pub fn approve(&mut self, owner: &str, spender: &str, amount: u128) {
        self.allowances
            .insert((owner.to_string(), spender.to_string()), amount);
    }

    pub fn transfer(&mut self, from: &str, to: &str, amount: u128) -> Result<(), EngineError> {
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(EngineError::InsufficientBalance);
        }
        let to_balance = checked_add(self.balance_of(to), amount)?;
        self.balances.insert(from.to_string(), from_balance - amount);
        self.balances.insert(to.to_string(), to_balance);
        Ok(())
    }

    /// Spender-initiated pull, debiting the owner's allowance.
    pub fn transfer_from(
        &mut self,
        spender: &str,
        owner: &str,
        to: &str,
        amount: u128,
    ) -> Result<(), EngineError> {
        let allowed = self.allowance(owner, spender);
        if allowed < amount {
            return Err(EngineError::InsufficientAllowance);
        }
        if self.balance_of(owner) < amount {
            return Err(EngineError::InsufficientBalance);
        }
        self.transfer(owner, to, amount)?;
        self.allowances
            .insert((owner.to_string(), spender.to_string()), allowed - amount);
        Ok(())
    }

    /// Non-mutating pre-check used by engine operations that must validate
    /// every transfer before touching any state.
    pub fn can_pull(&self, spender: &str, owner: &str, amount: u128) -> Result<(), EngineError> {
        if self.allowance(owner, spender) < amount {
            return Err(EngineError::InsufficientAllowance);
        }
        if self.balance_of(owner) < amount {
            return Err(EngineError::InsufficientBalance);
        }
        Ok(())
    }
}
