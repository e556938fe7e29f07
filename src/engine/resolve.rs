// ============================================================================
// Resolution & Dispute Operations - VantagePoint Market Engine
// ============================================================================
//
// State machine:
//
//   Open --submit_outcome--> Resolving --finalize--> Resolved
//                                |                      ^
//                           file_dispute                |
//                                v                      |
//                            Disputed --resolve_dispute-+
//
// submit_outcome: oracle only, at or after resolutionTime, exactly once.
// file_dispute:   anyone, strictly before disputeEndTime, posts the fixed
//                 truth bond, proposes a different decided outcome.
// resolve_dispute: governance only. Upheld pays the disputer 1.5x the bond
//                 (bonus debited from the market pool); rejected forfeits
//                 the bond to the governance treasury.
// finalize:       anyone, strictly after disputeEndTime, no pending bond.
//
// ============================================================================

use crate::engine::{Engine, VAULT};
use crate::errors::EngineError;
use crate::events::EngineEvent;
use crate::market::{MarketStatus, Outcome, DISPUTE_BONUS_BPS, TRUTH_BOND_AMOUNT};
use crate::math::{bps_of, checked_add, checked_sub};
use crate::resolution::TruthBond;
use tracing::info;

impl Engine {
    /// Oracle entry point: reports the market's outcome, opening the
    /// dispute window. Callable once, at or after resolutionTime.
    pub fn submit_outcome(
        &mut self,
        caller: &str,
        market_id: u64,
        outcome: Outcome,
        now: u64,
    ) -> Result<(), EngineError> {
        self.require_oracle(caller)?;
        if !outcome.is_decided() {
            return Err(EngineError::UndecidedOutcome);
        }
        let state = self.state_mut(market_id)?;
        let market = &mut state.market;
        if market.oracle_settled {
            return Err(EngineError::AlreadySettled);
        }
        if market.status != MarketStatus::Open {
            return Err(EngineError::InvalidStatus(market.status.to_string()));
        }
        if now < market.resolution_time {
            return Err(EngineError::InvalidStatus(
                "resolution time not reached".into(),
            ));
        }

        market.outcome = outcome;
        market.oracle_settled = true;
        market.status = MarketStatus::Resolving;

        info!(market_id, ?outcome, "oracle outcome submitted");
        self.emit(now, EngineEvent::OutcomeSubmitted { market_id, outcome });
        Ok(())
    }

    /// Permissionless time-gated transition to Resolved once the dispute
    /// window has passed with no pending bond.
    pub fn finalize(&mut self, market_id: u64, now: u64) -> Result<(), EngineError> {
        let state = self.state_mut(market_id)?;
        let market = &mut state.market;
        match market.status {
            MarketStatus::Resolving => {}
            MarketStatus::Disputed => return Err(EngineError::DisputePending),
            other => return Err(EngineError::InvalidStatus(other.to_string())),
        }
        if now <= market.dispute_end_time {
            return Err(EngineError::DisputeWindowOpen);
        }

        market.status = MarketStatus::Resolved;
        let outcome = market.outcome;
        self.retire_market(market_id);

        info!(market_id, ?outcome, "market resolved");
        self.emit(now, EngineEvent::MarketResolved { market_id, outcome });
        Ok(())
    }

    /// Challenges the oracle's report by posting the fixed truth bond and
    /// proposing a different outcome. One pending dispute per market.
    pub fn file_dispute(
        &mut self,
        caller: &str,
        market_id: u64,
        proposed_outcome: Outcome,
        now: u64,
    ) -> Result<u64, EngineError> {
        let state = self.market_state(market_id)?;
        let market = &state.market;
        match market.status {
            MarketStatus::Resolving => {}
            MarketStatus::Disputed => return Err(EngineError::DisputePending),
            other => return Err(EngineError::InvalidStatus(other.to_string())),
        }
        if market.truth_bond.is_some() {
            return Err(EngineError::DisputePending);
        }
        if now >= market.dispute_end_time {
            return Err(EngineError::DisputeWindowClosed);
        }
        if !proposed_outcome.is_decided() {
            return Err(EngineError::UndecidedOutcome);
        }
        if proposed_outcome == market.outcome {
            return Err(EngineError::SameOutcome);
        }
        self.collateral.can_pull(VAULT, caller, TRUTH_BOND_AMOUNT)?;
        let disputed_outcome = market.outcome;

        let bond_id = self.next_bond_id();
        self.collateral
            .transfer_from(VAULT, caller, VAULT, TRUTH_BOND_AMOUNT)?;
        self.insert_bond(TruthBond {
            id: bond_id,
            market_id,
            disputer: caller.to_string(),
            amount: TRUTH_BOND_AMOUNT,
            disputed_outcome,
            proposed_outcome,
            resolved: false,
            created_at: now,
        });
        let state = self.state_mut(market_id)?;
        state.market.truth_bond = Some(bond_id);
        state.market.status = MarketStatus::Disputed;

        info!(market_id, bond_id, disputer = caller, "dispute filed");
        self.emit(
            now,
            EngineEvent::DisputeFiled {
                market_id,
                bond_id,
                disputer: caller.to_string(),
                proposed_outcome,
                bond: TRUTH_BOND_AMOUNT,
            },
        );
        Ok(bond_id)
    }

    /// Governance arbitration of a pending dispute. Upheld replaces the
    /// outcome with `final_outcome` and pays the disputer their bond plus a
    /// 50% bonus out of the market pool; rejected forfeits the bond to the
    /// governance treasury. Either way the market resolves.
    pub fn resolve_dispute(
        &mut self,
        caller: &str,
        market_id: u64,
        upheld: bool,
        final_outcome: Outcome,
        now: u64,
    ) -> Result<(), EngineError> {
        self.require_governance(caller)?;
        let state = self.market_state(market_id)?;
        let market = &state.market;
        if market.status != MarketStatus::Disputed {
            return Err(EngineError::NoDisputePending);
        }
        let bond_id = market.truth_bond.ok_or(EngineError::NoDisputePending)?;
        let bond = self
            .bond(bond_id)
            .ok_or(EngineError::NoDisputePending)?
            .clone();

        // Stage the payout legs before mutating anything.
        let governance = self.governance().to_string();
        let (outcome, new_total_liquidity, payee, payment) = if upheld {
            if !final_outcome.is_decided() {
                return Err(EngineError::UndecidedOutcome);
            }
            let bonus = bps_of(bond.amount, DISPUTE_BONUS_BPS)?;
            let pool_after = checked_sub(market.total_liquidity, bonus)
                .map_err(|_| EngineError::InsufficientLiquidity)?;
            let payment = checked_add(bond.amount, bonus)?;
            if self.collateral.balance_of(VAULT) < payment {
                return Err(EngineError::InsufficientLiquidity);
            }
            (final_outcome, pool_after, bond.disputer.clone(), payment)
        } else {
            (market.outcome, market.total_liquidity, governance, bond.amount)
        };

        // Commit.
        self.collateral.transfer(VAULT, &payee, payment)?;
        self.bond_mut(bond_id)?.resolved = true;
        let state = self.state_mut(market_id)?;
        state.market.outcome = outcome;
        state.market.total_liquidity = new_total_liquidity;
        state.market.truth_bond = None;
        state.market.status = MarketStatus::Resolved;
        self.retire_market(market_id);

        info!(market_id, bond_id, upheld, ?outcome, "dispute resolved");
        self.emit(
            now,
            EngineEvent::DisputeResolved {
                market_id,
                bond_id,
                upheld,
                final_outcome: outcome,
            },
        );
        self.emit(now, EngineEvent::MarketResolved { market_id, outcome });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests_support::*;

    fn resolving_market() -> (Engine, u64) {
        let (mut engine, id) = funded_market();
        engine
            .submit_outcome(ORACLE, id, Outcome::Yes, RESOLUTION_TIME)
            .unwrap();
        (engine, id)
    }

    #[test]
    fn test_submit_outcome_happy_path() {
        let (engine, id) = resolving_market();
        let market = engine.market(id).unwrap();
        assert_eq!(market.status, MarketStatus::Resolving);
        assert_eq!(market.outcome, Outcome::Yes);
        assert!(market.oracle_settled);
    }

    #[test]
    fn test_submit_outcome_authorization_and_gates() {
        let (mut engine, id) = funded_market();
        assert_eq!(
            engine.submit_outcome("alice", id, Outcome::Yes, RESOLUTION_TIME),
            Err(EngineError::NotOracle)
        );
        assert_eq!(
            engine.submit_outcome(ORACLE, id, Outcome::Unresolved, RESOLUTION_TIME),
            Err(EngineError::UndecidedOutcome)
        );
        // Too early.
        assert!(matches!(
            engine.submit_outcome(ORACLE, id, Outcome::Yes, RESOLUTION_TIME - 1),
            Err(EngineError::InvalidStatus(_))
        ));
        // Only once.
        engine
            .submit_outcome(ORACLE, id, Outcome::Yes, RESOLUTION_TIME)
            .unwrap();
        assert_eq!(
            engine.submit_outcome(ORACLE, id, Outcome::No, RESOLUTION_TIME + 1),
            Err(EngineError::AlreadySettled)
        );
    }

    #[test]
    fn test_finalize_is_time_gated_and_permissionless() {
        let (mut engine, id) = resolving_market();
        // At the boundary the window is still open; strictly after passes.
        assert_eq!(
            engine.finalize(id, DISPUTE_END),
            Err(EngineError::DisputeWindowOpen)
        );
        engine.finalize(id, DISPUTE_END + 1).unwrap();

        let market = engine.market(id).unwrap();
        assert_eq!(market.status, MarketStatus::Resolved);
        assert_eq!(market.outcome, Outcome::Yes);
        assert!(engine.active_markets().is_empty());

        // Already resolved.
        assert!(matches!(
            engine.finalize(id, DISPUTE_END + 2),
            Err(EngineError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_finalize_requires_submission() {
        let (mut engine, id) = funded_market();
        assert!(matches!(
            engine.finalize(id, DISPUTE_END + 1),
            Err(EngineError::InvalidStatus(_))
        ));
    }

    #[test]
    fn test_dispute_window_is_24_hours() {
        let (engine, id) = resolving_market();
        let market = engine.market(id).unwrap();
        assert_eq!(market.dispute_end_time, market.resolution_time + 86_400);
    }

    #[test]
    fn test_file_dispute_validations() {
        let (mut engine, id) = resolving_market();
        // Same outcome as the oracle's report.
        assert_eq!(
            engine.file_dispute("bob", id, Outcome::Yes, RESOLUTION_TIME + 10),
            Err(EngineError::SameOutcome)
        );
        assert_eq!(
            engine.file_dispute("bob", id, Outcome::Unresolved, RESOLUTION_TIME + 10),
            Err(EngineError::UndecidedOutcome)
        );
        // Window closes exactly at dispute_end_time.
        assert_eq!(
            engine.file_dispute("bob", id, Outcome::No, DISPUTE_END),
            Err(EngineError::DisputeWindowClosed)
        );
    }

    #[test]
    fn test_file_dispute_locks_bond_and_blocks_finalize() {
        let (mut engine, id) = resolving_market();
        let bob_before = engine.collateral.balance_of("bob");

        let bond_id = engine
            .file_dispute("bob", id, Outcome::No, RESOLUTION_TIME + 10)
            .unwrap();
        assert_eq!(
            engine.collateral.balance_of("bob"),
            bob_before - TRUTH_BOND_AMOUNT
        );
        let market = engine.market(id).unwrap();
        assert_eq!(market.status, MarketStatus::Disputed);
        assert_eq!(market.truth_bond, Some(bond_id));

        // Second dispute rejected while one is pending.
        assert_eq!(
            engine.file_dispute("alice", id, Outcome::No, RESOLUTION_TIME + 11),
            Err(EngineError::DisputePending)
        );
        // Finalize blocked while disputed.
        assert_eq!(
            engine.finalize(id, DISPUTE_END + 1),
            Err(EngineError::DisputePending)
        );
    }

    #[test]
    fn test_upheld_dispute_pays_150_percent() {
        let (mut engine, id) = resolving_market();
        let bob_before = engine.collateral.balance_of("bob");
        let pool_before = engine.market(id).unwrap().total_liquidity;

        let bond_id = engine
            .file_dispute("bob", id, Outcome::No, RESOLUTION_TIME + 10)
            .unwrap();
        engine
            .resolve_dispute(GOV, id, true, Outcome::No, RESOLUTION_TIME + 100)
            .unwrap();

        // Bond back plus 50% bonus.
        let bonus = TRUTH_BOND_AMOUNT / 2;
        assert_eq!(engine.collateral.balance_of("bob"), bob_before + bonus);

        let market = engine.market(id).unwrap();
        assert_eq!(market.status, MarketStatus::Resolved);
        assert_eq!(market.outcome, Outcome::No);
        assert_eq!(market.truth_bond, None);
        assert_eq!(market.total_liquidity, pool_before - bonus);
        assert!(engine.bond(bond_id).unwrap().resolved);
    }

    #[test]
    fn test_rejected_dispute_forfeits_bond_to_governance() {
        let (mut engine, id) = resolving_market();
        let gov_before = engine.collateral.balance_of(GOV);
        let pool_before = engine.market(id).unwrap().total_liquidity;

        engine
            .file_dispute("bob", id, Outcome::No, RESOLUTION_TIME + 10)
            .unwrap();
        engine
            .resolve_dispute(GOV, id, false, Outcome::Unresolved, RESOLUTION_TIME + 100)
            .unwrap();

        // Governance receives exactly the bond; the original outcome stands;
        // the pool is untouched.
        assert_eq!(
            engine.collateral.balance_of(GOV),
            gov_before + TRUTH_BOND_AMOUNT
        );
        let market = engine.market(id).unwrap();
        assert_eq!(market.outcome, Outcome::Yes);
        assert_eq!(market.status, MarketStatus::Resolved);
        assert_eq!(market.total_liquidity, pool_before);
    }

    #[test]
    fn test_resolve_dispute_is_governance_gated() {
        let (mut engine, id) = resolving_market();
        engine
            .file_dispute("bob", id, Outcome::No, RESOLUTION_TIME + 10)
            .unwrap();
        assert_eq!(
            engine.resolve_dispute("bob", id, true, Outcome::No, RESOLUTION_TIME + 20),
            Err(EngineError::NotGovernance)
        );
        // No pending dispute after arbitration.
        engine
            .resolve_dispute(GOV, id, false, Outcome::Unresolved, RESOLUTION_TIME + 30)
            .unwrap();
        assert_eq!(
            engine.resolve_dispute(GOV, id, false, Outcome::Unresolved, RESOLUTION_TIME + 40),
            Err(EngineError::NoDisputePending)
        );
    }

    #[test]
    fn test_trading_blocked_after_submission() {
        let (mut engine, id) = resolving_market();
        assert_eq!(
            engine.buy("bob", id, crate::market::Side::Yes, 10 * USDC, 0, RESOLUTION_TIME + 5),
            Err(EngineError::TradingClosed)
        );
    }
}
