// ============================================================================
// Truth Bonds - VantagePoint Market Engine
// ============================================================================
//
// A truth bond is collateral posted to challenge an oracle report during the
// dispute window. At most one unresolved bond exists per market; governance
// arbitration resolves it exactly once.
//
// ============================================================================

use crate::market::Outcome;
use serde::{Deserialize, Serialize};

/// A posted dispute bond awaiting governance arbitration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruthBond {
    /// Monotonically increasing id, never reused.
    pub id: u64,

    pub market_id: u64,

    /// Address that posted the bond.
    pub disputer: String,

    /// Collateral locked with the bond (always TRUTH_BOND_AMOUNT).
    pub amount: u128,

    /// The oracle outcome being challenged.
    pub disputed_outcome: Outcome,

    /// The outcome the disputer asserts instead. Differs from the above.
    pub proposed_outcome: Outcome,

    pub resolved: bool,

    pub created_at: u64,
}
