// Environment-driven service configuration.

use tracing::info;

/// Runtime configuration, read once at startup. Every value has a default
/// so the service runs out of the box; production deployments override via
/// environment (or a .env file, loaded by main).
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port for the HTTP API.
    pub port: u16,
    /// Address trusted as the resolution oracle.
    pub oracle_address: String,
    /// Address holding governance powers (fee sweeps, dispute arbitration,
    /// oracle rotation) and receiving forfeited bonds.
    pub governance_address: String,
    /// Collateral granted per faucet call, in base units.
    pub faucet_amount: u128,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("VP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4000);
        let oracle_address =
            std::env::var("VP_ORACLE_ADDRESS").unwrap_or_else(|_| "vp:oracle".to_string());
        let governance_address =
            std::env::var("VP_GOVERNANCE_ADDRESS").unwrap_or_else(|_| "vp:governance".to_string());
        let faucet_amount = std::env::var("VP_FAUCET_AMOUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10_000_000_000); // 10,000 USDC

        info!(port, oracle = %oracle_address, governance = %governance_address, "config loaded");
        Self {
            port,
            oracle_address,
            governance_address,
            faucet_amount,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 4000,
            oracle_address: "vp:oracle".to_string(),
            governance_address: "vp:governance".to_string(),
            faucet_amount: 10_000_000_000,
        }
    }
}
