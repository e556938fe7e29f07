// Application state management

use crate::config::Config;
use crate::engine::Engine;
use std::sync::{Arc, Mutex};
use tracing::info;

pub type SharedState = Arc<Mutex<AppState>>;

/// Everything the HTTP layer owns: the engine behind one writer lock, plus
/// the startup configuration. Mutating handlers lock the state for the full
/// operation, which serializes the engine and makes every call atomic.
pub struct AppState {
    pub engine: Engine,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        info!("initializing VantagePoint market engine");
        let engine = Engine::new(
            config.oracle_address.clone(),
            config.governance_address.clone(),
        );
        Self { engine, config }
    }

    pub fn shared(config: Config) -> SharedState {
        Arc::new(Mutex::new(Self::new(config)))
    }
}
