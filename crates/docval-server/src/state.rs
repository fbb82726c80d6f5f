use docval::agent::Agent;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The agent holds no per-request state, so every request shares it
    pub agent: Arc<Agent>,
    /// Wall-clock budget for one chat reply
    pub timeout: Duration,
}

impl AppState {
    pub fn new(agent: Agent, timeout: Duration) -> Self {
        Self {
            agent: Arc::new(agent),
            timeout,
        }
    }
}
