//! Application state shared across routes

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::game::ServerHandle;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Channel into the tick loop plus its published status
    pub server: ServerHandle,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, server: ServerHandle) -> Self {
        Self {
            config: Arc::new(config),
            server,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
