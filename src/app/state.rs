//! Application state shared across routes

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::Config;
use crate::game::ArenaHandle;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub arena: ArenaHandle,
    next_player_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(config: Config, arena: ArenaHandle) -> Self {
        Self {
            config: Arc::new(config),
            arena,
            next_player_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate the id for a new connection ("1", "2", ...)
    pub fn allocate_player_id(&self) -> String {
        self.next_player_id.fetch_add(1, Ordering::Relaxed).to_string()
    }
}
