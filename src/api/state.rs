use std::sync::Arc;

use crate::engine::Roster;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub roster: Arc<Roster>,
}

impl AppState {
    pub fn new(roster: Arc<Roster>) -> Self {
        Self { roster }
    }
}
