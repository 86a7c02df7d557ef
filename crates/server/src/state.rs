use std::sync::Arc;
use ratefire_core::{BenchSession, Config};

/// Shared application state
pub struct AppState {
    session: Arc<BenchSession>,
}

impl AppState {
    pub fn new(session: Arc<BenchSession>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &BenchSession {
        self.session.as_ref()
    }

    pub fn config(&self) -> &Config {
        self.session.config()
    }
}
