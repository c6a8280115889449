use crate::session::WalkthroughSession;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The session this process drives
    pub session: Arc<WalkthroughSession>,
}

impl AppState {
    pub fn new(session: Arc<WalkthroughSession>) -> Self {
        Self { session }
    }
}
