//! Application state for the web layer.

use std::sync::Arc;

use crate::bakalari::Client;

/// Shared application state.
///
/// Holds the already-authenticated client, constructed once at startup
/// and injected here; handlers never build their own.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<Client>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}
