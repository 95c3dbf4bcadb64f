use std::sync::Arc;

use crate::auth::{CredentialStore, SessionStore};
use crate::gateway::QueryGateway;

/// Shared server state handed to every handler. Sessions are owned here and
/// injected, not module-level globals, so tests can stand up isolated
/// instances and the store can later be swapped for an external one.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialStore>,
    pub sessions: Arc<SessionStore>,
    pub gateway: Arc<QueryGateway>,
}

impl AppState {
    pub fn new(credentials: CredentialStore, gateway: QueryGateway) -> Self {
        Self {
            credentials: Arc::new(credentials),
            sessions: Arc::new(SessionStore::new()),
            gateway: Arc::new(gateway),
        }
    }
}
