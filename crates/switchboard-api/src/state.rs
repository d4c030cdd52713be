//! Application state shared across all route handlers.

use std::sync::Arc;

use switchboard_backend::HealthMonitor;
use switchboard_router::Router;
use switchboard_session::SessionStore;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// The router/dispatcher handling every chat turn.
    pub router: Arc<Router>,
    /// Health monitor over all capability adapters.
    pub monitor: Arc<HealthMonitor>,
    /// The session store, shared with the router.
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    /// Create state around a fully constructed router.
    ///
    /// The health monitor probes the same adapters the router dispatches to.
    pub fn new(router: Router) -> Self {
        let monitor = HealthMonitor::new(router.adapters().all());
        let sessions = Arc::clone(router.sessions());
        Self {
            router: Arc::new(router),
            monitor: Arc::new(monitor),
            sessions,
        }
    }
}
