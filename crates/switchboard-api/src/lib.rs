//! Switchboard API crate - axum HTTP server and route handlers.
//!
//! Exposes the unified chat endpoint, session management, health checks,
//! and per-capability sub-routes for direct integration and debugging.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
