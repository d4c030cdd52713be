//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, body limits, and all
//! endpoint handlers, including the per-capability sub-routes.

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use switchboard_core::Capability;

use crate::handlers;
use crate::state::AppState;

/// Global body ceiling: the 5 MB file limit plus form overhead. Oversize
/// uploads inside this ceiling are rejected by validation with a specific
/// cause rather than a generic 413.
const MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // The providers sit behind this service; the chat surface itself is
    // open to any origin, as the upstream deployment expects.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat))
        .route("/chat/clear/{session_id}", post(handlers::clear_session))
        .nest("/lf-assist", capability_routes(Capability::Knowledge))
        .nest("/doc-assist", capability_routes(Capability::Document))
        .nest("/db-assist", capability_routes(Capability::Database))
        .nest("/viz-assist", capability_routes(Capability::Visualization))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// The sub-router mirroring the unified surface for one capability.
///
/// Same request/response shapes, but dispatch bypasses classification.
fn capability_routes(capability: Capability) -> Router<AppState> {
    Router::new()
        .route(
            "/chat",
            post(move |State(state): State<AppState>, multipart: Multipart| async move {
                handlers::chat_direct(capability, state, multipart).await
            }),
        )
        .route(
            "/clear/{session_id}",
            post(
                |state: State<AppState>, path: Path<String>| async move {
                    handlers::clear_session(state, path).await
                },
            ),
        )
        .route(
            "/sessions",
            get(move |State(state): State<AppState>| async move {
                handlers::sessions_direct(capability, state).await
            }),
        )
        .route(
            "/history/{session_id}",
            get(
                |State(state): State<AppState>, Path(session_id): Path<String>| async move {
                    handlers::history_direct(state, session_id).await
                },
            ),
        )
}

/// Start the HTTP server on the configured address.
///
/// Binds to 127.0.0.1 (localhost only) on the port from config.
pub async fn start_server(
    port: u16,
    state: AppState,
) -> Result<(), switchboard_core::SwitchboardError> {
    let addr = format!("127.0.0.1:{}", port);
    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| switchboard_core::SwitchboardError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| switchboard_core::SwitchboardError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
