//! Switchboard application binary - composition root.
//!
//! Ties together all Switchboard crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Build the classifier over its language-understanding model
//! 3. Construct one adapter per capability provider
//! 4. Start the background session-eviction loop
//! 5. Start the axum REST API server

mod cli;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use switchboard_api::routes;
use switchboard_api::AppState;
use switchboard_backend::{
    DatabaseAdapter, DeflectionAdapter, DocumentAdapter, KnowledgeAdapter, RetryPolicy,
    VisualizationAdapter,
};
use switchboard_classify::{Classifier, GeminiIntentModel};
use switchboard_core::SwitchboardConfig;
use switchboard_router::{AdapterSet, Router};
use switchboard_session::SessionStore;

use cli::CliArgs;

/// Periodically sweep expired sessions.
///
/// Runs for the lifetime of the process, independent of request handling.
async fn eviction_loop(sessions: Arc<SessionStore>, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        interval.tick().await;
        match sessions.evict_expired() {
            Ok(0) => {}
            Ok(count) => tracing::debug!(count, "Eviction sweep removed sessions"),
            Err(e) => tracing::error!(error = %e, "Eviction sweep failed"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_path = args.resolve_config_path();
    let config = SwitchboardConfig::load_or_default(&config_path);
    let port = args.resolve_port(config.general.port);
    let log_level = args.resolve_log_level(&config.general.log_level);

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Switchboard v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_path.display(), "Configuration loaded");

    // Classifier.
    let model = Arc::new(GeminiIntentModel::from_config(&config.classify));
    let classifier = Classifier::new(model, Duration::from_millis(config.classify.timeout_ms));

    // Capability adapters.
    let adapters = AdapterSet {
        knowledge: Arc::new(KnowledgeAdapter::new(&config.backends.knowledge_url)),
        document: Arc::new(DocumentAdapter::new(&config.backends.document_url)),
        database: Arc::new(DatabaseAdapter::new(&config.backends.database_url)),
        visualization: Arc::new(VisualizationAdapter::new(&config.backends.visualization_url)),
        deflection: Arc::new(DeflectionAdapter),
    };

    // Session store with background eviction.
    let sessions = Arc::new(SessionStore::new(
        config.session.ttl_minutes,
        config.session.max_turns,
    ));
    tokio::spawn(eviction_loop(
        Arc::clone(&sessions),
        config.session.eviction_interval_secs,
    ));

    // Router and HTTP surface.
    let router = Router::new(
        classifier,
        adapters,
        sessions,
        RetryPolicy::from_config(&config.backends.retry),
        Duration::from_millis(config.backends.timeout_ms),
        config.limits.clone(),
    );
    let state = AppState::new(router);

    routes::start_server(port, state).await?;
    Ok(())
}
