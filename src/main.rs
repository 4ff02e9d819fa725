//! match-companion server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use match_companion::api;
use match_companion::app_state::AppState;
use match_companion::config::{CompanionConfig, LogFormat};
use match_companion::domain::{EventBus, MatchEngine, ReferenceTable};
use match_companion::service::CompanionService;
use match_companion::source::HttpHistorySource;
use match_companion::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = CompanionConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting match-companion");

    // Reference data degrades to an empty table
    let reference = match ReferenceTable::load(&config.heroes_path, &config.keyword_mappings_path) {
        Ok(table) => table,
        Err(err) => {
            tracing::warn!(error = %err, "reference data unavailable, pool analytics disabled");
            ReferenceTable::default()
        }
    };

    // Build domain layer
    let engine = MatchEngine::new(Arc::new(reference), config.change_history_capacity);
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Build service layer
    let source = Arc::new(HttpHistorySource::new(
        config.backend_url.clone(),
        config.history_fetch_timeout(),
    ));
    let service = CompanionService::new(engine, event_bus, source, config.catch_up_on_match_start);

    // Build application state
    let app_state = AppState::new(service);

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, backend = %config.backend_url, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
