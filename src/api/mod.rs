//! chat-hub HTTP API
//!
//! HTTP layer for the event hub, built with Axum.
//!
//! # Endpoints
//!
//! ## Chat
//! - `POST /api/message` - Publish a message
//! - `GET /api/events` - Server-Sent Events stream (`history`, then `message` events)
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health` - Hub status
//!
//! # Example
//!
//! ```rust,ignore
//! use chat_hub::api::{serve, AppState};
//! use chat_hub::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let state = AppState::with_hub_config(config.hub.to_hub_config(), config.server);
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/message", post(routes::message::publish_message))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .route("/events", get(routes::events::event_stream));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/", get(routes::health::full_health));

    let cors_permissive = state.config.cors_permissive;
    let shared_state = Arc::new(state);

    let mut router = Router::new()
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router = router.layer(CorsLayer::permissive());
    }

    router.with_state(shared_state)
}

/// Start the API server
///
/// On shutdown the hub is shut down too, which ends every open event
/// stream so the graceful shutdown can complete.
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let hub = Arc::clone(&state.hub);
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("chat-hub listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            hub.shutdown();
        })
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("chat-hub shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
