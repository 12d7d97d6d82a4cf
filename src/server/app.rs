//! Relay HTTP server with axum router and graceful shutdown.

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::ServerError;
use super::handlers::{
    get_events_sse, get_health, get_logs, get_metrics, post_relay, RELAY_PATH, RELAY_PATH_ALIAS,
};
use super::state::AppState;
use crate::config::ServerConfig;

/// HTTP server exposing the relay.
pub struct RelayServer {
    /// Server configuration.
    config: ServerConfig,
    /// Application state shared across handlers.
    state: AppState,
}

impl RelayServer {
    /// Create a new server with default configuration.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            config: ServerConfig::default(),
            state,
        }
    }

    /// Set the server configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configured address as a string.
    #[must_use]
    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Token that stops the server when cancelled.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.state.cancel.clone()
    }

    /// Build the axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route(RELAY_PATH, post(post_relay))
            .route(RELAY_PATH_ALIAS, post(post_relay))
            .route("/api/logs", get(get_logs))
            .route("/api/metrics", get(get_metrics))
            .route("/api/events", get(get_events_sse))
            .route("/api/health", get(get_health))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Run the server, binding to the configured address.
    ///
    /// The server runs until the cancellation token is triggered, then
    /// drains in-flight requests and waits for queued audit writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or serve.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.address();
        let cancel = self.cancel_token();
        let recorder = self.state.relay.recorder().clone();
        let app = self.build_router();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::BindError {
                address: addr.clone(),
                source,
            })?;

        tracing::info!(address = %addr, model = self.state.relay.model(), "Starting relay server");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("Relay server shutting down gracefully");
            })
            .await
            .map_err(ServerError::Serve)?;

        recorder.flush().await;
        Ok(())
    }
}
