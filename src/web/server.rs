//! Search UI server
//!
//! Serves the HTML page, the JSON API and the image files on one axum
//! router bound to the configured address.

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::config::WebConfig;
use super::error::WebError;
use super::routes::{api_collections, api_search, health, index, security_middleware, serve_image};
use crate::search::SearchService;

/// Shared state for the handlers
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    pub config: Arc<WebConfig>,
}

impl AppState {
    pub fn new(search: Arc<SearchService>, config: WebConfig) -> Self {
        Self {
            search,
            config: Arc::new(config),
        }
    }
}

/// HTTP server for the search page and API
pub struct WebServer {
    state: AppState,
}

impl WebServer {
    pub fn new(search: Arc<SearchService>, config: WebConfig) -> Self {
        Self {
            state: AppState::new(search, config),
        }
    }

    pub fn config(&self) -> &WebConfig {
        &self.state.config
    }

    /// Origins allowed to call the JSON API from a browser
    pub fn allowed_origins(&self) -> Vec<String> {
        let port = self.state.config.port;
        let mut origins = vec![
            format!("http://localhost:{}", port),
            format!("http://127.0.0.1:{}", port),
        ];
        let bound = format!("http://{}", self.state.config.socket_addr());
        if !origins.contains(&bound) {
            origins.push(bound);
        }
        origins
    }

    /// Build the router with all routes and middleware
    pub fn build_router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any)
            .allow_origin(
                self.allowed_origins()
                    .iter()
                    .filter_map(|o| o.parse::<HeaderValue>().ok())
                    .collect::<Vec<_>>(),
            );

        Router::new()
            .route("/", get(index))
            .route("/api/search", get(api_search))
            .route("/api/collections", get(api_collections))
            .route("/image", get(serve_image))
            .route("/health", get(health))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(middleware::from_fn(security_middleware))
                    .layer(cors),
            )
            .with_state(self.state.clone())
    }

    /// Serve until Ctrl-C
    pub async fn start(&self) -> Result<(), WebError> {
        let addr = self.state.config.socket_addr();
        let router = self.build_router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| WebError::BindFailed {
                addr: addr.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!("Search UI listening on http://{}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| WebError::Internal { reason: e.to_string() })?;

        tracing::info!("Search UI stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}
