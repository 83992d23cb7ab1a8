//! # HyperHelix HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /`, `GET /health` - Liveness
//! - `GET /status` - Graph metrics and wired hooks
//! - `GET /summary` - One-line text summary
//! - `GET /export` - Full JSON dump
//! - `GET|POST /nodes`, `GET|DELETE /nodes/{id}`, `POST /nodes/{id}/execute`
//! - `GET|POST /edges`, `GET /edges/{id}`, `DELETE /edges/{a}/{b}`
//! - `GET /walk/{id}?depth=N` - Spiral walk
//! - `GET /path/{a}/{b}` - Weighted shortest path
//! - `GET /tags/{tag}` - Nodes carrying a tag
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `HELIX_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod types;

pub use types::{
    ApiError, CreateNodeRequest, EdgeJson, EdgeRequest, ErrorResponse, ExecuteResponse,
    HealthResponse, NodeResponse, PathResponse, StatusResponse, SummaryResponse, WalkParams,
    WalkResponse,
};

use crate::payload::Payload;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post},
};
use helix_core::primitives::DEFAULT_WALK_DEPTH;
use helix_core::{Graph, HelixError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the graph.
#[derive(Clone)]
pub struct AppState {
    /// The graph. The engine has no internal locking, so all access goes
    /// through this lock.
    pub graph: Arc<RwLock<Graph<Payload>>>,
    /// Depth used by `/walk` when the query string has none.
    pub walk_depth: usize,
}

impl AppState {
    /// Create new app state around a graph.
    #[must_use]
    pub fn new(graph: Graph<Payload>) -> Self {
        Self {
            graph: Arc::new(RwLock::new(graph)),
            walk_depth: DEFAULT_WALK_DEPTH,
        }
    }

    #[must_use]
    pub fn with_walk_depth(mut self, depth: usize) -> Self {
        self.walk_depth = depth;
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::DELETE, Method::OPTIONS];

/// Build CORS layer from `HELIX_CORS_ORIGINS`.
///
/// - "*": allows all origins
/// - unset: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("HELIX_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (HELIX_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in HELIX_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(CORS_METHODS)
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => {
            tracing::info!("CORS: No HELIX_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root_handler))
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/summary", get(handlers::summary_handler))
        .route("/export", get(handlers::export_handler))
        .route(
            "/nodes",
            get(handlers::list_nodes_handler).post(handlers::create_node_handler),
        )
        .route(
            "/nodes/{id}",
            get(handlers::get_node_handler).delete(handlers::delete_node_handler),
        )
        .route("/nodes/{id}/execute", post(handlers::execute_node_handler))
        .route(
            "/edges",
            get(handlers::list_edges_handler).post(handlers::create_edge_handler),
        )
        .route("/edges/{id}", get(handlers::node_edges_handler))
        .route("/edges/{a}/{b}", delete(handlers::delete_edge_handler))
        .route("/walk/{id}", get(handlers::walk_handler))
        .route("/path/{a}/{b}", get(handlers::path_handler))
        .route("/tags/{tag}", get(handlers::tag_handler))
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), HelixError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| HelixError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("HyperHelix HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HelixError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
