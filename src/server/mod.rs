//! HTTP surface: router assembly, error mapping, lifecycle.
//!
//! The handlers are deliberately thin — deserialize, call the operation
//! executor, shape the response. All query construction lives below the
//! [`GraphSession`] seam.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, OnceLock};

use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{fmt, EnvFilter};

use crate::engine::{GraphSession, Neo4jSession};
use crate::error::RedifyError;

mod handlers;

/// Shared handler state: the process-wide session provider.
pub type SharedSession = Arc<dyn GraphSession>;

/// Runtime options used to boot the HTTP server.
#[derive(Clone, Debug)]
pub struct ServeOptions {
    /// Network interface to bind to.
    pub host: IpAddr,
    /// Listening port.
    pub port: u16,
    /// Bolt endpoint of the graph engine.
    pub bolt_uri: String,
    /// Engine username.
    pub bolt_user: String,
    /// Engine password.
    pub bolt_password: String,
    /// Allowed CORS origins for browser callers.
    pub allow_origins: Vec<String>,
}

/// Errors that can occur while starting the server.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Connecting to the graph engine failed.
    #[error("failed to connect to graph engine: {0}")]
    Connect(#[from] RedifyError),
    /// Binding the TCP listener failed.
    #[error("failed to bind listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Connects the session provider, then serves until shutdown.
pub async fn serve(options: ServeOptions) -> Result<(), ServeError> {
    install_tracing_subscriber();

    let session: SharedSession = Arc::new(
        Neo4jSession::connect(&options.bolt_uri, &options.bolt_user, &options.bolt_password)
            .await?,
    );
    let app = build_router(session, &options.allow_origins);
    let addr = SocketAddr::from((options.host, options.port));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(%addr, bolt_uri = %options.bolt_uri, "gateway listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Builds the full route table over any session implementation. Public
/// so tests can mount the router on a scripted session.
pub fn build_router(session: SharedSession, allow_origins: &[String]) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/nodes/create-single-label",
            post(handlers::create_node_single_label),
        )
        .route(
            "/api/nodes/create-multiple-labels",
            post(handlers::create_node_multiple_labels),
        )
        .route(
            "/api/nodes/create-with-properties",
            post(handlers::create_node_with_properties),
        )
        .route("/api/nodes/get-single", post(handlers::get_single_node))
        .route("/api/nodes/search", post(handlers::search_nodes))
        .route("/api/nodes/aggregate", post(handlers::aggregate_nodes))
        .route(
            "/api/nodes/update-properties",
            put(handlers::update_node_properties),
        )
        .route(
            "/api/nodes/update-multiple-properties",
            put(handlers::update_multiple_nodes_properties),
        )
        .route(
            "/api/nodes/remove-properties",
            put(handlers::remove_node_properties),
        )
        .route(
            "/api/nodes/remove-multiple-properties",
            put(handlers::remove_multiple_nodes_properties),
        )
        .route("/api/nodes/delete-single", delete(handlers::delete_single_node))
        .route(
            "/api/nodes/delete-multiple",
            delete(handlers::delete_multiple_nodes),
        )
        .route(
            "/api/nodes/delete-by-label",
            delete(handlers::delete_nodes_by_label),
        )
        .route(
            "/api/relationships/create",
            post(handlers::create_relationship),
        )
        .route(
            "/api/relationships/update-single",
            put(handlers::update_single_relationship),
        )
        .route(
            "/api/relationships/update-by-type",
            put(handlers::update_relationships_by_type),
        )
        .route(
            "/api/relationships/update-bulk",
            put(handlers::update_relationships_bulk),
        )
        .route(
            "/api/relationships/remove-single",
            put(handlers::remove_single_relationship_properties),
        )
        .route(
            "/api/relationships/remove-by-type",
            put(handlers::remove_relationships_by_type),
        )
        .route(
            "/api/relationships/remove-bulk",
            put(handlers::remove_relationships_bulk),
        )
        .route(
            "/api/relationships/delete-bulk",
            delete(handlers::delete_relationships_bulk),
        );

    if let Some(layer) = build_cors_layer(allow_origins) {
        router = router.layer(layer);
    }

    router
        .with_state(session)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let mut allowed = Vec::new();
    for origin in origins {
        let trimmed = origin.trim().trim_end_matches('/');
        match HeaderValue::from_str(trimmed) {
            Ok(value) if !trimmed.is_empty() => allowed.push(value),
            _ => tracing::warn!(%origin, "ignoring invalid CORS origin"),
        }
    }

    if allowed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([ACCEPT, CONTENT_TYPE]),
    )
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(err) => tracing::error!(?err, "failed to listen for shutdown signal"),
    }
}

fn install_tracing_subscriber() {
    static INSTALLED: OnceLock<()> = OnceLock::new();
    INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = fmt().with_env_filter(filter).try_init();
    });
}

/// Handler-level error wrapper mapping the crate taxonomy onto HTTP
/// statuses.
#[derive(Debug)]
pub struct AppError(RedifyError);

impl From<RedifyError> for AppError {
    fn from(err: RedifyError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RedifyError::Validation(_) | RedifyError::InvalidIdentifier { .. } => {
                StatusCode::BAD_REQUEST
            }
            RedifyError::NotFound(_) => StatusCode::NOT_FOUND,
            RedifyError::HasRelationships { .. } => StatusCode::CONFLICT,
            RedifyError::Engine(_) | RedifyError::Decode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = Json(ErrorPayload {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    error: String,
}
