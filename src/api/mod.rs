//! HTTP API module for Keepsake
//!
//! Provides the REST endpoints for memory records behind JWT authentication.

pub mod auth;
pub mod routes;

use crate::config::Config;
use crate::db::Database;
use crate::error::{Result, ServiceError};

use axum::{
    middleware,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use auth::AuthKeys;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Database handle
    pub db: Arc<Database>,
    /// JWT verification material
    pub auth: AuthKeys,
}

/// Start the HTTP API server
pub async fn serve(addr: SocketAddr, db: Arc<Database>, config: &Config) -> Result<()> {
    let state = AppState {
        db,
        auth: AuthKeys::new(config.auth_secret()?),
    };

    let app = create_router(state);

    // Check if port is already in use (another keepsake instance running)
    if tokio::net::TcpStream::connect(addr).await.is_ok() {
        tracing::error!(
            "Port {} is already in use — another keepsake instance may be running. \
             Use `curl http://{}/health` to check.",
            addr.port(),
            addr
        );
        return Err(ServiceError::Api(format!(
            "Port {} already in use",
            addr.port()
        )));
    }

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::Api(e.to_string()))?;

    Ok(())
}

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - allow any frontend origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Memory routes, all gated by the authentication middleware
    let memory_routes = Router::new()
        .route(
            "/memories",
            get(routes::list_memories).post(routes::create_memory),
        )
        .route(
            "/memories/:id",
            get(routes::get_memory)
                .put(routes::update_memory)
                .delete(routes::delete_memory),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        // Health check (public, no auth required)
        .route("/health", get(routes::health))
        .merge(memory_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
