//! Broker HTTP server
//!
//! Serves the OSB v2 routes behind basic auth and the API-version check, with
//! an unauthenticated `/health` alongside.

mod api_version;
mod error;
mod handlers;
mod logging_middleware;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use cfbroker_core::BrokerProxy;
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::{basic_auth_middleware, BrokerCredentials};
use crate::config::ServerConfig;

pub use api_version::{api_version_middleware, parse_major, API_VERSION_HEADER};
pub use error::{ApiError, ErrorBody};
pub use handlers::{AppState, AsyncQuery, CatalogResponse, HealthResponse, LastOperationQuery};
pub use logging_middleware::{
    format_body, format_osb_response, http_logging_middleware, MAX_REQUEST_BODY_SIZE,
};

/// Build the full router: `/health` plus the authenticated `/v2` routes
pub fn build_router(state: AppState, credentials: Arc<BrokerCredentials>) -> Router {
    let broker_routes = Router::new()
        .route("/v2/catalog", get(handlers::catalog))
        .route(
            "/v2/service_instances/{instance_id}",
            put(handlers::provision)
                .patch(handlers::update)
                .delete(handlers::deprovision),
        )
        .route(
            "/v2/service_instances/{instance_id}/last_operation",
            get(handlers::last_operation),
        )
        .route(
            "/v2/service_instances/{instance_id}/service_bindings/{binding_id}",
            put(handlers::bind).delete(handlers::unbind),
        )
        // Auth runs before the version check
        .route_layer(middleware::from_fn(api_version_middleware))
        .route_layer(middleware::from_fn_with_state(
            credentials,
            basic_auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(broker_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_logging_middleware))
}

/// Owns the listener configuration and the broker behind it
pub struct BrokerServer {
    config: ServerConfig,
    state: AppState,
    credentials: Arc<BrokerCredentials>,
}

impl BrokerServer {
    pub fn new(config: ServerConfig, proxy: Arc<BrokerProxy>, credentials: BrokerCredentials) -> Self {
        Self {
            config,
            state: AppState::new(proxy),
            credentials: Arc::new(credentials),
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.credentials.clone())
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn run<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.addr();
        let router = self.router();

        info!("[Gateway] Starting on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(
            "[Gateway] Ready to accept connections (user={})",
            self.credentials.username
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("[Gateway] Stopped");
        Ok(())
    }
}
