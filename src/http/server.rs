//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router: admin surface plus forwarding fallback
//! - Wire up middleware (timeout, request ID, tracing)
//! - Serve until the shutdown signal arrives
//!
//! The forwarding transport client lives in [`AppState`] and is cloned
//! into each backend's transport as backends are registered; connection
//! pooling happens inside the shared client.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::routing::{get, post};
use axum::Router;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::balance::BackendRegistry;
use crate::config::BalancerConfig;
use crate::http::request::RequestIdLayer;
use crate::http::{admin, forward};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<BackendRegistry>,
    pub client: Client<HttpConnector, Body>,
}

impl AppState {
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { registry, client }
    }
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server over the given registry.
    pub fn new(config: &BalancerConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &BalancerConfig, state: AppState) -> Router {
        let admin_routes = Router::new()
            .route("/backend/add", post(admin::add_backend))
            .route("/backend/delete", post(admin::delete_backend))
            .route("/algorithm", post(admin::set_algorithm))
            .route("/backends", get(admin::list_backends));

        Router::new()
            .nest("/loadbalancer", admin_routes)
            .fallback(forward::forward_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.listener.request_timeout_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener, until
    /// the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
