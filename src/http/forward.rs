//! Forwarding gateway.
//!
//! # Responsibilities
//! - Pull a peer from the registry for each inbound request
//! - Delegate to the peer's transport and return its response
//! - Absorb transport failures with a bounded retry/failover loop
//!
//! # Design Decisions
//! - The state machine is an explicit loop, never recursion: stack depth
//!   stays flat and cancellation is observed at every suspension point
//! - Retry and attempt counters are request-scoped values derived step by
//!   step, not shared state
//! - A retry re-enters selection, so it may land on a different backend;
//!   only the backend that exhausted its retries is marked dead
//! - The request body is buffered once so every attempt replays identical
//!   bytes

use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::request::Parts;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::time::sleep;

use crate::http::error::ApiError;
use crate::http::request::X_REQUEST_ID;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Distinct backend failovers allowed per request.
pub const MAX_ATTEMPTS: u32 = 3;
/// Immediate resends allowed per failover cycle.
pub const MAX_RETRIES: u32 = 3;
/// Fixed pause before each immediate resend.
pub const RETRY_DELAY: Duration = Duration::from_millis(10);

/// Upper bound on the buffered request body.
const MAX_BUFFERED_BODY: usize = 1024 * 1024;

/// Request-scoped retry/failover counters.
#[derive(Debug, Clone, Copy, Default)]
struct AttemptContext {
    attempts: u32,
    retries: u32,
}

impl AttemptContext {
    fn retry(self) -> Self {
        Self {
            retries: self.retries + 1,
            ..self
        }
    }

    fn failover(self) -> Self {
        Self {
            attempts: self.attempts + 1,
            retries: 0,
        }
    }
}

/// Axum entry point for every non-admin route.
pub async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    forward(&state, request).await
}

pub(crate) async fn forward(state: &AppState, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (parts, body) = request.into_parts();
    let method = parts.method.to_string();

    let body_bytes = match axum::body::to_bytes(body, MAX_BUFFERED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to buffer request body");
            return ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "request body too large")
                .into_response();
        }
    };

    let mut ctx = AttemptContext::default();
    loop {
        if ctx.attempts >= MAX_ATTEMPTS {
            tracing::warn!(
                request_id = %request_id,
                attempts = ctx.attempts,
                "Max attempts reached, terminating"
            );
            metrics::record_request(&method, 503, "none", start);
            return ApiError::service_unavailable().into_response();
        }

        let Some(peer) = state.registry.select_peer() else {
            tracing::warn!(request_id = %request_id, "No backends available in the server pool");
            metrics::record_request(&method, 503, "none", start);
            return ApiError::service_unavailable().into_response();
        };
        let backend_url = peer.url().clone();

        let outbound = match rebuild_request(&parts, &body_bytes, &request_id) {
            Ok(req) => req,
            Err(response) => return response,
        };

        match peer.transport().serve(outbound).await {
            Ok(response) => {
                tracing::debug!(
                    request_id = %request_id,
                    backend = %backend_url,
                    status = %response.status(),
                    "Request forwarded"
                );
                metrics::record_request(
                    &method,
                    response.status().as_u16(),
                    backend_url.as_str(),
                    start,
                );
                return response;
            }
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    backend = %backend_url,
                    error = %e,
                    "Upstream transport error"
                );

                if ctx.retries < MAX_RETRIES {
                    metrics::record_retry(backend_url.as_str());
                    sleep(RETRY_DELAY).await;
                    ctx = ctx.retry();
                } else {
                    state.registry.mark_backend_status(&backend_url, false);
                    tracing::warn!(
                        request_id = %request_id,
                        backend = %backend_url,
                        "Retries exhausted, backend marked dead, failing over"
                    );
                    ctx = ctx.failover();
                }
            }
        }
    }
}

/// Rebuild the buffered request for one forwarding attempt. The peer's
/// transport supplies scheme and authority; everything else is replayed
/// verbatim, with the request ID re-asserted.
fn rebuild_request(
    parts: &Parts,
    body: &Bytes,
    request_id: &str,
) -> Result<Request<Body>, Response> {
    let mut builder = Request::builder()
        .method(parts.method.clone())
        .uri(parts.uri.clone())
        .version(parts.version);

    if let Some(headers) = builder.headers_mut() {
        for (name, value) in parts.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }
        if let Ok(value) = HeaderValue::from_str(request_id) {
            headers.insert(X_REQUEST_ID, value);
        }
    }

    builder.body(Body::from(body.clone())).map_err(|e| {
        tracing::error!(error = %e, "Failed to rebuild outbound request");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::{Algorithm, BackendRegistry};
    use crate::upstream::testing::{FailingTransport, FlakyTransport, MockTransport};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use url::Url;

    fn state_with(
        build: impl FnOnce(&BackendRegistry) -> Vec<Arc<AtomicU32>>,
    ) -> (AppState, Vec<Arc<AtomicU32>>) {
        let registry = Arc::new(BackendRegistry::new(Algorithm::RoundRobin));
        let counters = build(&registry);
        (AppState::new(registry), counters)
    }

    fn url(port: u16) -> Url {
        Url::parse(&format!("http://127.0.0.1:{port}")).unwrap()
    }

    fn request() -> Request<Body> {
        Request::builder()
            .uri("/hello")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn empty_pool_is_service_unavailable() {
        let (state, _) = state_with(|_| Vec::new());
        let response = forward(&state, request()).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn healthy_backend_serves_without_retries() {
        let (state, counters) = state_with(|registry| {
            let transport = MockTransport::ok();
            let counter = transport.call_counter();
            registry
                .add_backend(url(8081), Box::new(transport))
                .unwrap();
            vec![counter]
        });

        let response = forward(&state, request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(counters[0].load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_in_place() {
        let (state, counters) = state_with(|registry| {
            let transport = FlakyTransport::failing_first(2);
            let counter = transport.call_counter();
            registry
                .add_backend(url(8081), Box::new(transport))
                .unwrap();
            vec![counter]
        });

        let response = forward(&state, request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(counters[0].load(Ordering::SeqCst), 3);
        assert!(state.registry.backends()[0].is_alive());
    }

    #[tokio::test]
    async fn retries_exhausted_marks_backend_dead() {
        let (state, counters) = state_with(|registry| {
            let transport = FailingTransport::new();
            let counter = transport.call_counter();
            registry
                .add_backend(url(8081), Box::new(transport))
                .unwrap();
            vec![counter]
        });

        let response = forward(&state, request()).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        // One initial send plus MAX_RETRIES resends, then the backend is
        // dead and the next selection finds nobody.
        assert_eq!(counters[0].load(Ordering::SeqCst), MAX_RETRIES + 1);
        assert!(!state.registry.backends()[0].is_alive());
    }

    #[tokio::test]
    async fn attempt_bound_caps_total_transport_invocations() {
        let (state, counters) = state_with(|registry| {
            (0..3)
                .map(|i| {
                    let transport = FailingTransport::new();
                    let counter = transport.call_counter();
                    registry
                        .add_backend(url(8081 + i), Box::new(transport))
                        .unwrap();
                    counter
                })
                .collect()
        });

        let response = forward(&state, request()).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let total: u32 = counters.iter().map(|c| c.load(Ordering::SeqCst)).sum();
        assert_eq!(total, MAX_ATTEMPTS * (MAX_RETRIES + 1));
        for backend in state.registry.backends() {
            assert!(!backend.is_alive());
        }
    }

    #[tokio::test]
    async fn connections_are_released_after_completion() {
        let (state, _) = state_with(|registry| {
            registry
                .add_backend(url(8081), Box::new(MockTransport::ok()))
                .unwrap();
            Vec::new()
        });

        let response = forward(&state, request()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.registry.backends()[0].connection_count(), 0);
    }
}
