//! Administrative surface: runtime mutation of the backend pool.
//!
//! # Responsibilities
//! - Add/remove backends while traffic is flowing
//! - Swap the balancing algorithm
//! - Report pool membership and per-backend state
//!
//! Addresses arrive as JSON `server_url` fields and are parsed here, at
//! the boundary; the registry only ever sees normalized URLs.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::balance::registry::parse_backend_url;
use crate::balance::Algorithm;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::upstream::HttpTransport;

#[derive(Debug, Deserialize)]
pub struct AddBackendRequest {
    pub server_url: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteBackendRequest {
    pub server_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SetAlgorithmRequest {
    pub algorithm: String,
}

/// One row of the backend listing.
#[derive(Debug, Serialize)]
pub struct BackendStatus {
    pub url: String,
    pub alive: bool,
    pub active_connections: u64,
}

/// `POST /loadbalancer/backend/add`
pub async fn add_backend(
    State(state): State<AppState>,
    Json(req): Json<AddBackendRequest>,
) -> Result<StatusCode, ApiError> {
    let url = parse_backend_url(&req.server_url)?;
    let transport = HttpTransport::new(state.client.clone(), &url)?;
    state.registry.add_backend(url.clone(), Box::new(transport))?;

    tracing::info!(backend = %url, "Backend added");
    Ok(StatusCode::CREATED)
}

/// `POST /loadbalancer/backend/delete`
pub async fn delete_backend(
    State(state): State<AppState>,
    Json(req): Json<DeleteBackendRequest>,
) -> Result<StatusCode, ApiError> {
    state.registry.delete_backend(&req.server_url)?;

    tracing::info!(backend = %req.server_url, "Backend removed");
    Ok(StatusCode::OK)
}

/// `POST /loadbalancer/algorithm`
pub async fn set_algorithm(
    State(state): State<AppState>,
    Json(req): Json<SetAlgorithmRequest>,
) -> Result<StatusCode, ApiError> {
    let algorithm: Algorithm = req.algorithm.parse()?;
    state.registry.set_algorithm(algorithm);

    tracing::info!(algorithm = algorithm.name(), "Balancing algorithm changed");
    Ok(StatusCode::OK)
}

/// `GET /loadbalancer/backends`
pub async fn list_backends(State(state): State<AppState>) -> Json<Vec<BackendStatus>> {
    let rows = state
        .registry
        .backends()
        .iter()
        .map(|b| BackendStatus {
            url: b.url().to_string(),
            alive: b.is_alive(),
            active_connections: b.connection_count(),
        })
        .collect();
    Json(rows)
}
