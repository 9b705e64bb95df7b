//! Health check endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// `loaded` when endpoints came from the discovery document, else `fallback`.
    pub discovery: String,
    /// Logins awaiting their callback.
    pub pending: usize,
    /// Completed sessions held in memory.
    pub sessions: usize,
}

/// Liveness check with flow store counts.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.flow.store().stats().await;
    let discovery = if state.flow.endpoints().discovered {
        "loaded"
    } else {
        "fallback"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        discovery: discovery.to_string(),
        pending: stats.pending,
        sessions: stats.sessions,
    })
}

/// Create health check routes.
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
