//! Health check handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Readiness check response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Overall readiness status
    pub ready: bool,

    /// Service name
    pub service: String,

    /// Store status
    pub store: DependencyStatus,
}

/// Individual dependency status
#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    /// Backend name (`mongodb` or `memory`)
    pub backend: String,

    /// Dependency is healthy
    pub healthy: bool,

    /// Optional message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Simple health check (liveness)
///
/// Always returns 200 OK if the service is running.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy".to_string(),
        service: state.config().service.name.clone(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    };

    (StatusCode::OK, Json(response))
}

/// Readiness check
///
/// Pings the store. Returns 200 OK when it answers, 503 otherwise.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store();

    let (status, dependency) = match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            DependencyStatus {
                backend: store.backend().to_string(),
                healthy: true,
                message: Some("Connected".to_string()),
            },
        ),
        Err(e) => {
            tracing::error!(
                retriable = e.is_retriable(),
                "Store health check failed: {}",
                e
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                DependencyStatus {
                    backend: store.backend().to_string(),
                    healthy: false,
                    message: Some(format!("Ping failed: {}", e.message)),
                },
            )
        }
    };

    let response = ReadinessResponse {
        ready: dependency.healthy,
        service: state.config().service.name.clone(),
        store: dependency,
    };

    (status, Json(response))
}
