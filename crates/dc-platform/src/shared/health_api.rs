//! Health Check Endpoints
//!
//! - /health - Combined health status
//! - /health/live - Liveness probe
//! - /health/ready - Readiness probe

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;

use crate::platform::ClinicPlatform;

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    /// Service is healthy
    Up,
    /// Service is unhealthy
    Down,
    /// Service is degraded but functional
    Degraded,
}

/// Individual health check result
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Full health response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<HealthCheck>,
}

/// Simple health status response
#[derive(Debug, Serialize, ToSchema)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

/// Health service state
#[derive(Clone)]
pub struct HealthState {
    pub platform: Arc<ClinicPlatform>,
    pub version: Option<String>,
    pub started_at: DateTime<Utc>,
    /// Set once seeding and router setup are done
    pub ready: Arc<AtomicBool>,
}

impl HealthState {
    pub fn new(platform: Arc<ClinicPlatform>, version: Option<String>) -> Self {
        Self {
            platform,
            version,
            started_at: Utc::now(),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

fn store_check(platform: &ClinicPlatform) -> HealthCheck {
    let start = Instant::now();
    let (status, message) = match platform.store().appointments.count() {
        Ok(_) => (HealthStatus::Up, None),
        Err(e) => (HealthStatus::Down, Some(e.to_string())),
    };
    HealthCheck {
        name: "entity-store".to_string(),
        status,
        message,
        duration_ms: Some(start.elapsed().as_millis() as u64),
    }
}

fn directory_check(platform: &ClinicPlatform) -> HealthCheck {
    let specialties = platform.specialties();
    let (status, message) = if specialties.is_empty() {
        (HealthStatus::Degraded, Some("No practitioners registered".to_string()))
    } else {
        (HealthStatus::Up, None)
    };
    HealthCheck {
        name: "practitioner-directory".to_string(),
        status,
        message,
        duration_ms: None,
    }
}

/// Combined health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    )
)]
pub async fn get_health(State(state): State<HealthState>) -> Response {
    let checks = vec![store_check(&state.platform), directory_check(&state.platform)];

    let mut overall_status = HealthStatus::Up;
    for check in &checks {
        match check.status {
            HealthStatus::Down => overall_status = HealthStatus::Down,
            HealthStatus::Degraded if overall_status == HealthStatus::Up => overall_status = HealthStatus::Degraded,
            _ => {}
        }
    }
    if !state.is_ready() && overall_status == HealthStatus::Up {
        overall_status = HealthStatus::Degraded;
    }

    let response = HealthResponse {
        status: overall_status,
        timestamp: Utc::now(),
        version: state.version.clone(),
        checks,
    };

    let status_code = if overall_status == HealthStatus::Down {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response)).into_response()
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses((status = 200, description = "Service is alive", body = SimpleHealthResponse))
)]
pub async fn get_liveness() -> Json<SimpleHealthResponse> {
    Json(SimpleHealthResponse {
        status: HealthStatus::Up,
    })
}

/// Readiness probe
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = SimpleHealthResponse),
        (status = 503, description = "Service is not ready", body = SimpleHealthResponse)
    )
)]
pub async fn get_readiness(State(state): State<HealthState>) -> Response {
    if !state.is_ready() || store_check(&state.platform).status == HealthStatus::Down {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SimpleHealthResponse {
                status: HealthStatus::Down,
            }),
        )
            .into_response();
    }

    Json(SimpleHealthResponse {
        status: HealthStatus::Up,
    })
    .into_response()
}

/// Create the health router
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/health/live", get(get_liveness))
        .route("/health/ready", get(get_readiness))
        .with_state(state)
}
