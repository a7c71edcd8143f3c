//! Platform Configuration API
//!
//! Booking policy, notification switch and the offered specialties.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::directory::Practitioner;
use crate::scheduling::BookingPolicy;
use crate::shared::error::{ErrorResponse, PlatformError};
use crate::shared::middleware::{AppState, Authenticated};

/// Platform feature flags
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformFeatures {
    pub notifications_enabled: bool,
}

/// Platform configuration response
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfigResponse {
    pub features: PlatformFeatures,
    pub booking_policy: BookingPolicy,
    pub specialties: Vec<String>,
}

/// Get platform configuration
#[utoipa::path(
    get,
    path = "",
    tag = "config",
    responses(
        (status = 200, description = "Platform configuration", body = PlatformConfigResponse)
    )
)]
pub async fn get_platform_config(State(state): State<AppState>) -> Json<PlatformConfigResponse> {
    let platform = &state.platform;
    Json(PlatformConfigResponse {
        features: PlatformFeatures {
            notifications_enabled: platform.notifications_enabled(),
        },
        booking_policy: platform.booking_policy(),
        specialties: platform.specialties(),
    })
}

/// Replace the booking policy (admin only)
#[utoipa::path(
    put,
    path = "/booking-policy",
    tag = "config",
    request_body = BookingPolicy,
    responses(
        (status = 200, description = "Policy updated", body = BookingPolicy),
        (status = 400, description = "Invalid policy", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse)
    )
)]
pub async fn update_booking_policy(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(policy): Json<BookingPolicy>,
) -> Result<Json<BookingPolicy>, PlatformError> {
    let policy = state.platform.update_booking_policy(&auth, policy)?;
    Ok(Json(policy))
}

/// Practitioners serving a specialty
#[utoipa::path(
    get,
    path = "/specialties/{specialty}/practitioners",
    tag = "config",
    params(("specialty" = String, Path, description = "Specialty name")),
    responses(
        (status = 200, description = "Practitioners", body = Vec<Practitioner>)
    )
)]
pub async fn list_practitioners(
    State(state): State<AppState>,
    Path(specialty): Path<String>,
) -> Json<Vec<Practitioner>> {
    Json(state.platform.practitioners_for(&specialty))
}

#[derive(OpenApi)]
#[openapi(
    paths(get_platform_config, update_booking_policy, list_practitioners),
    components(schemas(PlatformFeatures, PlatformConfigResponse, BookingPolicy, Practitioner))
)]
pub struct PlatformConfigApi;

/// Create the platform config router
pub fn platform_config_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_platform_config))
        .route("/booking-policy", put(update_booking_policy))
        .route("/specialties/{specialty}/practitioners", get(list_practitioners))
        .with_state(state)
}
