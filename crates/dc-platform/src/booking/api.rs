//! Booking Flow API
//!
//! Guided four-step booking: specialty, practitioner, slot, confirmation.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::appointment::api::AppointmentResponse;
use crate::booking::{BookingFlow, BookingStep};
use crate::directory::Practitioner;
use crate::scheduling::TimeSlot;
use crate::shared::api_common::SuccessResponse;
use crate::shared::error::{ErrorResponse, PlatformError};
use crate::shared::middleware::{AppState, Authenticated};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectSpecialtyRequest {
    pub specialty: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectPractitionerRequest {
    pub practitioner_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectSlotRequest {
    pub slot: TimeSlot,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackToRequest {
    pub step: BookingStep,
}

/// Result of a confirmed booking
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedBookingResponse {
    pub flow: BookingFlow,
    pub appointment: AppointmentResponse,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlotsQuery {
    /// Date (YYYY-MM-DD)
    #[param(value_type = String)]
    pub date: NaiveDate,
}

/// Start a booking flow
#[utoipa::path(
    post,
    path = "",
    tag = "bookings",
    responses(
        (status = 201, description = "Flow started", body = BookingFlow),
        (status = 403, description = "Only patients book", body = ErrorResponse)
    )
)]
pub async fn start_booking(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<(StatusCode, Json<BookingFlow>), PlatformError> {
    let flow = state.platform.start_booking(&auth)?;
    Ok((StatusCode::CREATED, Json(flow)))
}

/// Get a booking flow
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking flow ID")),
    responses(
        (status = 200, description = "Booking flow", body = BookingFlow),
        (status = 404, description = "Unknown flow", body = ErrorResponse)
    )
)]
pub async fn get_booking(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<BookingFlow>, PlatformError> {
    Ok(Json(state.platform.booking(&auth, &id)?))
}

/// Step 1: choose a specialty
#[utoipa::path(
    put,
    path = "/{id}/specialty",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking flow ID")),
    request_body = SelectSpecialtyRequest,
    responses(
        (status = 200, description = "Specialty selected", body = BookingFlow),
        (status = 400, description = "Specialty not offered", body = ErrorResponse),
        (status = 409, description = "Wrong step", body = ErrorResponse)
    )
)]
pub async fn select_specialty(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<SelectSpecialtyRequest>,
) -> Result<Json<BookingFlow>, PlatformError> {
    Ok(Json(state.platform.select_specialty(&auth, &id, &req.specialty)?))
}

/// Practitioners serving the selected specialty
#[utoipa::path(
    get,
    path = "/{id}/practitioners",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking flow ID")),
    responses(
        (status = 200, description = "Practitioners", body = Vec<Practitioner>)
    )
)]
pub async fn booking_practitioners(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Vec<Practitioner>>, PlatformError> {
    Ok(Json(state.platform.booking_practitioners(&auth, &id)?))
}

/// Step 2: choose a practitioner
#[utoipa::path(
    put,
    path = "/{id}/practitioner",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking flow ID")),
    request_body = SelectPractitionerRequest,
    responses(
        (status = 200, description = "Practitioner selected", body = BookingFlow),
        (status = 409, description = "Wrong step", body = ErrorResponse)
    )
)]
pub async fn select_practitioner(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<SelectPractitionerRequest>,
) -> Result<Json<BookingFlow>, PlatformError> {
    Ok(Json(state.platform.select_practitioner(&auth, &id, &req.practitioner_id)?))
}

/// Open slots of the selected practitioner
#[utoipa::path(
    get,
    path = "/{id}/slots",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking flow ID"), SlotsQuery),
    responses(
        (status = 200, description = "Open slots", body = Vec<TimeSlot>)
    )
)]
pub async fn booking_slots(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Vec<TimeSlot>>, PlatformError> {
    Ok(Json(state.platform.booking_slots(&auth, &id, query.date)?))
}

/// Step 3: choose a slot
#[utoipa::path(
    put,
    path = "/{id}/slot",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking flow ID")),
    request_body = SelectSlotRequest,
    responses(
        (status = 200, description = "Slot selected", body = BookingFlow),
        (status = 409, description = "Wrong step", body = ErrorResponse)
    )
)]
pub async fn select_slot(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<SelectSlotRequest>,
) -> Result<Json<BookingFlow>, PlatformError> {
    Ok(Json(state.platform.select_slot(&auth, &id, req.slot, req.notes)?))
}

/// Move forward one step, keeping the current selection
#[utoipa::path(
    post,
    path = "/{id}/advance",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking flow ID")),
    responses(
        (status = 200, description = "Advanced", body = BookingFlow),
        (status = 409, description = "Nothing selected for this step", body = ErrorResponse)
    )
)]
pub async fn advance(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<BookingFlow>, PlatformError> {
    Ok(Json(state.platform.booking_advance(&auth, &id)?))
}

/// Go back to an earlier step
#[utoipa::path(
    post,
    path = "/{id}/back",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking flow ID")),
    request_body = BackToRequest,
    responses(
        (status = 200, description = "Moved back", body = BookingFlow),
        (status = 409, description = "Step is not earlier", body = ErrorResponse)
    )
)]
pub async fn back_to(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<BackToRequest>,
) -> Result<Json<BookingFlow>, PlatformError> {
    Ok(Json(state.platform.booking_back_to(&auth, &id, req.step)?))
}

/// Step 4: confirm and book the appointment
#[utoipa::path(
    post,
    path = "/{id}/confirm",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking flow ID")),
    responses(
        (status = 201, description = "Appointment booked", body = ConfirmedBookingResponse),
        (status = 409, description = "Slot taken or wrong step", body = ErrorResponse)
    )
)]
pub async fn confirm(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ConfirmedBookingResponse>), PlatformError> {
    let (flow, appointment) = state.platform.confirm_booking(&auth, &id)?;
    Ok((
        StatusCode::CREATED,
        Json(ConfirmedBookingResponse {
            flow,
            appointment: appointment.into(),
        }),
    ))
}

/// Abandon a booking flow
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "bookings",
    params(("id" = String, Path, description = "Booking flow ID")),
    responses(
        (status = 200, description = "Flow abandoned", body = SuccessResponse),
        (status = 404, description = "Unknown flow", body = ErrorResponse)
    )
)]
pub async fn abandon(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    state.platform.abandon_booking(&auth, &id)?;
    Ok(Json(SuccessResponse::ok()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        start_booking,
        get_booking,
        select_specialty,
        booking_practitioners,
        select_practitioner,
        booking_slots,
        select_slot,
        advance,
        back_to,
        confirm,
        abandon,
    ),
    components(schemas(
        SelectSpecialtyRequest,
        SelectPractitionerRequest,
        SelectSlotRequest,
        BackToRequest,
        ConfirmedBookingResponse,
        BookingFlow,
        BookingStep,
    ))
)]
pub struct BookingsApi;

/// Create booking flow router
pub fn bookings_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(start_booking))
        .route("/{id}", get(get_booking).delete(abandon))
        .route("/{id}/specialty", put(select_specialty))
        .route("/{id}/practitioners", get(booking_practitioners))
        .route("/{id}/practitioner", put(select_practitioner))
        .route("/{id}/slots", get(booking_slots))
        .route("/{id}/slot", put(select_slot))
        .route("/{id}/advance", post(advance))
        .route("/{id}/back", post(back_to))
        .route("/{id}/confirm", post(confirm))
        .with_state(state)
}
