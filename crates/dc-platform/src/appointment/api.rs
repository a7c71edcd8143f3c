//! Appointments API
//!
//! REST endpoints for direct booking and the appointment lifecycle.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use dc_common::Role;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::appointment::entity::Appointment;
use crate::appointment::operations::BookAppointmentCommand;
use crate::lifecycle::AppointmentStatus;
use crate::scheduling::TimeSlot;
use crate::shared::api_common::{PaginatedResponse, PaginationParams};
use crate::shared::error::{ErrorResponse, PlatformError};
use crate::shared::middleware::{AppState, Authenticated};

/// Book appointment request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub specialty: String,
    pub practitioner_id: String,
    pub slot: TimeSlot,
    pub notes: Option<String>,
    /// Admins only: book on behalf of this patient
    pub patient_id: Option<String>,
}

/// Cancel appointment request
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

/// Appointment response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: String,
    pub patient_id: String,
    pub practitioner_id: String,
    pub practitioner_role: Role,
    pub specialty: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: u32,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Appointment> for AppointmentResponse {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            patient_id: a.patient_id,
            practitioner_id: a.practitioner_id,
            practitioner_role: a.practitioner_role,
            specialty: a.specialty,
            date: a.date.to_string(),
            start_time: a.start_time.format("%H:%M").to_string(),
            end_time: a.end_time.format("%H:%M").to_string(),
            duration_minutes: a.duration_minutes,
            status: a.status,
            notes: a.notes,
            cancellation_reason: a.cancellation_reason,
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the appointments list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AppointmentsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    /// Filter by status
    pub status: Option<String>,

    /// Filter by date (YYYY-MM-DD)
    pub date: Option<NaiveDate>,
}

/// Query parameters for open slots
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OpenSlotsQuery {
    pub practitioner_id: String,
    /// Date (YYYY-MM-DD)
    #[param(value_type = String)]
    pub date: NaiveDate,
}

/// Book an appointment
#[utoipa::path(
    post,
    path = "",
    tag = "appointments",
    request_body = BookAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = AppointmentResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 409, description = "Slot already taken", body = ErrorResponse)
    )
)]
pub async fn book_appointment(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(req): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), PlatformError> {
    let command = BookAppointmentCommand {
        specialty: req.specialty,
        practitioner_id: req.practitioner_id,
        slot: req.slot,
        notes: req.notes,
        patient_id: req.patient_id,
    };

    let appointment = state.platform.book_appointment(&auth, command)?;
    Ok((StatusCode::CREATED, Json(appointment.into())))
}

/// List appointments visible to the caller
#[utoipa::path(
    get,
    path = "",
    tag = "appointments",
    params(AppointmentsQuery),
    responses(
        (status = 200, description = "Appointments", body = PaginatedResponse<AppointmentResponse>),
        (status = 403, description = "Not permitted", body = ErrorResponse)
    )
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<PaginatedResponse<AppointmentResponse>>, PlatformError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<AppointmentStatus>)
        .transpose()?;

    let mut appointments: Vec<Appointment> = state
        .platform
        .list_appointments(&auth)?
        .into_iter()
        .filter(|a| status.is_none_or(|s| a.status == s))
        .filter(|a| query.date.is_none_or(|d| a.date == d))
        .collect();
    appointments.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));

    Ok(Json(PaginatedResponse::paginate(
        appointments,
        &query.pagination,
        AppointmentResponse::from,
    )))
}

/// Get appointment by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment found", body = AppointmentResponse),
        (status = 403, description = "Not a participant", body = ErrorResponse),
        (status = 404, description = "Appointment not found", body = ErrorResponse)
    )
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, PlatformError> {
    let appointment = state.platform.get_appointment(&auth, &id)?;
    Ok(Json(appointment.into()))
}

/// Confirm a pending appointment (assigned practitioner)
#[utoipa::path(
    post,
    path = "/{id}/confirm",
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment confirmed", body = AppointmentResponse),
        (status = 403, description = "Not the assigned practitioner", body = ErrorResponse),
        (status = 409, description = "Invalid transition", body = ErrorResponse)
    )
)]
pub async fn confirm_appointment(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, PlatformError> {
    let appointment = state.platform.confirm_appointment(&auth, &id)?;
    Ok(Json(appointment.into()))
}

/// Mark a confirmed appointment as completed (assigned practitioner)
#[utoipa::path(
    post,
    path = "/{id}/complete",
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment completed", body = AppointmentResponse),
        (status = 409, description = "Invalid transition", body = ErrorResponse)
    )
)]
pub async fn complete_appointment(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<AppointmentResponse>, PlatformError> {
    let appointment = state.platform.complete_appointment(&auth, &id)?;
    Ok(Json(appointment.into()))
}

/// Cancel an appointment and free its slot
#[utoipa::path(
    post,
    path = "/{id}/cancel",
    tag = "appointments",
    params(("id" = String, Path, description = "Appointment ID")),
    request_body = CancelAppointmentRequest,
    responses(
        (status = 200, description = "Appointment cancelled", body = AppointmentResponse),
        (status = 409, description = "Invalid transition", body = ErrorResponse)
    )
)]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Option<Json<CancelAppointmentRequest>>,
) -> Result<Json<AppointmentResponse>, PlatformError> {
    let reason = body.and_then(|Json(req)| req.reason);
    let appointment = state.platform.cancel_appointment(&auth, &id, reason)?;
    Ok(Json(appointment.into()))
}

/// Free slots of a practitioner on a date
#[utoipa::path(
    get,
    path = "/slots",
    tag = "appointments",
    params(OpenSlotsQuery),
    responses(
        (status = 200, description = "Open slots", body = Vec<TimeSlot>),
        (status = 404, description = "Unknown practitioner", body = ErrorResponse)
    )
)]
pub async fn open_slots(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<OpenSlotsQuery>,
) -> Result<Json<Vec<TimeSlot>>, PlatformError> {
    let slots = state
        .platform
        .open_slots(&auth, &query.practitioner_id, query.date)?;
    Ok(Json(slots))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        book_appointment,
        list_appointments,
        get_appointment,
        confirm_appointment,
        complete_appointment,
        cancel_appointment,
        open_slots,
    ),
    components(schemas(BookAppointmentRequest, CancelAppointmentRequest, AppointmentResponse, TimeSlot))
)]
pub struct AppointmentsApi;

/// Create appointments router
pub fn appointments_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(book_appointment).get(list_appointments))
        .route("/slots", get(open_slots))
        .route("/{id}", get(get_appointment))
        .route("/{id}/confirm", post(confirm_appointment))
        .route("/{id}/complete", post(complete_appointment))
        .route("/{id}/cancel", post(cancel_appointment))
        .with_state(state)
}
