//! Schedules API
//!
//! REST endpoints for teaching sessions, enrollment and seat reservations.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::lifecycle::ScheduleStatus;
use crate::schedule::entity::{DayOfWeek, Schedule, ScheduleType};
use crate::schedule::operations::{CreateScheduleCommand, UpdateScheduleCommand};
use crate::scheduling::{Availability, ReservationToken};
use crate::shared::api_common::{PaginatedResponse, PaginationParams, SuccessResponse};
use crate::shared::error::{ErrorResponse, PlatformError};
use crate::shared::middleware::{AppState, Authenticated};

/// Create schedule request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub title: String,
    pub schedule_type: ScheduleType,
    pub instructor_id: String,
    pub room: String,
    pub day_of_week: DayOfWeek,
    #[schema(value_type = String, example = "09:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "11:00:00")]
    pub end_time: NaiveTime,
    /// Seat limit, at least 1
    pub capacity: u32,
    pub specialty: Option<String>,
    pub semester: Option<String>,
}

/// Update schedule request (only the fields present change)
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    pub title: Option<String>,
    pub instructor_id: Option<String>,
    pub room: Option<String>,
    pub day_of_week: Option<DayOfWeek>,
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    pub capacity: Option<u32>,
    pub specialty: Option<String>,
    pub semester: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetScheduleStatusRequest {
    pub status: ScheduleStatus,
}

/// Enroll request; `studentId` is honoured for admins only
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub student_id: Option<String>,
}

/// Schedule response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub id: String,
    pub title: String,
    pub schedule_type: ScheduleType,
    pub instructor_id: String,
    pub room: String,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub specialty: String,
    pub semester: String,
    pub capacity: u32,
    pub enrolled: u32,
    pub status: ScheduleStatus,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Schedule> for ScheduleResponse {
    fn from(s: Schedule) -> Self {
        Self {
            id: s.id,
            title: s.title,
            schedule_type: s.schedule_type,
            instructor_id: s.instructor_id,
            room: s.room,
            day_of_week: s.day_of_week,
            start_time: s.start_time.format("%H:%M").to_string(),
            end_time: s.end_time.format("%H:%M").to_string(),
            specialty: s.specialty,
            semester: s.semester,
            capacity: s.capacity,
            enrolled: s.enrolled,
            status: s.status,
            created_by: s.created_by,
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

/// Seat reservation response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub token_id: String,
    pub schedule_id: String,
    pub holder_id: String,
    pub issued_at: String,
}

impl ReservationResponse {
    fn from_token(token: ReservationToken, schedule_id: &str) -> Self {
        Self {
            holder_id: token.holder_id().to_string(),
            token_id: token.id,
            schedule_id: schedule_id.to_string(),
            issued_at: token.issued_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the schedules list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SchedulesQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    /// Filter by status
    pub status: Option<String>,

    /// Filter by instructor
    pub instructor_id: Option<String>,

    /// Filter by specialty
    pub specialty: Option<String>,
}

/// Create a schedule (admin)
#[utoipa::path(
    post,
    path = "",
    tag = "schedules",
    request_body = CreateScheduleRequest,
    responses(
        (status = 201, description = "Schedule created", body = ScheduleResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Not an administrator", body = ErrorResponse)
    )
)]
pub async fn create_schedule(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<(StatusCode, Json<ScheduleResponse>), PlatformError> {
    let command = CreateScheduleCommand {
        title: req.title,
        schedule_type: req.schedule_type,
        instructor_id: req.instructor_id,
        room: req.room,
        day_of_week: req.day_of_week,
        start_time: req.start_time,
        end_time: req.end_time,
        capacity: req.capacity,
        specialty: req.specialty,
        semester: req.semester,
    };

    let schedule = state.platform.create_schedule(&auth, command)?;
    Ok((StatusCode::CREATED, Json(schedule.into())))
}

/// List schedules
#[utoipa::path(
    get,
    path = "",
    tag = "schedules",
    params(SchedulesQuery),
    responses(
        (status = 200, description = "Schedules", body = PaginatedResponse<ScheduleResponse>)
    )
)]
pub async fn list_schedules(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<SchedulesQuery>,
) -> Result<Json<PaginatedResponse<ScheduleResponse>>, PlatformError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ScheduleStatus>)
        .transpose()?;

    let mut schedules: Vec<Schedule> = state
        .platform
        .list_schedules(&auth)?
        .into_iter()
        .filter(|s| status.is_none_or(|st| s.status == st))
        .filter(|s| query.instructor_id.as_deref().is_none_or(|i| s.instructor_id == i))
        .filter(|s| {
            query
                .specialty
                .as_deref()
                .is_none_or(|sp| s.specialty.eq_ignore_ascii_case(sp))
        })
        .collect();
    schedules.sort_by(|a, b| (a.day_of_week, a.start_time).cmp(&(b.day_of_week, b.start_time)));

    Ok(Json(PaginatedResponse::paginate(
        schedules,
        &query.pagination,
        ScheduleResponse::from,
    )))
}

/// Get schedule by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "schedules",
    params(("id" = String, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule found", body = ScheduleResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse)
    )
)]
pub async fn get_schedule(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ScheduleResponse>, PlatformError> {
    Ok(Json(state.platform.get_schedule(&auth, &id)?.into()))
}

/// Update a schedule (admin)
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "schedules",
    params(("id" = String, Path, description = "Schedule ID")),
    request_body = UpdateScheduleRequest,
    responses(
        (status = 200, description = "Schedule updated", body = ScheduleResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse)
    )
)]
pub async fn update_schedule(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateScheduleRequest>,
) -> Result<Json<ScheduleResponse>, PlatformError> {
    let command = UpdateScheduleCommand {
        title: req.title,
        instructor_id: req.instructor_id,
        room: req.room,
        day_of_week: req.day_of_week,
        start_time: req.start_time,
        end_time: req.end_time,
        capacity: req.capacity,
        specialty: req.specialty,
        semester: req.semester,
    };

    Ok(Json(state.platform.update_schedule(&auth, &id, command)?.into()))
}

/// Delete a schedule (admin)
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "schedules",
    params(("id" = String, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Schedule deleted", body = SuccessResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse)
    )
)]
pub async fn delete_schedule(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    state.platform.delete_schedule(&auth, &id)?;
    Ok(Json(SuccessResponse::ok()))
}

/// Activate, deactivate or cancel a schedule (admin)
#[utoipa::path(
    post,
    path = "/{id}/status",
    tag = "schedules",
    params(("id" = String, Path, description = "Schedule ID")),
    request_body = SetScheduleStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ScheduleResponse),
        (status = 409, description = "Invalid transition", body = ErrorResponse)
    )
)]
pub async fn set_schedule_status(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<SetScheduleStatusRequest>,
) -> Result<Json<ScheduleResponse>, PlatformError> {
    Ok(Json(state.platform.set_schedule_status(&auth, &id, req.status)?.into()))
}

/// Seat availability
#[utoipa::path(
    get,
    path = "/{id}/availability",
    tag = "schedules",
    params(("id" = String, Path, description = "Schedule ID")),
    responses(
        (status = 200, description = "Availability", body = Availability),
        (status = 404, description = "Schedule not found", body = ErrorResponse)
    )
)]
pub async fn availability(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Availability>, PlatformError> {
    Ok(Json(state.platform.schedule_availability(&auth, &id)?))
}

/// Enroll in a schedule
#[utoipa::path(
    post,
    path = "/{id}/enrollments",
    tag = "schedules",
    params(("id" = String, Path, description = "Schedule ID")),
    request_body = EnrollRequest,
    responses(
        (status = 201, description = "Seat reserved", body = ReservationResponse),
        (status = 409, description = "Schedule full", body = ErrorResponse)
    )
)]
pub async fn enroll(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    body: Option<Json<EnrollRequest>>,
) -> Result<(StatusCode, Json<ReservationResponse>), PlatformError> {
    let student_id = body.and_then(|Json(req)| req.student_id);
    let token = state
        .platform
        .enroll_in_schedule(&auth, &id, student_id.as_deref())?;
    Ok((StatusCode::CREATED, Json(ReservationResponse::from_token(token, &id))))
}

/// Release a seat reservation
#[utoipa::path(
    delete,
    path = "/reservations/{token_id}",
    tag = "schedules",
    params(("token_id" = String, Path, description = "Reservation token ID")),
    responses(
        (status = 200, description = "Released (or already released)", body = SuccessResponse),
        (status = 403, description = "Not the holder", body = ErrorResponse)
    )
)]
pub async fn release_reservation(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(token_id): Path<String>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    let released = state.platform.release_reservation(&auth, &token_id)?;
    Ok(Json(if released {
        SuccessResponse::ok()
    } else {
        SuccessResponse::with_message("Reservation already released")
    }))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create_schedule,
        list_schedules,
        get_schedule,
        update_schedule,
        delete_schedule,
        set_schedule_status,
        availability,
        enroll,
        release_reservation,
    ),
    components(schemas(
        CreateScheduleRequest,
        UpdateScheduleRequest,
        SetScheduleStatusRequest,
        EnrollRequest,
        ScheduleResponse,
        ReservationResponse,
        Availability,
    ))
)]
pub struct SchedulesApi;

/// Create schedules router
pub fn schedules_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_schedule).get(list_schedules))
        .route("/reservations/{token_id}", delete(release_reservation))
        .route("/{id}", get(get_schedule).put(update_schedule).delete(delete_schedule))
        .route("/{id}/status", post(set_schedule_status))
        .route("/{id}/availability", get(availability))
        .route("/{id}/enrollments", post(enroll))
        .with_state(state)
}
