//! Assignments API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::academic_task::api::AcademicTaskResponse;
use crate::assignment::entity::Assignment;
use crate::assignment::operations::CreateAssignmentCommand;
use crate::lifecycle::AssignmentStatus;
use crate::shared::api_common::{PaginatedResponse, PaginationParams};
use crate::shared::error::{ErrorResponse, PlatformError};
use crate::shared::middleware::{AppState, Authenticated};

/// Create assignment request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentRequest {
    pub title: String,
    pub description: Option<String>,
    pub specialty: String,
    /// Student ids the assignment targets
    pub cohort: Vec<String>,
    #[schema(value_type = String, format = Date)]
    pub due_date: NaiveDate,
    /// Admins only: create for this professor
    pub professor_id: Option<String>,
}

/// Assignment response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub id: String,
    pub professor_id: String,
    pub title: String,
    pub description: String,
    pub specialty: String,
    pub cohort: Vec<String>,
    pub due_date: String,
    pub status: AssignmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Assignment> for AssignmentResponse {
    fn from(a: Assignment) -> Self {
        Self {
            id: a.id,
            professor_id: a.professor_id,
            title: a.title,
            description: a.description,
            specialty: a.specialty,
            cohort: a.cohort,
            due_date: a.due_date.to_string(),
            status: a.status,
            published_at: a.published_at.map(|d| d.to_rfc3339()),
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the assignments list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AssignmentsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    /// Filter by status
    pub status: Option<String>,
}

/// Create a draft assignment (professor)
#[utoipa::path(
    post,
    path = "",
    tag = "assignments",
    request_body = CreateAssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = AssignmentResponse),
        (status = 400, description = "Validation error", body = ErrorResponse)
    )
)]
pub async fn create_assignment(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(req): Json<CreateAssignmentRequest>,
) -> Result<(StatusCode, Json<AssignmentResponse>), PlatformError> {
    let command = CreateAssignmentCommand {
        title: req.title,
        description: req.description,
        specialty: req.specialty,
        cohort: req.cohort,
        due_date: req.due_date,
        professor_id: req.professor_id,
    };

    let assignment = state.platform.create_assignment(&auth, command)?;
    Ok((StatusCode::CREATED, Json(assignment.into())))
}

/// List assignments visible to the caller
#[utoipa::path(
    get,
    path = "",
    tag = "assignments",
    params(AssignmentsQuery),
    responses(
        (status = 200, description = "Assignments", body = PaginatedResponse<AssignmentResponse>)
    )
)]
pub async fn list_assignments(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<AssignmentsQuery>,
) -> Result<Json<PaginatedResponse<AssignmentResponse>>, PlatformError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<AssignmentStatus>)
        .transpose()?;

    let mut assignments: Vec<Assignment> = state
        .platform
        .list_assignments(&auth)?
        .into_iter()
        .filter(|a| status.is_none_or(|s| a.status == s))
        .collect();
    assignments.sort_by(|a, b| a.due_date.cmp(&b.due_date));

    Ok(Json(PaginatedResponse::paginate(
        assignments,
        &query.pagination,
        AssignmentResponse::from,
    )))
}

/// Get assignment by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "assignments",
    params(("id" = String, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment found", body = AssignmentResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse)
    )
)]
pub async fn get_assignment(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<AssignmentResponse>, PlatformError> {
    Ok(Json(state.platform.get_assignment(&auth, &id)?.into()))
}

/// Tasks created from an assignment
#[utoipa::path(
    get,
    path = "/{id}/tasks",
    tag = "assignments",
    params(("id" = String, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Tasks visible to the caller", body = Vec<AcademicTaskResponse>)
    )
)]
pub async fn assignment_tasks(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Vec<AcademicTaskResponse>>, PlatformError> {
    let tasks = state.platform.assignment_tasks(&auth, &id)?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

/// Publish an assignment and create one task per cohort member
#[utoipa::path(
    post,
    path = "/{id}/publish",
    tag = "assignments",
    params(("id" = String, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment published", body = AssignmentResponse),
        (status = 409, description = "Not a draft", body = ErrorResponse)
    )
)]
pub async fn publish_assignment(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<AssignmentResponse>, PlatformError> {
    Ok(Json(state.platform.publish_assignment(&auth, &id)?.into()))
}

/// Close a published assignment
#[utoipa::path(
    post,
    path = "/{id}/close",
    tag = "assignments",
    params(("id" = String, Path, description = "Assignment ID")),
    responses(
        (status = 200, description = "Assignment closed", body = AssignmentResponse),
        (status = 409, description = "Not published", body = ErrorResponse)
    )
)]
pub async fn close_assignment(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<AssignmentResponse>, PlatformError> {
    Ok(Json(state.platform.close_assignment(&auth, &id)?.into()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create_assignment,
        list_assignments,
        get_assignment,
        assignment_tasks,
        publish_assignment,
        close_assignment,
    ),
    components(schemas(CreateAssignmentRequest, AssignmentResponse))
)]
pub struct AssignmentsApi;

/// Create assignments router
pub fn assignments_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_assignment).get(list_assignments))
        .route("/{id}", get(get_assignment))
        .route("/{id}/tasks", get(assignment_tasks))
        .route("/{id}/publish", post(publish_assignment))
        .route("/{id}/close", post(close_assignment))
        .with_state(state)
}
