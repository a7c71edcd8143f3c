//! Academic Tasks API

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::academic_task::entity::AcademicTask;
use crate::lifecycle::TaskStatus;
use crate::shared::api_common::{PaginatedResponse, PaginationParams};
use crate::shared::error::{ErrorResponse, PlatformError};
use crate::shared::middleware::{AppState, Authenticated};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressRequest {
    /// Percent complete, 0-100
    pub progress: u8,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub feedback: String,
}

/// Academic task response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcademicTaskResponse {
    pub id: String,
    pub student_id: String,
    pub professor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<String>,
    pub title: String,
    pub description: String,
    pub specialty: String,
    pub due_date: String,
    pub status: TaskStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<AcademicTask> for AcademicTaskResponse {
    fn from(t: AcademicTask) -> Self {
        Self {
            id: t.id,
            student_id: t.student_id,
            professor_id: t.professor_id,
            assignment_id: t.assignment_id,
            title: t.title,
            description: t.description,
            specialty: t.specialty,
            due_date: t.due_date.to_string(),
            status: t.status,
            progress: t.progress,
            feedback: t.feedback,
            created_at: t.created_at.to_rfc3339(),
            updated_at: t.updated_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the tasks list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TasksQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    /// Filter by status
    pub status: Option<String>,

    /// Filter by originating assignment
    pub assignment_id: Option<String>,
}

/// List tasks visible to the caller
#[utoipa::path(
    get,
    path = "",
    tag = "tasks",
    params(TasksQuery),
    responses(
        (status = 200, description = "Academic tasks", body = PaginatedResponse<AcademicTaskResponse>)
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<TasksQuery>,
) -> Result<Json<PaginatedResponse<AcademicTaskResponse>>, PlatformError> {
    let status = query.status.as_deref().map(str::parse::<TaskStatus>).transpose()?;

    let mut tasks: Vec<AcademicTask> = state
        .platform
        .list_tasks(&auth)?
        .into_iter()
        .filter(|t| status.is_none_or(|s| t.status == s))
        .filter(|t| {
            query
                .assignment_id
                .as_deref()
                .is_none_or(|a| t.assignment_id.as_deref() == Some(a))
        })
        .collect();
    tasks.sort_by(|a, b| a.due_date.cmp(&b.due_date));

    Ok(Json(PaginatedResponse::paginate(
        tasks,
        &query.pagination,
        AcademicTaskResponse::from,
    )))
}

/// Get task by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "tasks",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = AcademicTaskResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<AcademicTaskResponse>, PlatformError> {
    Ok(Json(state.platform.get_task(&auth, &id)?.into()))
}

/// Report progress (owning student)
#[utoipa::path(
    post,
    path = "/{id}/progress",
    tag = "tasks",
    params(("id" = String, Path, description = "Task ID")),
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "Progress updated", body = AcademicTaskResponse),
        (status = 400, description = "Progress out of range", body = ErrorResponse)
    )
)]
pub async fn update_progress(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<UpdateProgressRequest>,
) -> Result<Json<AcademicTaskResponse>, PlatformError> {
    Ok(Json(state.platform.update_task_progress(&auth, &id, req.progress)?.into()))
}

/// Give feedback (reviewing professor)
#[utoipa::path(
    post,
    path = "/{id}/feedback",
    tag = "tasks",
    params(("id" = String, Path, description = "Task ID")),
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback recorded", body = AcademicTaskResponse),
        (status = 409, description = "Task not started", body = ErrorResponse)
    )
)]
pub async fn give_feedback(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<AcademicTaskResponse>, PlatformError> {
    Ok(Json(state.platform.give_task_feedback(&auth, &id, &req.feedback)?.into()))
}

/// Close a task (reviewing professor)
#[utoipa::path(
    post,
    path = "/{id}/close",
    tag = "tasks",
    params(("id" = String, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task closed", body = AcademicTaskResponse),
        (status = 409, description = "Invalid transition", body = ErrorResponse)
    )
)]
pub async fn close_task(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<AcademicTaskResponse>, PlatformError> {
    Ok(Json(state.platform.close_task(&auth, &id)?.into()))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_tasks, get_task, update_progress, give_feedback, close_task),
    components(schemas(UpdateProgressRequest, FeedbackRequest, AcademicTaskResponse))
)]
pub struct TasksApi;

/// Create academic tasks router
pub fn tasks_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_tasks))
        .route("/{id}", get(get_task))
        .route("/{id}/progress", post(update_progress))
        .route("/{id}/feedback", post(give_feedback))
        .route("/{id}/close", post(close_task))
        .with_state(state)
}
