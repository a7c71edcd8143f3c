//! Approval Requests API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::approval::entity::ApprovalRequest;
use crate::approval::operations::SubmitApprovalRequestCommand;
use crate::lifecycle::ApprovalStatus;
use crate::shared::api_common::{PaginatedResponse, PaginationParams};
use crate::shared::error::{ErrorResponse, PlatformError};
use crate::shared::middleware::{AppState, Authenticated};

/// Submit approval request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApprovalRequest {
    pub patient_id: String,
    pub professor_id: String,
    pub specialty: String,
    pub description: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Admins only: submit for this student
    pub student_id: Option<String>,
}

/// Professor decision
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    /// `approved` or `rejected`
    pub decision: ApprovalStatus,
    pub response: Option<String>,
}

/// Approval request response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequestResponse {
    pub id: String,
    pub student_id: String,
    pub patient_id: String,
    pub professor_id: String,
    pub specialty: String,
    pub description: String,
    pub attachments: Vec<String>,
    pub status: ApprovalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ApprovalRequest> for ApprovalRequestResponse {
    fn from(r: ApprovalRequest) -> Self {
        Self {
            id: r.id,
            student_id: r.student_id,
            patient_id: r.patient_id,
            professor_id: r.professor_id,
            specialty: r.specialty,
            description: r.description,
            attachments: r.attachments,
            status: r.status,
            response: r.response,
            response_date: r.response_date.map(|d| d.to_rfc3339()),
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the approval requests list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ApprovalRequestsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    /// Filter by status
    pub status: Option<String>,
}

/// Submit an approval request (student)
#[utoipa::path(
    post,
    path = "",
    tag = "approvals",
    request_body = SubmitApprovalRequest,
    responses(
        (status = 201, description = "Request submitted", body = ApprovalRequestResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 403, description = "Only students submit", body = ErrorResponse)
    )
)]
pub async fn submit_request(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(req): Json<SubmitApprovalRequest>,
) -> Result<(StatusCode, Json<ApprovalRequestResponse>), PlatformError> {
    let command = SubmitApprovalRequestCommand {
        patient_id: req.patient_id,
        professor_id: req.professor_id,
        specialty: req.specialty,
        description: req.description,
        attachments: req.attachments,
        student_id: req.student_id,
    };

    let request = state.platform.submit_approval_request(&auth, command)?;
    Ok((StatusCode::CREATED, Json(request.into())))
}

/// List approval requests visible to the caller
#[utoipa::path(
    get,
    path = "",
    tag = "approvals",
    params(ApprovalRequestsQuery),
    responses(
        (status = 200, description = "Approval requests", body = PaginatedResponse<ApprovalRequestResponse>)
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<ApprovalRequestsQuery>,
) -> Result<Json<PaginatedResponse<ApprovalRequestResponse>>, PlatformError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<ApprovalStatus>)
        .transpose()?;

    let mut requests: Vec<ApprovalRequest> = state
        .platform
        .list_approval_requests(&auth)?
        .into_iter()
        .filter(|r| status.is_none_or(|s| r.status == s))
        .collect();
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(PaginatedResponse::paginate(
        requests,
        &query.pagination,
        ApprovalRequestResponse::from,
    )))
}

/// Pending queue of the calling professor
#[utoipa::path(
    get,
    path = "/pending",
    tag = "approvals",
    responses(
        (status = 200, description = "Pending requests, oldest first", body = Vec<ApprovalRequestResponse>),
        (status = 403, description = "Not a professor", body = ErrorResponse)
    )
)]
pub async fn pending_queue(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<Vec<ApprovalRequestResponse>>, PlatformError> {
    let professor_id = auth.actor.id.clone();
    let queue = state.platform.pending_queue(&auth, &professor_id)?;
    Ok(Json(queue.into_iter().map(Into::into).collect()))
}

/// Get approval request by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "approvals",
    params(("id" = String, Path, description = "Approval request ID")),
    responses(
        (status = 200, description = "Approval request found", body = ApprovalRequestResponse),
        (status = 404, description = "Approval request not found", body = ErrorResponse)
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApprovalRequestResponse>, PlatformError> {
    Ok(Json(state.platform.get_approval_request(&auth, &id)?.into()))
}

/// Approve or reject (assigned professor)
#[utoipa::path(
    post,
    path = "/{id}/respond",
    tag = "approvals",
    params(("id" = String, Path, description = "Approval request ID")),
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Decision recorded", body = ApprovalRequestResponse),
        (status = 400, description = "Missing response", body = ErrorResponse),
        (status = 403, description = "Not the assigned professor", body = ErrorResponse),
        (status = 409, description = "Already decided", body = ErrorResponse)
    )
)]
pub async fn respond(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<ApprovalRequestResponse>, PlatformError> {
    let request = state
        .platform
        .respond_to_approval_request(&auth, &id, req.decision, req.response)?;
    Ok(Json(request.into()))
}

#[derive(OpenApi)]
#[openapi(
    paths(submit_request, list_requests, pending_queue, get_request, respond),
    components(schemas(SubmitApprovalRequest, RespondRequest, ApprovalRequestResponse))
)]
pub struct ApprovalsApi;

/// Create approval requests router
pub fn approvals_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(submit_request).get(list_requests))
        .route("/pending", get(pending_queue))
        .route("/{id}", get(get_request))
        .route("/{id}/respond", post(respond))
        .with_state(state)
}
