//! Clinical Cases API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::clinical_case::entity::ClinicalCase;
use crate::clinical_case::operations::{
    OpenCaseCommand, RecordCaseProgressCommand, ReviewCaseCommand, TransitionCaseCommand,
};
use crate::lifecycle::{CaseApprovalStatus, CaseStatus};
use crate::shared::api_common::{PaginatedResponse, PaginationParams};
use crate::shared::error::{ErrorResponse, PlatformError};
use crate::shared::middleware::{AppState, Authenticated};

/// Open case request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenCaseRequest {
    pub patient_id: String,
    pub professor_id: String,
    pub treatment: String,
    pub specialty: String,
    pub total_sessions: u32,
    /// Admins only: open for this student
    pub student_id: Option<String>,
}

/// Progress update; progress is derived from sessions when omitted
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordProgressRequest {
    pub sessions_completed: Option<u32>,
    pub progress: Option<u8>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCaseRequest {
    /// `approved`, `rejected` or `revision-needed`
    pub outcome: CaseApprovalStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionCaseRequest {
    pub target: CaseStatus,
    /// Required when cancelling
    pub reason: Option<String>,
}

/// Clinical case response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalCaseResponse {
    pub id: String,
    pub patient_id: String,
    pub student_id: String,
    pub professor_id: String,
    pub treatment: String,
    pub specialty: String,
    pub progress: u8,
    pub sessions_completed: u32,
    pub total_sessions: u32,
    pub status: CaseStatus,
    pub approval_status: CaseApprovalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ClinicalCase> for ClinicalCaseResponse {
    fn from(c: ClinicalCase) -> Self {
        Self {
            id: c.id,
            patient_id: c.patient_id,
            student_id: c.student_id,
            professor_id: c.professor_id,
            treatment: c.treatment,
            specialty: c.specialty,
            progress: c.progress,
            sessions_completed: c.sessions_completed,
            total_sessions: c.total_sessions,
            status: c.status,
            approval_status: c.approval_status,
            review_notes: c.review_notes,
            cancellation_reason: c.cancellation_reason,
            created_at: c.created_at.to_rfc3339(),
            updated_at: c.updated_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the cases list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CasesQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    /// Filter by case status
    pub status: Option<String>,

    /// Filter by approval status
    pub approval_status: Option<String>,
}

/// Open a clinical case (student)
#[utoipa::path(
    post,
    path = "",
    tag = "cases",
    request_body = OpenCaseRequest,
    responses(
        (status = 201, description = "Case opened", body = ClinicalCaseResponse),
        (status = 400, description = "Validation error", body = ErrorResponse)
    )
)]
pub async fn open_case(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(req): Json<OpenCaseRequest>,
) -> Result<(StatusCode, Json<ClinicalCaseResponse>), PlatformError> {
    let command = OpenCaseCommand {
        patient_id: req.patient_id,
        professor_id: req.professor_id,
        treatment: req.treatment,
        specialty: req.specialty,
        total_sessions: req.total_sessions,
        student_id: req.student_id,
    };

    let case = state.platform.open_case(&auth, command)?;
    Ok((StatusCode::CREATED, Json(case.into())))
}

/// List clinical cases visible to the caller
#[utoipa::path(
    get,
    path = "",
    tag = "cases",
    params(CasesQuery),
    responses(
        (status = 200, description = "Clinical cases", body = PaginatedResponse<ClinicalCaseResponse>)
    )
)]
pub async fn list_cases(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<CasesQuery>,
) -> Result<Json<PaginatedResponse<ClinicalCaseResponse>>, PlatformError> {
    let status = query.status.as_deref().map(str::parse::<CaseStatus>).transpose()?;
    let approval_status = query
        .approval_status
        .as_deref()
        .map(str::parse::<CaseApprovalStatus>)
        .transpose()?;

    let mut cases: Vec<ClinicalCase> = state
        .platform
        .list_cases(&auth)?
        .into_iter()
        .filter(|c| status.is_none_or(|s| c.status == s))
        .filter(|c| approval_status.is_none_or(|s| c.approval_status == s))
        .collect();
    cases.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    Ok(Json(PaginatedResponse::paginate(
        cases,
        &query.pagination,
        ClinicalCaseResponse::from,
    )))
}

/// Get clinical case by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "cases",
    params(("id" = String, Path, description = "Clinical case ID")),
    responses(
        (status = 200, description = "Clinical case found", body = ClinicalCaseResponse),
        (status = 404, description = "Clinical case not found", body = ErrorResponse)
    )
)]
pub async fn get_case(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ClinicalCaseResponse>, PlatformError> {
    Ok(Json(state.platform.get_case(&auth, &id)?.into()))
}

/// Record session progress (owning student)
#[utoipa::path(
    post,
    path = "/{id}/progress",
    tag = "cases",
    params(("id" = String, Path, description = "Clinical case ID")),
    request_body = RecordProgressRequest,
    responses(
        (status = 200, description = "Progress recorded", body = ClinicalCaseResponse),
        (status = 400, description = "Invalid progress", body = ErrorResponse)
    )
)]
pub async fn record_progress(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<RecordProgressRequest>,
) -> Result<Json<ClinicalCaseResponse>, PlatformError> {
    let command = RecordCaseProgressCommand {
        case_id: id,
        sessions_completed: req.sessions_completed,
        progress: req.progress,
    };
    Ok(Json(state.platform.record_case_progress(&auth, command)?.into()))
}

/// Review a case (supervising professor)
#[utoipa::path(
    post,
    path = "/{id}/review",
    tag = "cases",
    params(("id" = String, Path, description = "Clinical case ID")),
    request_body = ReviewCaseRequest,
    responses(
        (status = 200, description = "Review recorded", body = ClinicalCaseResponse),
        (status = 409, description = "Case not awaiting review", body = ErrorResponse)
    )
)]
pub async fn review_case(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<ReviewCaseRequest>,
) -> Result<Json<ClinicalCaseResponse>, PlatformError> {
    let command = ReviewCaseCommand {
        case_id: id,
        outcome: req.outcome,
        notes: req.notes,
    };
    Ok(Json(state.platform.review_case(&auth, command)?.into()))
}

/// Resubmit a case after revision (owning student)
#[utoipa::path(
    post,
    path = "/{id}/resubmit",
    tag = "cases",
    params(("id" = String, Path, description = "Clinical case ID")),
    responses(
        (status = 200, description = "Case resubmitted", body = ClinicalCaseResponse),
        (status = 409, description = "No revision requested", body = ErrorResponse)
    )
)]
pub async fn resubmit_case(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ClinicalCaseResponse>, PlatformError> {
    Ok(Json(state.platform.resubmit_case(&auth, &id)?.into()))
}

/// Move a case through its lifecycle
#[utoipa::path(
    post,
    path = "/{id}/transition",
    tag = "cases",
    params(("id" = String, Path, description = "Clinical case ID")),
    request_body = TransitionCaseRequest,
    responses(
        (status = 200, description = "Case transitioned", body = ClinicalCaseResponse),
        (status = 409, description = "Invalid transition", body = ErrorResponse)
    )
)]
pub async fn transition_case(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<TransitionCaseRequest>,
) -> Result<Json<ClinicalCaseResponse>, PlatformError> {
    let command = TransitionCaseCommand {
        case_id: id,
        target: req.target,
        reason: req.reason,
    };
    Ok(Json(state.platform.transition_case(&auth, command)?.into()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        open_case,
        list_cases,
        get_case,
        record_progress,
        review_case,
        resubmit_case,
        transition_case,
    ),
    components(schemas(
        OpenCaseRequest,
        RecordProgressRequest,
        ReviewCaseRequest,
        TransitionCaseRequest,
        ClinicalCaseResponse,
    ))
)]
pub struct CasesApi;

/// Create clinical cases router
pub fn cases_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(open_case).get(list_cases))
        .route("/{id}", get(get_case))
        .route("/{id}/progress", post(record_progress))
        .route("/{id}/review", post(review_case))
        .route("/{id}/resubmit", post(resubmit_case))
        .route("/{id}/transition", post(transition_case))
        .with_state(state)
}
