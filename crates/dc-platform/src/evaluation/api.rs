//! Evaluations API

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::evaluation::entity::{Criterion, Evaluation};
use crate::evaluation::operations::{CreateEvaluationCommand, CriterionInput, CriterionScore, SubmitScoresCommand};
use crate::lifecycle::EvaluationStatus;
use crate::shared::api_common::{PaginatedResponse, PaginationParams};
use crate::shared::error::{ErrorResponse, PlatformError};
use crate::shared::middleware::{AppState, Authenticated};

/// Create evaluation request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvaluationRequest {
    pub student_id: String,
    pub title: String,
    pub criteria: Vec<CriterionInput>,
    pub comments: Option<String>,
    /// Admins only: evaluate as this professor
    pub professor_id: Option<String>,
}

/// Scores for some or all criteria
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoresRequest {
    pub scores: Vec<CriterionScore>,
    pub comments: Option<String>,
}

/// Evaluation response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResponse {
    pub id: String,
    pub student_id: String,
    pub professor_id: String,
    pub title: String,
    pub criteria: Vec<Criterion>,
    /// Weighted grade out of 100, once every criterion is scored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub status: EvaluationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Evaluation> for EvaluationResponse {
    fn from(e: Evaluation) -> Self {
        let overall_grade = e.overall_grade();
        Self {
            id: e.id,
            student_id: e.student_id,
            professor_id: e.professor_id,
            title: e.title,
            criteria: e.criteria,
            overall_grade,
            comments: e.comments,
            status: e.status,
            completed_at: e.completed_at.map(|d| d.to_rfc3339()),
            created_at: e.created_at.to_rfc3339(),
            updated_at: e.updated_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the evaluations list
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct EvaluationsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    /// Filter by status
    pub status: Option<String>,

    /// Filter by student
    pub student_id: Option<String>,
}

/// Create an evaluation (professor)
#[utoipa::path(
    post,
    path = "",
    tag = "evaluations",
    request_body = CreateEvaluationRequest,
    responses(
        (status = 201, description = "Evaluation created", body = EvaluationResponse),
        (status = 400, description = "Invalid criteria", body = ErrorResponse)
    )
)]
pub async fn create_evaluation(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(req): Json<CreateEvaluationRequest>,
) -> Result<(StatusCode, Json<EvaluationResponse>), PlatformError> {
    let command = CreateEvaluationCommand {
        student_id: req.student_id,
        title: req.title,
        criteria: req.criteria,
        comments: req.comments,
        professor_id: req.professor_id,
    };

    let evaluation = state.platform.create_evaluation(&auth, command)?;
    Ok((StatusCode::CREATED, Json(evaluation.into())))
}

/// List evaluations visible to the caller
#[utoipa::path(
    get,
    path = "",
    tag = "evaluations",
    params(EvaluationsQuery),
    responses(
        (status = 200, description = "Evaluations", body = PaginatedResponse<EvaluationResponse>)
    )
)]
pub async fn list_evaluations(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<EvaluationsQuery>,
) -> Result<Json<PaginatedResponse<EvaluationResponse>>, PlatformError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<EvaluationStatus>)
        .transpose()?;

    let mut evaluations: Vec<Evaluation> = state
        .platform
        .list_evaluations(&auth)?
        .into_iter()
        .filter(|e| status.is_none_or(|s| e.status == s))
        .filter(|e| query.student_id.as_deref().is_none_or(|s| e.student_id == s))
        .collect();
    evaluations.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(PaginatedResponse::paginate(
        evaluations,
        &query.pagination,
        EvaluationResponse::from,
    )))
}

/// Get evaluation by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "evaluations",
    params(("id" = String, Path, description = "Evaluation ID")),
    responses(
        (status = 200, description = "Evaluation found", body = EvaluationResponse),
        (status = 404, description = "Evaluation not found", body = ErrorResponse)
    )
)]
pub async fn get_evaluation(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<EvaluationResponse>, PlatformError> {
    Ok(Json(state.platform.get_evaluation(&auth, &id)?.into()))
}

/// Submit criterion scores (evaluating professor)
#[utoipa::path(
    post,
    path = "/{id}/scores",
    tag = "evaluations",
    params(("id" = String, Path, description = "Evaluation ID")),
    request_body = SubmitScoresRequest,
    responses(
        (status = 200, description = "Scores recorded", body = EvaluationResponse),
        (status = 400, description = "Unknown criterion or score out of range", body = ErrorResponse),
        (status = 409, description = "Evaluation already completed", body = ErrorResponse)
    )
)]
pub async fn submit_scores(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
    Json(req): Json<SubmitScoresRequest>,
) -> Result<Json<EvaluationResponse>, PlatformError> {
    let command = SubmitScoresCommand {
        evaluation_id: id,
        scores: req.scores,
        comments: req.comments,
    };
    Ok(Json(state.platform.submit_evaluation_scores(&auth, command)?.into()))
}

#[derive(OpenApi)]
#[openapi(
    paths(create_evaluation, list_evaluations, get_evaluation, submit_scores),
    components(schemas(
        CreateEvaluationRequest,
        SubmitScoresRequest,
        EvaluationResponse,
        CriterionInput,
        CriterionScore,
        Criterion,
    ))
)]
pub struct EvaluationsApi;

/// Create evaluations router
pub fn evaluations_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_evaluation).get(list_evaluations))
        .route("/{id}", get(get_evaluation))
        .route("/{id}/scores", post(submit_scores))
        .with_state(state)
}
