//! Notifications API
//!
//! The caller's own inbox. Notifications are created by the workflow engine;
//! this surface only reads, toggles and deletes them.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use dc_common::Role;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::notification::entity::{Notification, NotificationType, Priority};
use crate::notification::operations::NotificationFilter;
use crate::shared::api_common::{flag, CountResponse, PaginatedResponse, PaginationParams, SuccessResponse};
use crate::shared::error::{ErrorResponse, PlatformError};
use crate::shared::middleware::{AppState, Authenticated};
use crate::store::EntityKind;

/// Notification response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub recipient_id: String,
    pub recipient_role: Role,
    pub source_kind: EntityKind,
    pub source_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
    pub created_at: String,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            recipient_id: n.recipient_id,
            recipient_role: n.recipient_role,
            source_kind: n.source_kind,
            source_id: n.source_id,
            notification_type: n.notification_type,
            priority: n.priority,
            title: n.title,
            message: n.message,
            is_read: n.is_read,
            read_at: n.read_at.map(|d| d.to_rfc3339()),
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the inbox
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NotificationsQuery {
    #[serde(flatten)]
    pub pagination: PaginationParams,

    /// Only unread notifications
    #[serde(default, deserialize_with = "flag::deserialize")]
    pub unread_only: bool,

    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,

    pub priority: Option<Priority>,
}

impl NotificationsQuery {
    fn filter(&self) -> NotificationFilter {
        NotificationFilter {
            unread_only: self.unread_only,
            notification_type: self.notification_type,
            priority: self.priority,
        }
    }
}

/// The caller's notifications, newest first
#[utoipa::path(
    get,
    path = "",
    tag = "notifications",
    params(NotificationsQuery),
    responses(
        (status = 200, description = "Notifications", body = PaginatedResponse<NotificationResponse>)
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<PaginatedResponse<NotificationResponse>>, PlatformError> {
    let notifications = state.platform.list_notifications(&auth, &query.filter())?;
    Ok(Json(PaginatedResponse::paginate(
        notifications,
        &query.pagination,
        NotificationResponse::from,
    )))
}

/// Number of unread notifications
#[utoipa::path(
    get,
    path = "/unread-count",
    tag = "notifications",
    responses(
        (status = 200, description = "Unread count", body = CountResponse)
    )
)]
pub async fn unread_count(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<CountResponse>, PlatformError> {
    Ok(Json(CountResponse {
        count: state.platform.unread_count(&auth)?,
    }))
}

/// Mark one notification read
#[utoipa::path(
    post,
    path = "/{id}/read",
    tag = "notifications",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked read", body = NotificationResponse),
        (status = 403, description = "Not the recipient", body = ErrorResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<NotificationResponse>, PlatformError> {
    Ok(Json(state.platform.mark_read(&auth, &id)?.into()))
}

/// Mark one notification unread
#[utoipa::path(
    post,
    path = "/{id}/unread",
    tag = "notifications",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Marked unread", body = NotificationResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    )
)]
pub async fn mark_unread(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<NotificationResponse>, PlatformError> {
    Ok(Json(state.platform.mark_unread(&auth, &id)?.into()))
}

/// Mark every notification of the caller read
#[utoipa::path(
    post,
    path = "/read-all",
    tag = "notifications",
    responses(
        (status = 200, description = "Number of notifications changed", body = CountResponse)
    )
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: Authenticated,
) -> Result<Json<CountResponse>, PlatformError> {
    Ok(Json(CountResponse {
        count: state.platform.mark_all_read(&auth)?,
    }))
}

/// Delete one notification
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "notifications",
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Deleted", body = SuccessResponse),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    )
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    state.platform.delete_notification(&auth, &id)?;
    Ok(Json(SuccessResponse::ok()))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_notifications,
        unread_count,
        mark_read,
        mark_unread,
        mark_all_read,
        delete_notification,
    ),
    components(schemas(NotificationResponse, CountResponse, NotificationType, Priority))
)]
pub struct NotificationsApi;

/// Create notifications router
pub fn notifications_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/{id}", delete(delete_notification))
        .route("/{id}/read", post(mark_read))
        .route("/{id}/unread", post(mark_unread))
        .with_state(state)
}
