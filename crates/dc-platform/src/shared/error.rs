//! Platform Error Types

use thiserror::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};
use utoipa::ToSchema;

use crate::shared::authorization_service::DenyReason;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid transition for {entity_type}: {from} -> {to}")]
    InvalidTransition { entity_type: String, from: String, to: String },

    #[error("Forbidden ({reason}): {message}")]
    Forbidden { reason: DenyReason, message: String },

    #[error("Schedule {schedule_id} is full ({capacity} seats)")]
    CapacityExceeded { schedule_id: String, capacity: u32 },

    #[error("Slot conflict for practitioner {practitioner_id}: overlaps appointment {conflicting_id}")]
    SlotConflict { practitioner_id: String, conflicting_id: String },

    #[error("Missing required field: {field}")]
    MissingRequiredField { field: String },

    #[error("Validation error: {message}")]
    Validation { code: String, message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn invalid_transition(
        entity_type: impl Into<String>,
        from: impl ToString,
        to: impl ToString,
    ) -> Self {
        Self::InvalidTransition {
            entity_type: entity_type.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn forbidden(reason: DenyReason, message: impl Into<String>) -> Self {
        Self::Forbidden {
            reason,
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingRequiredField { field: field.into() }
    }

    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Stable machine-readable code for callers.
    pub fn code(&self) -> &str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            Self::SlotConflict { .. } => "SLOT_CONFLICT",
            Self::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            Self::Validation { code, .. } => code,
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::InvalidTransition { .. }
            | Self::CapacityExceeded { .. }
            | Self::SlotConflict { .. } => StatusCode::CONFLICT,
            Self::MissingRequiredField { .. } | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::Forbidden { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Error response body
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.to_string(),
            reason: self.deny_reason().map(|r| r.as_str().to_string()),
        };

        (self.status_code(), Json(body)).into_response()
    }
}
