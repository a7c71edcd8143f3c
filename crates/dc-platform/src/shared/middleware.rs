//! API Middleware
//!
//! Caller identity extraction for Axum. Authentication happens upstream of
//! the platform (gateway or portal backend), which forwards the resolved
//! caller in the `X-Actor-Id` and `X-Actor-Role` headers.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use dc_common::{Actor, Role};
use std::sync::Arc;

use crate::platform::ClinicPlatform;
use crate::shared::error::ErrorResponse;
use crate::usecase::ExecutionContext;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub platform: Arc<ClinicPlatform>,
}

impl AppState {
    pub fn new(platform: Arc<ClinicPlatform>) -> Self {
        Self { platform }
    }
}

/// Authenticated caller extractor
/// Builds the execution context for one request from the forwarded headers
pub struct Authenticated(pub ExecutionContext);

impl std::ops::Deref for Authenticated {
    type Target = ExecutionContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Error response for authentication failures
pub struct AuthError {
    pub status: StatusCode,
    pub message: String,
}

impl AuthError {
    fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: "UNAUTHORIZED".to_string(),
            message: self.message,
            reason: None,
        };
        (self.status, Json(body)).into_response()
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Resolve the caller from forwarded identity headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AuthError> {
    let id = header(headers, ACTOR_ID_HEADER)
        .ok_or_else(|| AuthError::unauthorized("Missing X-Actor-Id header"))?;
    let role: Role = header(headers, ACTOR_ROLE_HEADER)
        .ok_or_else(|| AuthError::unauthorized("Missing X-Actor-Role header"))?
        .parse()
        .map_err(|e: dc_common::UnknownRole| AuthError::unauthorized(e.to_string()))?;

    Ok(Actor::new(id, role))
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = actor_from_headers(&parts.headers)?;

        let ctx = match header(&parts.headers, CORRELATION_ID_HEADER) {
            Some(correlation_id) => ExecutionContext::with_correlation(actor, correlation_id),
            None => ExecutionContext::create(actor),
        };

        tracing::debug!(
            actor = %ctx.actor,
            correlation_id = %ctx.correlation_id,
            "Request authenticated"
        );
        Ok(Authenticated(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_actor_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_ID_HEADER, HeaderValue::from_static("prof-1"));
        headers.insert(ACTOR_ROLE_HEADER, HeaderValue::from_static("Professor"));

        let actor = actor_from_headers(&headers).map_err(|e| e.message).unwrap();
        assert_eq!(actor, Actor::professor("prof-1"));
    }

    #[test]
    fn test_missing_or_unknown_role_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_ID_HEADER, HeaderValue::from_static("x"));
        assert!(actor_from_headers(&headers).is_err());

        headers.insert(ACTOR_ROLE_HEADER, HeaderValue::from_static("janitor"));
        let err = actor_from_headers(&headers).err().unwrap();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
