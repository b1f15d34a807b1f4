//! Access-Denial Responders (AC-3, SI-11)
//!
//! Two stateless responders invoked when (a) an unauthenticated request
//! hits a protected route, and (b) an authenticated request lacks a
//! required authority. Each produces the service's fixed structured error
//! body and the matching HTTP status.
//!
//! One consistent mapping is used: 401 for missing authentication, 403
//! for insufficient authority. Purely a response-formatting concern: no
//! retries, no state.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::observability::SecurityEvent;
use crate::security_event;

/// Message for unauthenticated requests to protected routes
pub const AUTHENTICATION_REQUIRED_MESSAGE: &str = "You need to log in to access this page";

/// Message for authenticated requests lacking a required authority
pub const ACCESS_DENIED_MESSAGE: &str = "You do not have permission to access this page";

/// Fixed structured error body.
///
/// ```json
/// {
///   "statusCode": 401,
///   "statusText": "UNAUTHORIZED",
///   "reasonPhrase": "Unauthorized",
///   "message": "You need to log in to access this page"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    /// Numeric HTTP status
    pub status_code: u16,
    /// Upper-case status name, e.g. "UNAUTHORIZED"
    pub status_text: String,
    /// Canonical reason phrase, e.g. "Unauthorized"
    pub reason_phrase: String,
    /// Human-readable message
    pub message: String,
}

impl ResponseBody {
    /// Build a body for a status and message.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let reason = status.canonical_reason().unwrap_or("Unknown");
        Self {
            status_code: status.as_u16(),
            status_text: reason.to_uppercase().replace(' ', "_"),
            reason_phrase: reason.to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for ResponseBody {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Respond to an unauthenticated request on a protected route (401).
///
/// The authentication entry point: invoked when no verified principal is
/// bound to the request.
pub fn authentication_required(path: &str) -> Response {
    security_event!(
        SecurityEvent::AccessDenied,
        path = %path,
        reason = "unauthenticated",
        "Rejected unauthenticated request"
    );

    ResponseBody::new(StatusCode::UNAUTHORIZED, AUTHENTICATION_REQUIRED_MESSAGE).into_response()
}

/// Respond to an authenticated request lacking a required authority (403).
pub fn access_denied(subject: &str, path: &str) -> Response {
    security_event!(
        SecurityEvent::AccessDenied,
        subject = %subject,
        path = %path,
        reason = "insufficient_authority",
        "Rejected request lacking authority"
    );

    ResponseBody::new(StatusCode::FORBIDDEN, ACCESS_DENIED_MESSAGE).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_shape() {
        let body = ResponseBody::new(StatusCode::UNAUTHORIZED, AUTHENTICATION_REQUIRED_MESSAGE);
        assert_eq!(body.status_code, 401);
        assert_eq!(body.status_text, "UNAUTHORIZED");
        assert_eq!(body.reason_phrase, "Unauthorized");
        assert_eq!(body.message, AUTHENTICATION_REQUIRED_MESSAGE);
    }

    #[test]
    fn test_body_serializes_camel_case() {
        let body = ResponseBody::new(StatusCode::FORBIDDEN, ACCESS_DENIED_MESSAGE);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["statusCode"], 403);
        assert_eq!(json["statusText"], "FORBIDDEN");
        assert_eq!(json["reasonPhrase"], "Forbidden");
        assert_eq!(json["message"], ACCESS_DENIED_MESSAGE);
    }

    #[test]
    fn test_denial_statuses_are_distinct() {
        // Missing authentication is 401; missing authority is 403.
        let unauthenticated = authentication_required("/user/list");
        assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

        let denied = access_denied("alice", "/user/delete/bob");
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    }
}
