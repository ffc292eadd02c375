//! API error taxonomy.
//!
//! Validation and authentication failures are handled entirely at the HTTP
//! boundary; only unexpected failures fall through to `Internal`, which logs
//! full context server-side and returns an opaque message plus a correlation
//! id to the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed field. The field name is safe to disclose.
    Validation { field: &'static str, message: String },
    /// Signup with an email that already has an account.
    DuplicateAccount,
    /// Bad credentials or invalid/expired token. Deliberately generic.
    Authentication,
    /// Authenticated endpoint called without a bearer token.
    MissingToken,
    /// Sliding-window limit exceeded for this client.
    RateLimited { window_secs: u64 },
    /// Request body above the configured maximum.
    PayloadTooLarge,
    /// No route matched.
    NotFound { method: String, path: String },
    /// Unexpected failure. Never exposes internal detail.
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "validation_error", "field": field, "message": message }),
            ),
            ApiError::DuplicateAccount => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "duplicate_account",
                    "message": "An account with this email already exists",
                }),
            ),
            ApiError::Authentication => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "authentication_failed", "message": "Invalid email or password" }),
            ),
            ApiError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "authentication_required", "message": "Authentication required" }),
            ),
            ApiError::RateLimited { window_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "error": "rate_limit_exceeded",
                    "message": "Too many requests. Please slow down.",
                    "retry_after_seconds": window_secs,
                }),
            ),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                json!({ "error": "payload_too_large", "message": "Request body too large" }),
            ),
            ApiError::NotFound { method, path } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("No route for {} {}", method, path),
                }),
            ),
            ApiError::Internal(err) => {
                let correlation_id = Uuid::new_v4();
                error!(%correlation_id, error = ?err, "unexpected internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "Internal server error",
                        "correlationId": correlation_id.to_string(),
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                ApiError::Validation {
                    field: "email",
                    message: "bad".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::DuplicateAccount, StatusCode::BAD_REQUEST),
            (ApiError::Authentication, StatusCode::UNAUTHORIZED),
            (ApiError::MissingToken, StatusCode::UNAUTHORIZED),
            (
                ApiError::RateLimited { window_secs: 60 },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (ApiError::PayloadTooLarge, StatusCode::PAYLOAD_TOO_LARGE),
            (
                ApiError::NotFound {
                    method: "GET".into(),
                    path: "/nope".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Internal(anyhow::anyhow!("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_credential_errors_share_a_generic_message() {
        // Unknown email and wrong password must be indistinguishable.
        let a = ApiError::Authentication.into_response();
        let b = ApiError::Authentication.into_response();
        assert_eq!(a.status(), b.status());
    }
}
