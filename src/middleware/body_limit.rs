//! Oversized-payload rejection.
//!
//! Declared content lengths above the maximum are rejected before the body
//! is read, with the API's own error shape. `DefaultBodyLimit` remains
//! layered underneath as the backstop for chunked bodies with no declared
//! length.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::error::ApiError;

pub async fn enforce_body_limit(
    State(max_bytes): State<usize>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Some(len) = declared {
        if len > max_bytes {
            warn!(declared = len, max = max_bytes, "rejecting oversized body");
            return ApiError::PayloadTooLarge.into_response();
        }
    }

    next.run(request).await
}
