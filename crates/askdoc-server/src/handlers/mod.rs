//! HTTP route handlers for the askdoc server.

pub mod ask;

use axum::{http::StatusCode, Json};

use crate::dto::ErrorResponse;

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// Fallback for unknown routes.
pub async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
}
