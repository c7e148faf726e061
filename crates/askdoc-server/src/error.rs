//! Ask endpoint errors and their response conversion.
//!
//! Every failure is reported as `{"error": ...}` with status 200, which is
//! what the reader frontend checks for.

use askdoc_core::AgentError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::dto::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum AskError {
    #[error("No context provided")]
    MissingContext,

    #[error("{0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("{0}")]
    Agent(#[from] AgentError),
}

impl IntoResponse for AskError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        error!("Ask failed: {}", message);
        (StatusCode::OK, Json(ErrorResponse { error: message })).into_response()
    }
}
