//! Question answering over user-supplied context.

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use tracing::info;

use crate::dto::{AskRequest, AskResponse};
use crate::error::AskError;
use crate::services::prompt::compose_message;
use crate::ServerState;

/// Answers `question` against `context`, or summarizes `context` when no question is given.
///
/// The body is parsed by hand so malformed JSON is reported in the usual
/// `{"error": ...}` shape rather than as an extractor rejection.
pub async fn ask(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<Json<AskResponse>, AskError> {
    info!("Ask request received ({} bytes)", body.len());

    let req: AskRequest = serde_json::from_slice(&body)?;
    info!("Context: {}...", req.context.chars().take(100).collect::<String>());
    info!("Question: {}", req.question);

    if req.context.is_empty() {
        return Err(AskError::MissingContext);
    }

    let message = compose_message(&req.context, &req.question);
    let answer = state.agent.run(&message).await?;

    info!("Answer: {} chars", answer.len());
    Ok(Json(AskResponse { answer }))
}
