//! Core domain types and error definitions for askdoc.
//!
//! This crate provides the types shared across the workspace:
//!
//! - [`AgentError`] — Error type for agent runs and LLM calls
//! - [`Message`] and [`MessageRole`] — Transcript entries exchanged with the model
//! - [`ToolCall`], [`ToolSchema`] — Tool interaction types
//!
//! # Example
//!
//! ```rust
//! use askdoc_core::{Message, MessageRole};
//!
//! let msg = Message::user("营收增长了多少?");
//! assert_eq!(msg.role, MessageRole::User);
//! assert!(msg.tool_calls.is_empty());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while running the agent or calling the model.
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM API request failed.
    #[error("LLM request failed: {0}")]
    LlmError(String),

    /// Failed to parse a model or tool payload.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The tool loop did not converge on an answer.
    #[error("Max iterations of {0} reached!")]
    MaxIterations(usize),
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::ParseError(err.to_string())
    }
}

/// Role of a message in an agent transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    /// Output of a tool call, fed back to the model.
    Tool,
}

/// A single transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    /// Calls requested by the model on an assistant turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Name of the tool that produced a tool turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), tool_calls: Vec::new(), tool_name: None }
    }

    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Creates an assistant message carrying the tool calls it requested.
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self { tool_calls, ..Self::new(MessageRole::Assistant, content) }
    }

    /// Creates a tool result message.
    pub fn tool(tool_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self { tool_name: Some(tool_name.into()), ..Self::new(MessageRole::Tool, content) }
    }
}

// ============================================================================
// Tool Types
// ============================================================================

/// A tool call requested by the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier for this call, used to match results in logs.
    pub id: String,
    /// Name of the tool to execute.
    pub name: String,
    /// Arguments to pass to the tool (JSON object).
    pub arguments: serde_json::Value,
}

/// JSON schema describing a tool for LLM function calling.
///
/// Follows the function-calling format accepted by Ollama's `/api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique name of the tool (e.g., "search").
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema object describing the tool's parameters.
    pub parameters: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_iterations_message_names_the_limit() {
        assert_eq!(AgentError::MaxIterations(20).to_string(), "Max iterations of 20 reached!");
    }

    #[test]
    fn serde_errors_become_parse_errors() {
        let err: AgentError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, AgentError::ParseError(_)));
    }

    #[test]
    fn tool_message_serializes_without_empty_calls() {
        let json = serde_json::to_value(Message::tool("search", "result")).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_name"], "search");
        assert!(json.get("tool_calls").is_none());
    }
}
