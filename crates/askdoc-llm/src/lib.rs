//! LLM client for a local Ollama instance.
//!
//! - [`OllamaClient`] — Non-streaming `/api/chat` calls with tool schemas
//! - [`ChatResponse`] — Either final content or tool calls to execute
//! - [`discover_models`] — Lists models pulled into the Ollama instance
//!
//! # Tool Calling
//!
//! ```rust,ignore
//! use askdoc_config::ModelSettings;
//! use askdoc_llm::{ChatResponse, OllamaClient};
//!
//! let client = OllamaClient::new(&ModelSettings::new("http://localhost:11434"))?;
//! let messages = vec![Message::user("Who won the match yesterday?")];
//! match client.chat_with_tools("You are a helpful assistant.", &messages, &tools).await? {
//!     ChatResponse::Content(resp) => println!("{}", resp.content),
//!     ChatResponse::ToolCalls { calls, .. } => {
//!         for call in calls {
//!             println!("Call {}: {}({})", call.id, call.name, call.arguments);
//!         }
//!     }
//! }
//! ```

mod ollama;
mod response;

pub use askdoc_core::{ToolCall, ToolSchema};
pub use ollama::{discover_models, model_available, OllamaClient, OllamaMetrics};
pub use response::{ChatResponse, LlmMetrics, LlmResponse};
