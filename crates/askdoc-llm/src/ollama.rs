//! Native Ollama API client for tool-calling chat and model discovery.
//!
//! Uses Ollama's native /api/chat endpoint (not OpenAI-compatible) so the
//! context window can be set per request through `options.num_ctx`.

use std::time::{Duration, Instant};

use askdoc_config::ModelSettings;
use askdoc_core::{AgentError, Message, MessageRole, ToolCall, ToolSchema};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::response::{ChatResponse, LlmMetrics, LlmResponse};

/// Converts any error into an AgentError::LlmError.
fn llm_err(e: impl ToString) -> AgentError {
    AgentError::LlmError(e.to_string())
}

/// Strips trailing slashes and an OpenAI-style `/v1` suffix from a host URL.
fn normalize_base(api_base: &str) -> String {
    let base = api_base.trim_end_matches('/');
    base.strip_suffix("/v1").unwrap_or(base).to_string()
}

/// Response from Ollama's /api/tags endpoint.
#[derive(Debug, Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModelInfo>,
}

#[derive(Debug, Deserialize)]
struct OllamaModelInfo {
    name: String,
}

/// Lists the models pulled into an Ollama instance.
pub async fn discover_models(ollama_host: &str) -> Result<Vec<String>, AgentError> {
    let url = format!("{}/api/tags", normalize_base(ollama_host));

    let response = Client::new()
        .get(&url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .map_err(|e| AgentError::LlmError(format!("Ollama discovery failed: {}", e)))?;

    let tags: OllamaTagsResponse = response
        .json()
        .await
        .map_err(|e| AgentError::LlmError(format!("Failed to parse Ollama response: {}", e)))?;

    let models: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
    info!("Discovered {} Ollama models", models.len());
    Ok(models)
}

/// Returns true if `wanted` is among `available`, ignoring case and an implicit `:latest` tag.
pub fn model_available(available: &[String], wanted: &str) -> bool {
    let wanted = wanted.to_lowercase();
    let wanted_latest = format!("{wanted}:latest");
    available.iter().any(|name| {
        let name = name.to_lowercase();
        name == wanted || name == wanted_latest
    })
}

/// Performance metrics from Ollama's native API (durations in nanoseconds).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaMetrics {
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub load_duration: u64,
    #[serde(default)]
    pub prompt_eval_count: u32,
    #[serde(default)]
    pub prompt_eval_duration: u64,
    #[serde(default)]
    pub eval_count: u32,
    #[serde(default)]
    pub eval_duration: u64,
}

impl OllamaMetrics {
    /// Calculates tokens generated per second.
    pub fn tokens_per_sec(&self) -> f64 {
        if self.eval_duration == 0 {
            return 0.0;
        }
        (self.eval_count as f64) / (self.eval_duration as f64 / 1_000_000_000.0)
    }

    /// Total request duration in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.total_duration / 1_000_000
    }

    /// Model load time in milliseconds.
    pub fn load_duration_ms(&self) -> u64 {
        self.load_duration / 1_000_000
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<OllamaTool<'a>>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    num_ctx: u32,
}

#[derive(Debug, Serialize)]
struct OllamaTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: &'a ToolSchema,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: MessageRole,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OllamaToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

impl From<&Message> for OllamaMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: msg.role,
            content: msg.content.clone(),
            tool_calls: msg
                .tool_calls
                .iter()
                .map(|call| OllamaToolCall {
                    id: Some(call.id.clone()),
                    function: OllamaFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.clone(),
                    },
                })
                .collect(),
            tool_name: msg.tool_name.clone(),
        }
    }
}

impl OllamaToolCall {
    /// Converts to a core tool call, assigning a positional id when Ollama omits one.
    fn into_tool_call(self, index: usize) -> ToolCall {
        // Some models emit arguments as a JSON-encoded string.
        let arguments = match self.function.arguments {
            serde_json::Value::String(raw) => {
                serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
            }
            other => other,
        };

        ToolCall {
            id: self.id.unwrap_or_else(|| format!("call_{index}")),
            name: self.function.name,
            arguments,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
    #[serde(flatten)]
    metrics: OllamaMetrics,
}

/// Client for Ollama's native chat API.
///
/// Holds one pooled HTTP client with the request timeout applied, so a single
/// instance is meant to be shared for the life of the process.
pub struct OllamaClient {
    client: Client,
    api_base: String,
    model: String,
    context_window: u32,
}

impl OllamaClient {
    /// Creates a new client from the model settings.
    pub fn new(settings: &ModelSettings) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(llm_err)?;

        Ok(Self {
            client,
            api_base: normalize_base(&settings.api_base),
            model: settings.model.clone(),
            context_window: settings.context_window,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Builds the message list: system prompt first, then the transcript.
    fn build_messages(system_prompt: &str, messages: &[Message]) -> Vec<OllamaMessage> {
        let mut all = Vec::with_capacity(messages.len() + 1);
        if !system_prompt.is_empty() {
            all.push(OllamaMessage::from(&Message::system(system_prompt)));
        }
        all.extend(messages.iter().map(OllamaMessage::from));
        all
    }

    /// Sends a chat request with tools and returns content or tool calls.
    ///
    /// An empty `tools` slice makes this a plain chat call.
    pub async fn chat_with_tools(
        &self,
        system_prompt: &str,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<ChatResponse, AgentError> {
        let start = Instant::now();
        let url = format!("{}/api/chat", self.api_base);

        let request = OllamaChatRequest {
            model: &self.model,
            messages: Self::build_messages(system_prompt, messages),
            tools: tools.iter().map(|t| OllamaTool { kind: "function", function: t }).collect(),
            stream: false,
            options: OllamaOptions { num_ctx: self.context_window },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(llm_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::LlmError(format!("Ollama error: {} - {}", status, body)));
        }

        let resp: OllamaChatResponse = response.json().await.map_err(llm_err)?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            "Ollama: {}ms total, {}ms load, {:.1} tok/s, {} eval tokens",
            resp.metrics.total_duration_ms(),
            resp.metrics.load_duration_ms(),
            resp.metrics.tokens_per_sec(),
            resp.metrics.eval_count
        );

        let metrics = LlmMetrics {
            input_tokens: resp.metrics.prompt_eval_count,
            output_tokens: resp.metrics.eval_count,
            elapsed_ms,
        };

        let message = resp
            .message
            .ok_or_else(|| AgentError::LlmError("No response message".into()))?;

        if !message.tool_calls.is_empty() {
            let calls: Vec<ToolCall> = message
                .tool_calls
                .into_iter()
                .enumerate()
                .map(|(i, tc)| tc.into_tool_call(i))
                .collect();
            debug!("Tool calls requested: {:?}", calls);
            return Ok(ChatResponse::ToolCalls { calls, content: message.content, metrics });
        }

        Ok(ChatResponse::Content(LlmResponse { content: message.content, metrics }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn normalize_base_strips_openai_suffix() {
        assert_eq!(normalize_base("http://localhost:11434/v1/"), "http://localhost:11434");
        assert_eq!(normalize_base("http://localhost:11434"), "http://localhost:11434");
    }

    #[test]
    fn model_available_ignores_case_and_latest_tag() {
        let models = vec!["qwen3:8b".to_string(), "llama3:latest".to_string()];
        assert!(model_available(&models, "Qwen3:8b"));
        assert!(model_available(&models, "llama3"));
        assert!(!model_available(&models, "qwen3:14b"));
    }

    #[test]
    fn tool_call_without_id_gets_positional_id() {
        let raw: OllamaToolCall = serde_json::from_value(json!({
            "function": { "name": "search", "arguments": "{\"query\":\"apple revenue\"}" }
        }))
        .unwrap();

        let call = raw.into_tool_call(2);
        assert_eq!(call.id, "call_2");
        assert_eq!(call.arguments, json!({ "query": "apple revenue" }));
    }

    #[test]
    fn tokens_per_sec_handles_zero_duration() {
        assert_eq!(OllamaMetrics::default().tokens_per_sec(), 0.0);
        let metrics = OllamaMetrics { eval_count: 50, eval_duration: 2_000_000_000, ..Default::default() };
        assert_eq!(metrics.tokens_per_sec(), 25.0);
    }
}
