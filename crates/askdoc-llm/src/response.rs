use askdoc_core::ToolCall;

/// Token usage and timing metrics from an LLM call.
#[derive(Debug, Clone, Default)]
pub struct LlmMetrics {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub elapsed_ms: u64,
}

/// Complete response from an LLM call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub metrics: LlmMetrics,
}

/// Response from an LLM that may include tool calls.
#[derive(Debug, Clone)]
pub enum ChatResponse {
    Content(LlmResponse),
    /// `content` carries any text the model emitted alongside its calls.
    ToolCalls { calls: Vec<ToolCall>, content: String, metrics: LlmMetrics },
}
