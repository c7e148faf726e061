//! Agent runtime: a model plus tools, driven by a bounded tool-calling loop.
//!
//! [`Agent`] is the seam the HTTP layer depends on. [`FunctionAgent`] is the
//! production implementation backed by Ollama and the tool registry.

use std::time::Instant;

use askdoc_config::{AgentProfile, Settings};
use askdoc_core::{AgentError, Message, ToolCall};
use askdoc_llm::{ChatResponse, OllamaClient};
use askdoc_tools::{ToolRegistry, WebSearchTool};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Maximum number of model calls per run before giving up.
pub const MAX_ITERATIONS: usize = 20;

/// Something that turns an instruction into a final text answer.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(&self, message: &str) -> Result<String, AgentError>;
}

/// Agent that lets the model call registered tools until it produces text.
pub struct FunctionAgent {
    profile: AgentProfile,
    llm: OllamaClient,
    tools: ToolRegistry,
    max_iterations: usize,
}

impl FunctionAgent {
    pub fn new(profile: AgentProfile, llm: OllamaClient, tools: ToolRegistry) -> Self {
        Self { profile, llm, tools, max_iterations: MAX_ITERATIONS }
    }

    /// Builds the agent with the Ollama client and Tavily search from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, AgentError> {
        let llm = OllamaClient::new(&settings.model)?;

        let mut tools = ToolRegistry::new();
        tools.register(WebSearchTool::new(&settings.search));

        Ok(Self::new(settings.agent.clone(), llm, tools))
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn llm(&self) -> &OllamaClient {
        &self.llm
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.tool_names()
    }

    /// Executes every requested call in order and appends one tool turn per call.
    ///
    /// Failures are written into the tool turn instead of aborting the run.
    async fn run_tool_calls(&self, calls: &[ToolCall], transcript: &mut Vec<Message>) {
        for call in calls {
            info!("║       → Executing tool: {} ({})", call.name, call.id);
            debug!("║         Arguments: {}", call.arguments);

            let output = match self.tools.execute(&call.name, call.arguments.clone()).await {
                Ok(result) => {
                    info!("║       ← Tool result: {} chars", result.len());
                    result
                }
                Err(e) => {
                    warn!("║       ⚠ Tool {} failed: {}", call.name, e);
                    format!("Error: {}", e)
                }
            };

            transcript.push(Message::tool(&call.name, output));
        }
    }
}

#[async_trait]
impl Agent for FunctionAgent {
    async fn run(&self, message: &str) -> Result<String, AgentError> {
        let schemas = self.tools.list();
        let start = Instant::now();

        info!("╔══════════════════════════════════════════════════════════════");
        info!("║ AGENT: {} ({})", self.profile.name, self.llm.model());
        info!("║ Input: {}...", message.chars().take(50).collect::<String>());
        if !schemas.is_empty() {
            info!("║ Tools: {:?}", self.tools.tool_names());
        }

        let mut transcript = vec![Message::user(message)];

        for iteration in 1..=self.max_iterations {
            let response = self
                .llm
                .chat_with_tools(&self.profile.system_prompt, &transcript, &schemas)
                .await?;

            match response {
                ChatResponse::Content(llm_response) => {
                    info!(
                        "║ ← Final response: {} chars (after {} iterations, {:?})",
                        llm_response.content.len(),
                        iteration,
                        start.elapsed()
                    );
                    info!("╚══════════════════════════════════════════════════════════════");
                    return Ok(llm_response.content);
                }
                ChatResponse::ToolCalls { calls, content, metrics: _ } => {
                    info!(
                        "║ ← [{}] Tool calls: {:?}",
                        iteration,
                        calls.iter().map(|c| &c.name).collect::<Vec<_>>()
                    );
                    transcript.push(Message::assistant(content, calls.clone()));
                    self.run_tool_calls(&calls, &mut transcript).await;
                }
            }
        }

        warn!("║ ⚠ Max iterations ({}) reached", self.max_iterations);
        info!("╚══════════════════════════════════════════════════════════════");
        Err(AgentError::MaxIterations(self.max_iterations))
    }
}
