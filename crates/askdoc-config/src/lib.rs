//! Runtime settings for the askdoc service.
//!
//! Model parameters are compiled in. Secrets and deployment knobs come from the
//! process environment and are resolved once at startup into [`Settings`].

use std::fmt;
use std::time::Duration;

/// Model served by the local Ollama instance.
pub const MODEL_NAME: &str = "Qwen3:8b";

/// Upper bound on a single model request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(360);

/// Context window passed to Ollama as `num_ctx`, limits memory usage.
pub const CONTEXT_WINDOW: u32 = 8000;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

pub const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

/// Results requested from Tavily when the model does not ask for a count.
pub const SEARCH_MAX_RESULTS: u32 = 6;

pub const TAVILY_API_KEY_VAR: &str = "TAVILY_API_KEY";
pub const OLLAMA_HOST_VAR: &str = "OLLAMA_HOST";
pub const BIND_ADDR_VAR: &str = "BIND_ADDR";

/// Configuration loading errors.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Connection parameters for the inference endpoint.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub model: String,
    pub api_base: String,
    pub request_timeout: Duration,
    pub context_window: u32,
}

impl ModelSettings {
    /// Compiled-in model parameters against the given Ollama host.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            model: MODEL_NAME.to_string(),
            api_base: api_base.into(),
            request_timeout: REQUEST_TIMEOUT,
            context_window: CONTEXT_WINDOW,
        }
    }
}

/// Web search provider settings.
#[derive(Clone)]
pub struct SearchSettings {
    pub api_key: String,
    pub endpoint: String,
    pub max_results: u32,
}

impl SearchSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: TAVILY_SEARCH_URL.to_string(),
            max_results: SEARCH_MAX_RESULTS,
        }
    }
}

impl fmt::Debug for SearchSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchSettings")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("max_results", &self.max_results)
            .finish()
    }
}

/// Identity and instructions of the agent.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub name: String,
    pub description: String,
    pub system_prompt: String,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            name: "Agent".to_string(),
            description: "Useful for performing financial operations.".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
        }
    }
}

/// Everything the server needs to build its agent and bind its listener.
#[derive(Debug, Clone)]
pub struct Settings {
    pub model: ModelSettings,
    pub search: SearchSettings,
    pub agent: AgentProfile,
    pub bind_addr: String,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary variable lookup.
    ///
    /// Blank values count as unset. `TAVILY_API_KEY` is required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = var(TAVILY_API_KEY_VAR).ok_or(ConfigError::MissingVar(TAVILY_API_KEY_VAR))?;
        let ollama_host = var(OLLAMA_HOST_VAR).unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
        let bind_addr = var(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            model: ModelSettings::new(ollama_host),
            search: SearchSettings::new(api_key),
            agent: AgentProfile::default(),
            bind_addr,
        })
    }
}
