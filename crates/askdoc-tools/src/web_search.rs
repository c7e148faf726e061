use askdoc_config::SearchSettings;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::{Tool, ToolError};

/// Web search tool using the Tavily API.
pub struct WebSearchTool {
    api_key: String,
    endpoint: String,
    default_max_results: u32,
    client: reqwest::Client,
}

impl WebSearchTool {
    pub fn new(settings: &SearchSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            endpoint: settings.endpoint.clone(),
            default_max_results: settings.max_results,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
    search_depth: &'static str,
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    results: Vec<TavilyResult>,
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    title: String,
    url: String,
    content: String,
}

/// Formats results as numbered text blocks for the model.
fn format_results(response: &TavilyResponse) -> String {
    let mut output = String::new();

    if let Some(answer) = &response.answer {
        output.push_str(&format!("**Summary:** {}\n\n", answer));
    }

    if response.results.is_empty() {
        output.push_str("No results found.");
        return output;
    }

    output.push_str("**Search Results:**\n\n");

    for (i, result) in response.results.iter().enumerate() {
        output.push_str(&format!(
            "{}. **{}**\n   URL: {}\n   {}\n\n",
            i + 1,
            result.title,
            result.url,
            result.content
        ));
    }

    output
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Run a query through Tavily web search. Returns relevant results with titles, URLs, and content snippets."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "max_results": {
                    "type": "integer",
                    "description": format!("Maximum number of results to return (default: {})", self.default_max_results),
                    "default": self.default_max_results
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' parameter".to_string()))?;

        let max_results = args
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(self.default_max_results);

        info!("Tavily search: {} (max {})", query, max_results);

        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            max_results,
            search_depth: "basic",
        };

        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ToolError::ExecutionFailed(format!(
                "Tavily API error: {} - {}",
                status, body
            )));
        }

        let tavily_response: TavilyResponse = response.json().await.map_err(|e| {
            ToolError::ExecutionFailed(format!("Failed to parse Tavily response: {}", e))
        })?;

        Ok(format_results(&tavily_response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_results_are_stated() {
        let response = TavilyResponse { results: vec![], answer: None };
        assert_eq!(format_results(&response), "No results found.");
    }

    #[test]
    fn results_are_numbered() {
        let response = TavilyResponse {
            results: vec![TavilyResult {
                title: "Apple reports".to_string(),
                url: "https://example.com/apple".to_string(),
                content: "Revenue grew".to_string(),
            }],
            answer: Some("Up 5%".to_string()),
        };

        let text = format_results(&response);
        assert!(text.starts_with("**Summary:** Up 5%"));
        assert!(text.contains("1. **Apple reports**\n   URL: https://example.com/apple\n   Revenue grew"));
    }
}
