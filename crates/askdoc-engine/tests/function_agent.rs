use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use askdoc_config::{AgentProfile, ModelSettings};
use askdoc_core::AgentError;
use askdoc_engine::{Agent, FunctionAgent, MAX_ITERATIONS};
use askdoc_llm::OllamaClient;
use askdoc_tools::{Tool, ToolError, ToolRegistry};
use async_trait::async_trait;
use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct MockOllama {
    replies: Arc<Mutex<VecDeque<Value>>>,
    requests: Arc<Mutex<Vec<Value>>>,
    /// Returned once the scripted replies run out.
    fallback: Arc<Mutex<Option<Value>>>,
}

async fn chat(State(mock): State<MockOllama>, Json(body): Json<Value>) -> Json<Value> {
    mock.requests.lock().unwrap().push(body);
    let next = mock.replies.lock().unwrap().pop_front();
    Json(next.or_else(|| mock.fallback.lock().unwrap().clone()).unwrap_or_else(|| content_reply("")))
}

async fn spawn_mock_ollama(mock: MockOllama) -> String {
    let app = Router::new().route("/api/chat", post(chat)).with_state(mock);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn content_reply(text: &str) -> Value {
    json!({ "message": { "role": "assistant", "content": text }, "done": true })
}

fn tool_call_reply(name: &str, args: Value) -> Value {
    json!({
        "message": {
            "role": "assistant",
            "content": "",
            "tool_calls": [{ "function": { "name": name, "arguments": args } }]
        },
        "done": true
    })
}

/// Stand-in for the search tool that records its queries.
#[derive(Clone, Default)]
struct FakeSearch {
    queries: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

#[async_trait]
impl Tool for FakeSearch {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the web"
    }

    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": { "query": { "type": "string" } }, "required": ["query"] })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        if self.fail {
            return Err(ToolError::ExecutionFailed("Tavily API error: 401".to_string()));
        }
        let query = args["query"].as_str().unwrap_or_default().to_string();
        self.queries.lock().unwrap().push(query.clone());
        Ok(format!("1. **Result for {query}**"))
    }
}

async fn agent_with(mock: &MockOllama, search: FakeSearch) -> FunctionAgent {
    let base = spawn_mock_ollama(mock.clone()).await;
    let llm = OllamaClient::new(&ModelSettings::new(base)).unwrap();
    let mut tools = ToolRegistry::new();
    tools.register(search);
    FunctionAgent::new(AgentProfile::default(), llm, tools)
}

fn script(mock: &MockOllama, replies: Vec<Value>) {
    mock.replies.lock().unwrap().extend(replies);
}

#[tokio::test]
async fn direct_answer_needs_one_model_call() {
    let mock = MockOllama::default();
    script(&mock, vec![content_reply("营收增长了5%。")]);
    let agent = agent_with(&mock, FakeSearch::default()).await;

    let answer = agent.run("问题: 营收增长了多少?").await.unwrap();

    assert_eq!(answer, "营收增长了5%。");
    let requests = mock.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["messages"][0]["content"], "You are a helpful assistant.");
    assert_eq!(requests[0]["messages"][1]["content"], "问题: 营收增长了多少?");
    assert_eq!(requests[0]["tools"][0]["function"]["name"], "search");
}

#[tokio::test]
async fn tool_output_reaches_the_next_model_call() {
    let mock = MockOllama::default();
    script(
        &mock,
        vec![
            tool_call_reply("search", json!({ "query": "Ben Affleck spouse" })),
            content_reply("Jennifer Garner and Jennifer Lopez."),
        ],
    );
    let search = FakeSearch::default();
    let agent = agent_with(&mock, search.clone()).await;

    let answer = agent.run("Who is Ben Affleck's spouse?").await.unwrap();

    assert_eq!(answer, "Jennifer Garner and Jennifer Lopez.");
    assert_eq!(*search.queries.lock().unwrap(), vec!["Ben Affleck spouse".to_string()]);

    let requests = mock.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    let messages = requests[1]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2]["role"], "assistant");
    assert_eq!(messages[2]["tool_calls"][0]["function"]["name"], "search");
    assert_eq!(messages[3]["role"], "tool");
    assert_eq!(messages[3]["tool_name"], "search");
    assert_eq!(messages[3]["content"], "1. **Result for Ben Affleck spouse**");
}

#[tokio::test]
async fn unknown_tool_is_reported_back_to_the_model() {
    let mock = MockOllama::default();
    script(
        &mock,
        vec![tool_call_reply("calculator", json!({ "expr": "1+1" })), content_reply("2")],
    );
    let agent = agent_with(&mock, FakeSearch::default()).await;

    let answer = agent.run("1+1?").await.unwrap();

    assert_eq!(answer, "2");
    let requests = mock.requests.lock().unwrap();
    assert_eq!(requests[1]["messages"][3]["content"], "Error: Tool calculator does not exist");
}

#[tokio::test]
async fn failing_tool_does_not_abort_the_run() {
    let mock = MockOllama::default();
    script(
        &mock,
        vec![tool_call_reply("search", json!({ "query": "q" })), content_reply("I could not search.")],
    );
    let agent = agent_with(&mock, FakeSearch { fail: true, ..Default::default() }).await;

    let answer = agent.run("q").await.unwrap();

    assert_eq!(answer, "I could not search.");
    let requests = mock.requests.lock().unwrap();
    let tool_turn = requests[1]["messages"][3]["content"].as_str().unwrap().to_string();
    assert!(tool_turn.starts_with("Error: Tool execution failed"), "{tool_turn}");
}

#[tokio::test]
async fn endless_tool_calls_stop_at_the_iteration_limit() {
    let mock = MockOllama::default();
    *mock.fallback.lock().unwrap() = Some(tool_call_reply("search", json!({ "query": "again" })));
    let agent = agent_with(&mock, FakeSearch::default()).await.with_max_iterations(3);

    let err = agent.run("loop forever").await.unwrap_err();

    assert!(matches!(err, AgentError::MaxIterations(3)));
    assert_eq!(mock.requests.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn model_failure_propagates() {
    let llm = OllamaClient::new(&ModelSettings::new("http://127.0.0.1:1")).unwrap();
    let agent = FunctionAgent::new(AgentProfile::default(), llm, ToolRegistry::new());

    let err = agent.run("hi").await.unwrap_err();

    assert!(matches!(err, AgentError::LlmError(_)));
}

#[test]
fn default_iteration_limit_is_twenty() {
    assert_eq!(MAX_ITERATIONS, 20);
}
