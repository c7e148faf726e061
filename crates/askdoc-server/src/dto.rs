//! Request and response bodies for the ask endpoint.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of `POST /api/ask`.
#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub context: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub question: String,
}

/// Successful answer.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Failure body, shared by every error path.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Accepts any JSON value: strings verbatim, `null` as empty, anything else as its JSON text.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}
