//! Builds the instruction sent to the agent from the request fields.

/// Composes the agent message.
///
/// With a question the agent answers it against the context; without one it
/// summarizes the context. Either way it is asked to reply in Chinese.
pub fn compose_message(context: &str, question: &str) -> String {
    if question.is_empty() {
        format!("请总结以下文本: {context}\n\n请用中文回复。")
    } else {
        format!("基于以下上下文: {context}\n\n问题: {question}\n\n请用中文回复。")
    }
}
