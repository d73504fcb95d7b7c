//! Chat exchange types

use serde::{Deserialize, Serialize};

use super::message::Message;

/// Body of a `/chat` request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest<'a> {
    pub message: &'a str,

    /// Omitted from the body when empty
    #[serde(skip_serializing_if = "no_history")]
    pub conversation_history: &'a [Message],
}

fn no_history(history: &&[Message]) -> bool {
    history.is_empty()
}

impl<'a> ChatRequest<'a> {
    pub fn new(message: &'a str, conversation_history: &'a [Message]) -> Self {
        Self {
            message,
            conversation_history,
        }
    }
}

/// Metadata about a chat response
///
/// The backend has used both snake_case and camelCase keys; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMetadata {
    pub provider: String,
    pub model: String,
    #[serde(alias = "contextLoaded")]
    pub context_loaded: bool,
    #[serde(alias = "identityValidated")]
    pub identity_validated: bool,
    #[serde(alias = "autoSaved")]
    pub auto_saved: bool,
    /// `None` when the backend did not report usage
    #[serde(default, alias = "tokensUsed", skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
}

impl ChatMetadata {
    /// Tokens consumed by the turn, if reported
    pub fn tokens_used(&self) -> Option<u64> {
        self.tokens_used
    }
}

/// Response from the chat route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub metadata: ChatMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_omitted_when_empty() {
        let body = serde_json::to_value(ChatRequest::new("hello", &[])).unwrap();
        assert_eq!(body, json!({"message": "hello"}));

        let history = vec![Message::user("hi"), Message::assistant("hello!")];
        let body = serde_json::to_value(ChatRequest::new("again", &history)).unwrap();
        assert_eq!(body["conversationHistory"][1]["role"], "assistant");
        assert_eq!(body["conversationHistory"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_tokens_used_present() {
        let response: ChatResponse = serde_json::from_value(json!({
            "response": "hi",
            "metadata": {
                "provider": "anthropic",
                "model": "claude",
                "context_loaded": true,
                "identity_validated": true,
                "auto_saved": true,
                "tokens_used": 12
            }
        }))
        .unwrap();

        assert_eq!(response.response, "hi");
        assert_eq!(response.metadata.tokens_used(), Some(12));
    }

    #[test]
    fn test_tokens_used_absent_is_none_not_zero() {
        let metadata: ChatMetadata = serde_json::from_value(json!({
            "provider": "openai",
            "model": "gpt",
            "contextLoaded": false,
            "identityValidated": true,
            "autoSaved": false
        }))
        .unwrap();

        assert_eq!(metadata.tokens_used, None);
        assert!(!metadata.context_loaded);
        assert!(metadata.identity_validated);
    }

    #[test]
    fn test_negative_tokens_rejected() {
        let parsed = serde_json::from_value::<ChatMetadata>(json!({
            "provider": "anthropic",
            "model": "claude",
            "context_loaded": true,
            "identity_validated": true,
            "auto_saved": true,
            "tokens_used": -3
        }));
        assert!(parsed.is_err());
    }
}
