// src/assistant/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;

// Wire format of the assistants API, reduced to the fields this proxy reads.

#[derive(Debug, Serialize)]
pub(crate) struct CreateMessageRequest<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRunRequest<'a> {
    pub assistant_id: &'a str,
    pub instructions: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Thread {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Run {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub last_error: Option<LastError>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LastError {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageList {
    #[serde(default)]
    pub data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThreadMessage {
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageContent {
    #[serde(default)]
    pub text: Option<MessageText>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageText {
    pub value: String,
}

/// Failure taxonomy of the proxy. Each variant carries its HTTP mapping so
/// the web layer stays a thin translation.
#[derive(Debug)]
pub enum AssistantError {
    /// A required credential is missing from the environment.
    Configuration(String),
    /// The upstream API rejected a call, a run failed, or the network broke.
    Upstream(String),
    /// The run never reached a terminal state within the poll budget.
    Timeout,
    /// The upstream answered but the newest message carried no usable text.
    EmptyResponse,
}

impl AssistantError {
    pub fn status_code(&self) -> u16 {
        match self {
            AssistantError::Configuration(_) => 500,
            AssistantError::Upstream(_) => 500,
            AssistantError::Timeout => 408,
            AssistantError::EmptyResponse => 204,
        }
    }
}

impl fmt::Display for AssistantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssistantError::Configuration(detail) => {
                write!(f, "Server configuration error: {}", detail)
            }
            AssistantError::Upstream(detail) => write!(f, "{}", detail),
            AssistantError::Timeout => write!(f, "Assistant response timed out"),
            AssistantError::EmptyResponse => write!(f, "Empty response from assistant"),
        }
    }
}

impl std::error::Error for AssistantError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_the_taxonomy() {
        assert_eq!(
            AssistantError::Configuration("OPENAI_API_KEY is not set".into()).status_code(),
            500
        );
        assert_eq!(AssistantError::Upstream("run failed".into()).status_code(), 500);
        assert_eq!(AssistantError::Timeout.status_code(), 408);
        assert_eq!(AssistantError::EmptyResponse.status_code(), 204);
    }

    #[test]
    fn run_deserializes_with_and_without_last_error() {
        let run: Run = serde_json::from_str(r#"{"id": "run_1", "status": "queued"}"#).unwrap();
        assert_eq!(run.status, "queued");
        assert!(run.last_error.is_none());

        let run: Run = serde_json::from_str(
            r#"{"id": "run_2", "status": "failed", "last_error": {"message": "rate limit"}}"#,
        )
        .unwrap();
        assert_eq!(
            run.last_error.and_then(|e| e.message).as_deref(),
            Some("rate limit")
        );
    }
}
