// src/assistant/client.rs
//! HTTP client for the assistants API: thread creation, message append,
//! run creation, and bounded run polling.

use super::types::{
    AssistantError, CreateMessageRequest, CreateRunRequest, MessageList, Run, Thread,
};
use crate::config::AssistantSettings;
use regex::Regex;
use reqwest::Client;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

const OPENAI_BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

#[derive(Clone)]
pub struct AssistantClient {
    client: Client,
    api_base_url: String,
    api_key: String,
    assistant_id: Option<String>,
    poll_interval: Duration,
    max_polls: u32,
}

impl AssistantClient {
    /// Build a client from environment credentials. Only the API key is
    /// required up front; the assistant id is checked when a run is created,
    /// so thread creation works without it.
    pub fn from_env(settings: &AssistantSettings) -> Result<Self, AssistantError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AssistantError::Configuration("OPENAI_API_KEY is not set".to_string()))?;
        let assistant_id = std::env::var("ASSISTANT_ID").ok();
        Ok(Self::new(settings, api_key, assistant_id))
    }

    pub fn new(
        settings: &AssistantSettings,
        api_key: String,
        assistant_id: Option<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base_url: settings.api_base_url.clone(),
            api_key,
            assistant_id,
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            max_polls: settings.max_polls,
        }
    }

    fn assistant_id(&self) -> Result<&str, AssistantError> {
        self.assistant_id
            .as_deref()
            .ok_or_else(|| AssistantError::Configuration("ASSISTANT_ID is not set".to_string()))
    }

    /// Verify both credentials are present before any upstream call is made.
    pub fn ensure_configured(&self) -> Result<(), AssistantError> {
        self.assistant_id().map(|_| ())
    }

    /// Create a fresh remote conversation thread and return its handle.
    pub async fn create_thread(&self) -> Result<String, AssistantError> {
        let url = format!("{}/threads", self.api_base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(OPENAI_BETA_HEADER.0, OPENAI_BETA_HEADER.1)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| AssistantError::Upstream(format!("Failed to create thread: {}", e)))?;

        let thread: Thread = Self::read_json(response, "Failed to create thread").await?;
        info!("Created thread {}", thread.id);
        Ok(thread.id)
    }

    /// Append the user message, run the assistant, wait for completion, and
    /// return the newest message with citation markers rewritten.
    pub async fn chat(
        &self,
        thread_id: &str,
        message: &str,
        instructions: &str,
    ) -> Result<String, AssistantError> {
        self.add_message(thread_id, message).await?;

        let run = self.create_run(thread_id, instructions).await?;
        info!("Created run {}", run.id);

        let run_id = run.id.clone();
        let fetch = || {
            let client = self.clone();
            let thread_id = thread_id.to_string();
            let run_id = run_id.clone();
            async move { client.fetch_run(&thread_id, &run_id).await }
        };
        poll_until_completed(run, self.max_polls, self.poll_interval, fetch).await?;

        let text = self.latest_message_text(thread_id).await?;
        Ok(clean_citations(&text))
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<(), AssistantError> {
        let url = format!("{}/threads/{}/messages", self.api_base_url, thread_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(OPENAI_BETA_HEADER.0, OPENAI_BETA_HEADER.1)
            .json(&CreateMessageRequest {
                role: "user",
                content,
            })
            .send()
            .await
            .map_err(|e| {
                AssistantError::Upstream(format!("Failed to add message to thread: {}", e))
            })?;

        Self::check_status(response, "Failed to add message to thread").await?;
        Ok(())
    }

    async fn create_run(
        &self,
        thread_id: &str,
        instructions: &str,
    ) -> Result<Run, AssistantError> {
        let url = format!("{}/threads/{}/runs", self.api_base_url, thread_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(OPENAI_BETA_HEADER.0, OPENAI_BETA_HEADER.1)
            .json(&CreateRunRequest {
                assistant_id: self.assistant_id()?,
                instructions,
            })
            .send()
            .await
            .map_err(|e| AssistantError::Upstream(format!("Failed to create run: {}", e)))?;

        Self::read_json(response, "Failed to create run").await
    }

    async fn fetch_run(&self, thread_id: &str, run_id: &str) -> Result<Run, AssistantError> {
        let url = format!(
            "{}/threads/{}/runs/{}",
            self.api_base_url, thread_id, run_id
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(OPENAI_BETA_HEADER.0, OPENAI_BETA_HEADER.1)
            .send()
            .await
            .map_err(|e| AssistantError::Upstream(format!("Failed to check run status: {}", e)))?;

        Self::read_json(response, "Failed to check run status").await
    }

    /// Newest message text on the thread; empty or structurally incomplete
    /// payloads surface as `EmptyResponse` so callers can degrade gracefully.
    async fn latest_message_text(&self, thread_id: &str) -> Result<String, AssistantError> {
        let url = format!(
            "{}/threads/{}/messages?limit=1&order=desc",
            self.api_base_url, thread_id
        );
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header(OPENAI_BETA_HEADER.0, OPENAI_BETA_HEADER.1)
            .send()
            .await
            .map_err(|e| AssistantError::Upstream(format!("Failed to get messages: {}", e)))?;

        let messages: MessageList = Self::read_json(response, "Failed to get messages").await?;

        let text = messages
            .data
            .first()
            .and_then(|message| message.content.first())
            .and_then(|content| content.text.as_ref())
            .map(|text| text.value.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            warn!("Assistant returned no usable message text");
            return Err(AssistantError::EmptyResponse);
        }

        Ok(text)
    }

    async fn check_status(
        response: reqwest::Response,
        context: &str,
    ) -> Result<reqwest::Response, AssistantError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AssistantError::Upstream(format!(
            "{}: {} {}",
            context, status, body
        )))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, AssistantError> {
        let response = Self::check_status(response, context).await?;
        response
            .json()
            .await
            .map_err(|e| AssistantError::Upstream(format!("{}: invalid body: {}", context, e)))
    }
}

/// Poll the run until it completes. `failed` / `cancelled` propagate the
/// remote error; anything else counts against the fixed attempt budget.
pub(crate) async fn poll_until_completed<F, Fut>(
    initial: Run,
    max_polls: u32,
    interval: Duration,
    mut fetch: F,
) -> Result<Run, AssistantError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Run, AssistantError>>,
{
    let mut run = initial;
    let mut polls = 0u32;

    loop {
        match run.status.as_str() {
            "completed" => return Ok(run),
            "failed" | "cancelled" => {
                let detail = run
                    .last_error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "Unknown error".to_string());
                return Err(AssistantError::Upstream(format!(
                    "Run {}: {}",
                    run.status, detail
                )));
            }
            status => {
                if polls >= max_polls {
                    warn!("Run still '{}' after {} polls, giving up", status, polls);
                    return Err(AssistantError::Timeout);
                }
                tokio::time::sleep(interval).await;
                polls += 1;
                run = fetch().await?;
            }
        }
    }
}

/// Rewrite citation markers like `[24:14†Some-File.pdf]` into a readable
/// `— source: Some-File` suffix (path and extension stripped).
pub fn clean_citations(content: &str) -> String {
    static CITATION: OnceLock<Regex> = OnceLock::new();
    let pattern = CITATION
        .get_or_init(|| Regex::new(r"\[\d+:\d+†([^\]]+)\]").expect("hardcoded pattern is valid"));

    pattern
        .replace_all(content, |caps: &regex::Captures<'_>| {
            let filename = caps[1].rsplit('/').next().unwrap_or(&caps[1]);
            let stem = filename
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .unwrap_or(filename);
            format!("— source: {}", stem)
        })
        .into_owned()
}
