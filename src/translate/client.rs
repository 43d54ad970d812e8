//! HTTP client for the OpenAI Assistants v2 API.
//!
//! Covers the five calls the translation operation needs: create a thread,
//! add a message, start a run, poll run status, and list messages. Every
//! request carries bearer authorization and the assistants feature header;
//! any non-success response aborts the operation without retrying.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::TranslationError;

/// Header advertising the Assistants API feature version.
const ASSISTANTS_FEATURE_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Status reported by the remote run endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    /// The run finished and produced output.
    Completed,
    /// The run ended in a terminal failure.
    Failed,
    /// The run was cancelled remotely.
    Cancelled,
    /// The run expired before completing.
    Expired,
    /// Any status that is not terminal yet (queued, in_progress, ...).
    Pending(String),
}

impl RunStatus {
    /// Parses the wire status string. Unknown statuses are treated as
    /// pending so the poll loop keeps waiting until its deadline.
    pub fn parse(status: &str) -> Self {
        match status {
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            "cancelled" => RunStatus::Cancelled,
            "expired" => RunStatus::Expired,
            other => RunStatus::Pending(other.to_string()),
        }
    }

    /// Whether no further transition will occur.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Pending(_))
    }

    /// Wire name of the status.
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Pending(s) => s.as_str(),
        }
    }
}

/// A message pulled from a conversation, reduced to its text segments.
#[derive(Debug, Clone)]
pub struct ConversationMessage {
    /// Text values of the message's content blocks, in order.
    pub text_segments: Vec<String>,
}

/// Remote conversation backend consumed by the translation operation.
///
/// One method per remote call, so tests can inject scripted status
/// sequences instead of waiting on a real service.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Opens a new conversation context and returns its id.
    async fn create_conversation(&self) -> Result<String, TranslationError>;

    /// Submits `text` as a user message into the conversation.
    async fn add_message(&self, thread_id: &str, text: &str) -> Result<(), TranslationError>;

    /// Starts a processing run and returns its id.
    async fn start_run(&self, thread_id: &str) -> Result<String, TranslationError>;

    /// Reads the current status of a run.
    async fn run_status(&self, thread_id: &str, run_id: &str)
        -> Result<RunStatus, TranslationError>;

    /// Lists the conversation's messages, most recent first.
    async fn list_messages(
        &self,
        thread_id: &str,
    ) -> Result<Vec<ConversationMessage>, TranslationError>;
}

/// Client for the OpenAI Assistants v2 API.
pub struct AssistantsClient {
    /// Base URL for the API.
    api_base: String,
    /// API key for bearer authentication.
    api_key: String,
    /// Assistant that performs the translation.
    assistant_id: String,
    /// HTTP client for making API requests.
    http_client: Client,
}

impl AssistantsClient {
    /// Creates a new client with explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL for the API (e.g., "https://api.openai.com/v1")
    /// * `api_key` - API key for authentication
    /// * `assistant_id` - Assistant to run against each conversation
    pub fn new(api_base: String, api_key: String, assistant_id: String) -> Self {
        Self {
            api_base,
            api_key,
            assistant_id,
            http_client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Sends a POST with the standard headers and decodes the response.
    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R, TranslationError> {
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.api_key)
            .header(ASSISTANTS_FEATURE_HEADER.0, ASSISTANTS_FEATURE_HEADER.1)
            .json(body)
            .send()
            .await
            .map_err(|e| TranslationError::RequestFailed(e.to_string()))?;

        Self::decode(response).await
    }

    /// Sends a GET with the standard headers and decodes the response.
    async fn get_json<R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
    ) -> Result<R, TranslationError> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.api_key)
            .header(ASSISTANTS_FEATURE_HEADER.0, ASSISTANTS_FEATURE_HEADER.1)
            .send()
            .await
            .map_err(|e| TranslationError::RequestFailed(e.to_string()))?;

        Self::decode(response).await
    }

    /// Maps non-success statuses to `TranslationError::Remote` with the
    /// error body surfaced, then parses the JSON payload.
    async fn decode<R: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<R, TranslationError> {
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            return Err(TranslationError::Remote {
                code: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| TranslationError::Parse(e.to_string()))
    }
}

#[async_trait]
impl TranslationBackend for AssistantsClient {
    async fn create_conversation(&self) -> Result<String, TranslationError> {
        let url = format!("{}/threads", self.api_base);
        let response: ApiThread = self.post_json(&url, &serde_json::json!({})).await?;

        tracing::debug!(thread_id = %response.id, "Conversation created");
        Ok(response.id)
    }

    async fn add_message(&self, thread_id: &str, text: &str) -> Result<(), TranslationError> {
        let url = format!("{}/threads/{}/messages", self.api_base, thread_id);
        let body = ApiMessageRequest {
            role: "user",
            content: text,
        };
        let _: serde_json::Value = self.post_json(&url, &body).await?;

        tracing::debug!(thread_id, "Message added to conversation");
        Ok(())
    }

    async fn start_run(&self, thread_id: &str) -> Result<String, TranslationError> {
        let url = format!("{}/threads/{}/runs", self.api_base, thread_id);
        let body = ApiRunRequest {
            assistant_id: &self.assistant_id,
        };
        let response: ApiRun = self.post_json(&url, &body).await?;

        tracing::debug!(thread_id, run_id = %response.id, "Run started");
        Ok(response.id)
    }

    async fn run_status(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunStatus, TranslationError> {
        let url = format!("{}/threads/{}/runs/{}", self.api_base, thread_id, run_id);
        let response: ApiRun = self.get_json(&url).await?;

        Ok(RunStatus::parse(&response.status))
    }

    async fn list_messages(
        &self,
        thread_id: &str,
    ) -> Result<Vec<ConversationMessage>, TranslationError> {
        let url = format!("{}/threads/{}/messages", self.api_base, thread_id);
        let response: ApiMessageList = self.get_json(&url).await?;

        Ok(response
            .data
            .into_iter()
            .map(|msg| ConversationMessage {
                text_segments: msg
                    .content
                    .into_iter()
                    .filter_map(|block| block.text.map(|t| t.value))
                    .collect(),
            })
            .collect())
    }
}

/// Internal thread structure from the API response.
#[derive(Debug, Deserialize)]
struct ApiThread {
    id: String,
}

/// Internal run structure from the API response.
#[derive(Debug, Deserialize)]
struct ApiRun {
    id: String,
    #[serde(default)]
    status: String,
}

/// Internal message-create request body.
#[derive(Debug, Serialize)]
struct ApiMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

/// Internal run-create request body.
#[derive(Debug, Serialize)]
struct ApiRunRequest<'a> {
    assistant_id: &'a str,
}

/// Internal message list from the API response (most recent first).
#[derive(Debug, Deserialize)]
struct ApiMessageList {
    data: Vec<ApiMessage>,
}

/// Internal message structure from the API response.
#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Vec<ApiContentBlock>,
}

/// Internal content block; only text blocks carry a payload we use.
#[derive(Debug, Deserialize)]
struct ApiContentBlock {
    #[serde(default)]
    text: Option<ApiTextValue>,
}

/// Internal text value wrapper.
#[derive(Debug, Deserialize)]
struct ApiTextValue {
    value: String,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

/// Error detail from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_parse_terminal() {
        assert_eq!(RunStatus::parse("completed"), RunStatus::Completed);
        assert_eq!(RunStatus::parse("failed"), RunStatus::Failed);
        assert_eq!(RunStatus::parse("cancelled"), RunStatus::Cancelled);
        assert_eq!(RunStatus::parse("expired"), RunStatus::Expired);
        assert!(RunStatus::parse("completed").is_terminal());
    }

    #[test]
    fn test_run_status_parse_pending() {
        for s in ["queued", "in_progress", "requires_action", "whatever"] {
            let status = RunStatus::parse(s);
            assert!(!status.is_terminal(), "'{s}' should not be terminal");
            assert_eq!(status.as_str(), s);
        }
    }

    #[test]
    fn test_message_list_deserialization() {
        let json = r#"{
            "data": [
                {"content": [{"type": "text", "text": {"value": "Привет"}}]},
                {"content": [{"type": "text", "text": {"value": "Hello"}}]}
            ]
        }"#;

        let list: ApiMessageList = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(list.data.len(), 2);
        assert_eq!(
            list.data[0].content[0].text.as_ref().map(|t| t.value.as_str()),
            Some("Привет")
        );
    }

    #[test]
    fn test_message_list_tolerates_non_text_blocks() {
        let json = r#"{"data": [{"content": [{"type": "image_file"}]}]}"#;
        let list: ApiMessageList = serde_json::from_str(json).expect("should deserialize");
        assert!(list.data[0].content[0].text.is_none());
    }

    #[tokio::test]
    async fn test_create_conversation_connection_error() {
        // No server behind this port: the request itself must fail, mapped
        // to RequestFailed rather than a panic or a Remote error.
        let client = AssistantsClient::new(
            "http://localhost:65535/v1".to_string(),
            "test-key".to_string(),
            "asst_test".to_string(),
        );

        let result = client.create_conversation().await;
        assert!(matches!(result, Err(TranslationError::RequestFailed(_))));
    }
}
