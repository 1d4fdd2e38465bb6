//! HTTP client for the hosted platform API

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{
    AgentRecord, ChatMessage, ListAgentsQuery, Platform, PlatformError, PlatformResult, RunAgent,
    ThreadId, ThreadMessage,
};
use crate::auth::ApiKey;

/// Platform client over the JSON API
pub struct HttpPlatform {
    http_client: reqwest::Client,
    base_url: Url,
    api_key: ApiKey,
    /// Model used for completions
    model: String,
}

impl HttpPlatform {
    /// Create a new client against `base_url`
    pub fn new(
        base_url: Url,
        api_key: ApiKey,
        model: impl Into<String>,
        timeout: std::time::Duration,
    ) -> PlatformResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(PlatformError::Unavailable(format!(
                "invalid base url: {}",
                base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(format!("agent-scout/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PlatformError::Unavailable(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
            api_key,
            model: model.into(),
        })
    }

    /// Build headers for API requests
    fn headers(&self) -> PlatformResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&self.api_key.auth_header())
                .map_err(|_| PlatformError::Unavailable("invalid API key".to_string()))?,
        );
        Ok(headers)
    }

    /// Append path segments to the base URL
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn list_agents_request(&self, query: &ListAgentsQuery) -> PlatformResult<RequestBuilder> {
        Ok(self
            .http_client
            .post(self.endpoint(&["registry", "list_entries"]))
            .headers(self.headers()?)
            .query(query))
    }

    fn input_request(&self, thread: &ThreadId) -> PlatformResult<RequestBuilder> {
        Ok(self
            .http_client
            .post(self.endpoint(&["threads", thread.as_str(), "input_requests"]))
            .headers(self.headers()?))
    }

    fn reply_request(&self, thread: &ThreadId, text: &str) -> PlatformResult<RequestBuilder> {
        let body = ReplyRequest {
            role: "user",
            content: text,
        };
        Ok(self
            .http_client
            .post(self.endpoint(&["threads", thread.as_str(), "messages"]))
            .headers(self.headers()?)
            .json(&body))
    }

    /// Turn a non-success response into an error
    async fn check(response: reqwest::Response) -> PlatformResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiError>(&error_text) {
            Ok(api_error) => api_error.message(),
            Err(_) => error_text,
        };
        tracing::debug!("Platform returned {}: {}", status, message);

        Err(PlatformError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Platform for HttpPlatform {
    async fn list_agents(&self, query: &ListAgentsQuery) -> PlatformResult<Vec<AgentRecord>> {
        tracing::debug!("Listing agents: {:?}", query);
        let response = self.list_agents_request(query)?.send().await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn completion(&self, messages: &[ChatMessage], max_tokens: u32) -> PlatformResult<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens,
        };

        let response = self
            .http_client
            .post(self.endpoint(&["chat", "completions"]))
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        let body: CompletionResponse = Self::check(response).await?.json().await?;
        body.into_text()
    }

    async fn run_agent(&self, request: &RunAgent) -> PlatformResult<ThreadId> {
        let body = RunRequest {
            agent_id: request.agent_id(),
            new_message: request.query.as_deref(),
            model: &request.model,
            fork_thread: request.fork_thread,
        };
        tracing::info!("Starting run of {}", body.agent_id);

        let response = self
            .http_client
            .post(self.endpoint(&["threads", "runs"]))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let run: RunResponse = Self::check(response).await?.json().await?;
        Ok(run.into_thread_id())
    }

    async fn list_messages(&self, thread: &ThreadId) -> PlatformResult<Vec<ThreadMessage>> {
        let response = self
            .http_client
            .get(self.endpoint(&["threads", thread.as_str(), "messages"]))
            .headers(self.headers()?)
            .send()
            .await?;

        let list: MessageList = Self::check(response).await?.json().await?;
        Ok(list.into_messages())
    }

    async fn request_user_input(&self, thread: &ThreadId) -> PlatformResult<()> {
        let response = self.input_request(thread)?.send().await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn add_reply(&self, thread: &ThreadId, text: &str) -> PlatformResult<()> {
        let response = self.reply_request(thread, text)?.send().await?;

        Self::check(response).await?;
        Ok(())
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionResponse {
    fn into_text(self) -> PlatformResult<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PlatformError::MalformedResponse("completion has no content".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_message: Option<&'a str>,
    model: &'a str,
    fork_thread: bool,
}

/// Runs answer with either a bare thread id or an object carrying one
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RunResponse {
    Bare(String),
    Object { thread_id: String },
}

impl RunResponse {
    fn into_thread_id(self) -> ThreadId {
        match self {
            RunResponse::Bare(id) | RunResponse::Object { thread_id: id } => ThreadId::new(id),
        }
    }
}

#[derive(Debug, Serialize)]
struct ReplyRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageList {
    Page { data: Vec<WireMessage> },
    Bare(Vec<WireMessage>),
}

impl MessageList {
    fn into_messages(self) -> Vec<ThreadMessage> {
        let wire = match self {
            MessageList::Page { data } => data,
            MessageList::Bare(data) => data,
        };
        wire.into_iter()
            .map(|msg| ThreadMessage::new(msg.role, msg.content.into_text()))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    role: String,
    content: WireContent,
}

/// Message content is either plain text or a list of typed parts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WirePart {
    Annotated { text: WireText },
    Plain { text: String },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
struct WireText {
    value: String,
}

impl WireContent {
    fn into_text(self) -> String {
        match self {
            WireContent::Text(text) => text,
            WireContent::Parts(parts) => parts
                .into_iter()
                .filter_map(|part| match part {
                    WirePart::Annotated { text } => Some(text.value),
                    WirePart::Plain { text } => Some(text),
                    WirePart::Other(_) => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Error bodies come as `{"detail": ...}` or `{"error": {"message": ...}}`
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl ApiError {
    fn message(self) -> String {
        if let Some(body) = self.error {
            return body.message;
        }
        match self.detail {
            Some(serde_json::Value::String(detail)) => detail,
            Some(other) => other.to_string(),
            None => "unknown error".to_string(),
        }
    }
}
