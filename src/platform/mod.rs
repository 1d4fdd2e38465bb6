//! The agent platform: registry, completions, runs and threads
//!
//! Everything this tool does is delegated to an external platform. The
//! [`Platform`] trait is the single seam between the orchestration code and
//! that platform:
//! - **Registry**: list the available agents
//! - **Completions**: ask an LLM to rank agents
//! - **Runs**: start an agent and get back a thread
//! - **Threads**: read messages, ask for user input, append replies
//!
//! [`HttpPlatform`] talks to the hosted JSON API. Tests drive the rest of the
//! crate through a scripted fake instead.

mod http;
mod types;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

pub use http::HttpPlatform;
pub use types::{
    AgentRecord, ChatMessage, Details, ListAgentsQuery, Role, RunAgent, ThreadId, ThreadMessage,
};

/// Failure of a single platform call
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The service could not be reached or the request did not complete
    #[error("platform unavailable: {0}")]
    Unavailable(String),

    /// The service answered with a non-success status
    #[error("platform error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The service answered but the body was not what we expected
    #[error("malformed platform response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for PlatformError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PlatformError::MalformedResponse(err.to_string())
        } else {
            PlatformError::Unavailable(err.to_string())
        }
    }
}

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Calls offered by the agent platform
#[async_trait]
pub trait Platform: Send + Sync {
    /// List registry entries matching `query`, in registry order
    async fn list_agents(&self, query: &ListAgentsQuery) -> PlatformResult<Vec<AgentRecord>>;

    /// Run a completion and return the raw text of the answer
    async fn completion(&self, messages: &[ChatMessage], max_tokens: u32) -> PlatformResult<String>;

    /// Start an agent run, returning the thread it runs on
    async fn run_agent(&self, request: &RunAgent) -> PlatformResult<ThreadId>;

    /// All messages on a thread, oldest first
    async fn list_messages(&self, thread: &ThreadId) -> PlatformResult<Vec<ThreadMessage>>;

    /// Tell the platform the user is about to type into the thread
    async fn request_user_input(&self, thread: &ThreadId) -> PlatformResult<()>;

    /// Append a user reply to the thread
    async fn add_reply(&self, thread: &ThreadId, text: &str) -> PlatformResult<()>;
}
