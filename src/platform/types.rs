//! Records and messages exchanged with the agent platform

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque document attached to a registry entry. Its shape is owned by the registry.
pub type Details = serde_json::Map<String, serde_json::Value>;

/// An agent as reported by the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub num_stars: u64,
    #[serde(default)]
    pub details: Details,
}

impl AgentRecord {
    /// Create a record with only its identity filled in
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version: version.into(),
            description: String::new(),
            tags: Vec::new(),
            updated: String::new(),
            num_stars: 0,
            details: Details::new(),
        }
    }

    /// `namespace/name`, the form users type and the platform accepts
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Whether this record is the one identified by `name` within `namespace`
    pub fn is(&self, name: &str, namespace: &str) -> bool {
        self.name == name && self.namespace == namespace
    }

    /// Parse the update timestamp.
    ///
    /// Accepts RFC 3339 and naive ISO timestamps (taken as UTC). Returns `None`
    /// for anything else so callers can fall back to the raw string.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.updated.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Message role for completion requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A role-tagged message sent to the completion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A message on a thread. The role is whatever the platform reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub role: String,
    pub content: String,
}

impl ThreadMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Opaque handle of a conversation thread
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filters for a registry listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListAgentsQuery {
    /// Empty matches every namespace
    pub namespace: String,
    pub category: String,
    /// Empty matches every tag
    pub tags: String,
    pub total: u32,
    pub offset: u32,
    pub show_all: bool,
    pub show_latest_version: bool,
    /// Empty disables the filter
    pub starred_by: String,
}

impl ListAgentsQuery {
    /// Every agent, latest versions only, capped at `total`
    pub fn all_agents(total: u32) -> Self {
        Self {
            namespace: String::new(),
            category: "agent".to_string(),
            tags: String::new(),
            total,
            offset: 0,
            show_all: true,
            show_latest_version: true,
            starred_by: String::new(),
        }
    }
}

/// Request to start an agent run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAgent {
    pub owner: String,
    pub agent_name: String,
    /// A concrete version or `latest`
    pub version: String,
    pub query: Option<String>,
    pub model: String,
    pub fork_thread: bool,
}

impl RunAgent {
    /// `owner/name/version` as the platform addresses agents
    pub fn agent_id(&self) -> String {
        format!("{}/{}/{}", self.owner, self.agent_name, self.version)
    }
}
