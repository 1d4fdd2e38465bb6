//! Agent ranking
//!
//! Picks the registry entry that best fits a free-text request by handing the
//! whole catalog to the completion service and asking for a JSON verdict:
//!
//! ```json
//! {
//!   "selected_agent_name": "Coder",
//!   "selected_agent_namespace": "alice",
//!   "relevance_score": 90,
//!   "reasoning": "..."
//! }
//! ```
//!
//! The verdict only counts if it names an agent that is actually in the
//! catalog snapshot the prompt was built from.

use std::sync::Arc;

use serde::{Deserialize, Deserializer};

use crate::catalog;
use crate::config::SelectorConfig;
use crate::platform::{AgentRecord, ChatMessage, Platform, PlatformError};

/// The agent picked for a query
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub agent: AgentRecord,
    /// 0-100
    pub score: u8,
    pub reasoning: String,
}

/// Why no agent was selected
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("Error listing agents: {0}")]
    Catalog(PlatformError),

    #[error("The registry returned no agents")]
    EmptyCatalog,

    #[error("Completion error: {0}")]
    Completion(PlatformError),

    #[error("Error parsing LLM response: {reason}")]
    Malformed { reason: String, raw: String },

    #[error("LLM selected {namespace}/{name}, which is not in the catalog")]
    NoMatch { name: String, namespace: String },
}

/// Ranks catalog entries against a query
pub struct AgentSelector {
    platform: Arc<dyn Platform>,
    config: SelectorConfig,
}

impl AgentSelector {
    pub fn new(platform: Arc<dyn Platform>, config: SelectorConfig) -> Self {
        Self { platform, config }
    }

    /// Fetch the current catalog and pick the best agent for `query`
    pub async fn select(&self, query: &str) -> Result<Selection, SelectionError> {
        let agents = catalog::fetch_agents(self.platform.as_ref(), self.config.catalog_limit)
            .await
            .map_err(SelectionError::Catalog)?;
        self.rank(query, &agents).await
    }

    /// Pick the best agent for `query` out of `agents`
    pub async fn rank(&self, query: &str, agents: &[AgentRecord]) -> Result<Selection, SelectionError> {
        if agents.is_empty() {
            return Err(SelectionError::EmptyCatalog);
        }

        let messages = [ChatMessage::user(build_prompt(query, agents))];
        let raw = self
            .platform
            .completion(&messages, self.config.max_tokens)
            .await
            .map_err(SelectionError::Completion)?;
        tracing::debug!("Ranking response: {}", raw);

        let verdict = parse_response(&raw)?;
        let selection = resolve(verdict, agents)?;
        tracing::info!(
            "Selected {} (score {})",
            selection.agent.full_name(),
            selection.score
        );
        Ok(selection)
    }
}

/// Build the ranking prompt for `query` over every agent in `agents`
pub fn build_prompt(query: &str, agents: &[AgentRecord]) -> String {
    let agent_list = agents
        .iter()
        .enumerate()
        .map(|(i, agent)| describe_agent(i + 1, agent))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Analyze the following list of agents and determine which is most relevant to the user query.

User Query: {query}

Agent List:
{agent_list}

Instructions:
1. Carefully read through all agents
2. Consider name, description, tags, recency, and stars
3. Evaluate the details
4. Identify the agent most suited to handle the query
5. Provide your reasoning
6. Output in this exact JSON format, with nothing before or after it:
{{
    "selected_agent_name": "...",
    "selected_agent_namespace": "...",
    "relevance_score": 0-100,
    "reasoning": "Brief explanation of why this agent is most suitable"
}}"#
    )
}

fn describe_agent(index: usize, agent: &AgentRecord) -> String {
    let details = serde_json::to_string_pretty(&agent.details).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Agent {index}:\n  Name: {}\n  Namespace: {}\n  Version: {}\n  Description: {}\n  Tags: {}\n  Last Updated: {}\n  Stars: {}\n  Details: {details}",
        agent.name,
        agent.namespace,
        agent.version,
        agent.description,
        agent.tags.join(", "),
        agent.updated,
        agent.num_stars,
    )
}

/// The completion service's verdict, before it is checked against the catalog
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Verdict {
    #[serde(rename = "selected_agent_name")]
    pub name: String,
    #[serde(rename = "selected_agent_namespace")]
    pub namespace: String,
    /// Missing scores count as 0
    #[serde(rename = "relevance_score", default, deserialize_with = "lenient_score")]
    pub score: u8,
    #[serde(default, deserialize_with = "nullable_string")]
    pub reasoning: String,
}

/// Parse the raw completion text. It must be exactly one JSON object.
pub fn parse_response(raw: &str) -> Result<Verdict, SelectionError> {
    let malformed = |reason: String| SelectionError::Malformed {
        reason,
        raw: raw.to_string(),
    };

    let value: serde_json::Value =
        serde_json::from_str(raw.trim()).map_err(|e| malformed(e.to_string()))?;
    if !value.is_object() {
        return Err(malformed("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}

/// Find the agent the verdict names. Both name and namespace must match exactly.
pub fn resolve(verdict: Verdict, agents: &[AgentRecord]) -> Result<Selection, SelectionError> {
    match agents.iter().find(|a| a.is(&verdict.name, &verdict.namespace)) {
        Some(agent) => Ok(Selection {
            agent: agent.clone(),
            score: verdict.score,
            reasoning: verdict.reasoning,
        }),
        None => Err(SelectionError::NoMatch {
            name: verdict.name,
            namespace: verdict.namespace,
        }),
    }
}

fn lenient_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    let score = match &value {
        serde_json::Value::Null => return Ok(0),
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match score {
        Some(score) if score.is_finite() => Ok(score.round().clamp(0.0, 100.0) as u8),
        _ => Err(D::Error::custom(format!("invalid relevance_score: {}", value))),
    }
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{Call, FakePlatform};
    use pretty_assertions::assert_eq;

    fn coder() -> AgentRecord {
        let mut agent = AgentRecord::new("alice", "Coder", "0.1.0");
        agent.description = "Writes code".to_string();
        agent.tags = vec!["code".to_string()];
        agent
    }

    fn selector(platform: Arc<FakePlatform>) -> AgentSelector {
        AgentSelector::new(platform, SelectorConfig::default())
    }

    #[tokio::test]
    async fn test_selects_named_agent() {
        let platform = Arc::new(FakePlatform::with_agents(vec![coder()]));
        platform.push_completion(Ok(r#"{"selected_agent_name":"Coder","selected_agent_namespace":"alice","relevance_score":90,"reasoning":"matches"}"#.to_string()));

        let selection = selector(platform.clone()).select("write me a parser").await.unwrap();
        assert_eq!(selection.agent, coder());
        assert_eq!(selection.score, 90);
        assert_eq!(selection.reasoning, "matches");
    }

    #[tokio::test]
    async fn test_unknown_agent_is_no_match() {
        let platform = Arc::new(FakePlatform::with_agents(vec![coder()]));
        platform.push_completion(Ok(r#"{"selected_agent_name":"Ghost","selected_agent_namespace":"bob","relevance_score":99,"reasoning":"trust me"}"#.to_string()));

        let err = selector(platform).select("anything").await.unwrap_err();
        assert!(matches!(err, SelectionError::NoMatch { ref name, .. } if name == "Ghost"));
    }

    #[tokio::test]
    async fn test_namespace_must_match_too() {
        let platform = Arc::new(FakePlatform::with_agents(vec![coder()]));
        platform.push_completion(Ok(
            r#"{"selected_agent_name":"Coder","selected_agent_namespace":"mallory"}"#.to_string(),
        ));

        let err = selector(platform).select("code").await.unwrap_err();
        assert!(matches!(err, SelectionError::NoMatch { .. }));
    }

    #[tokio::test]
    async fn test_completion_failure_is_reported() {
        let platform = Arc::new(FakePlatform::with_agents(vec![coder()]));
        platform.push_completion(Err(PlatformError::Api {
            status: 503,
            message: "overloaded".into(),
        }));

        let err = selector(platform).select("code").await.unwrap_err();
        assert!(matches!(err, SelectionError::Completion(_)));
    }

    #[tokio::test]
    async fn test_catalog_failure_skips_completion() {
        let platform = Arc::new(FakePlatform::default());
        *platform.agents.lock().unwrap() =
            Some(Err(PlatformError::Unavailable("dns".into())));

        let err = selector(platform.clone()).select("code").await.unwrap_err();
        assert!(matches!(err, SelectionError::Catalog(_)));
        assert_eq!(platform.count(|c| matches!(c, Call::Completion { .. })), 0);
    }

    #[tokio::test]
    async fn test_empty_catalog() {
        let platform = Arc::new(FakePlatform::with_agents(Vec::new()));
        let err = selector(platform).select("code").await.unwrap_err();
        assert!(matches!(err, SelectionError::EmptyCatalog));
    }

    #[tokio::test]
    async fn test_prompt_and_budget_sent() {
        let platform = Arc::new(FakePlatform::with_agents(vec![coder()]));
        platform.push_completion(Ok("not json".to_string()));

        let _ = selector(platform.clone()).select("parse yaml").await;
        let calls = platform.calls();
        let Call::Completion { prompt, max_tokens } = &calls[1] else {
            panic!("Expected Completion, got {:?}", calls[1]);
        };
        assert_eq!(*max_tokens, 555);
        assert!(prompt.contains("User Query: parse yaml"));
        assert!(prompt.contains("Name: Coder"));
    }

    #[test]
    fn test_prompt_lists_every_field() {
        let mut agent = coder();
        agent.updated = "2024-11-02T10:15:00Z".to_string();
        agent.num_stars = 7;
        agent
            .details
            .insert("model".to_string(), serde_json::json!("qwen"));
        let other = AgentRecord::new("bob", "Writer", "2");

        let prompt = build_prompt("help", &[agent, other]);
        assert!(prompt.contains("Agent 1:\n  Name: Coder\n  Namespace: alice\n  Version: 0.1.0"));
        assert!(prompt.contains("  Description: Writes code\n  Tags: code\n"));
        assert!(prompt.contains("  Last Updated: 2024-11-02T10:15:00Z\n  Stars: 7\n"));
        assert!(prompt.contains("\"model\": \"qwen\""));
        assert!(prompt.contains("Agent 2:\n  Name: Writer\n  Namespace: bob"));
        assert!(prompt.contains("\"selected_agent_namespace\""));
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        for raw in ["", "Sure! The best agent is Coder.", "{\"selected_agent_name\": ", "[\"Coder\", \"alice\"]"] {
            let err = parse_response(raw).unwrap_err();
            let SelectionError::Malformed { raw: kept, .. } = err else {
                panic!("Expected Malformed for {:?}", raw);
            };
            assert_eq!(kept, raw);
        }
    }

    #[test]
    fn test_parse_requires_name_and_namespace() {
        assert!(parse_response(r#"{"selected_agent_name":"Coder"}"#).is_err());
        assert!(parse_response(r#"{"selected_agent_namespace":"alice"}"#).is_err());
    }

    #[test]
    fn test_parse_defaults_score_and_reasoning() {
        let verdict =
            parse_response(r#"{"selected_agent_name":"Coder","selected_agent_namespace":"alice"}"#)
                .unwrap();
        assert_eq!(verdict.score, 0);
        assert_eq!(verdict.reasoning, "");

        let verdict = parse_response(
            r#"{"selected_agent_name":"Coder","selected_agent_namespace":"alice","relevance_score":null,"reasoning":null}"#,
        )
        .unwrap();
        assert_eq!(verdict.score, 0);
        assert_eq!(verdict.reasoning, "");
    }

    #[test]
    fn test_parse_normalizes_score() {
        let score = |s: &str| {
            parse_response(&format!(
                r#"{{"selected_agent_name":"a","selected_agent_namespace":"b","relevance_score":{}}}"#,
                s
            ))
            .map(|v| v.score)
        };
        assert_eq!(score("87.6").unwrap(), 88);
        assert_eq!(score("\"75\"").unwrap(), 75);
        assert_eq!(score("250").unwrap(), 100);
        assert_eq!(score("-3").unwrap(), 0);
        assert!(score("\"high\"").is_err());
        assert!(score("[1]").is_err());
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        let verdict = parse_response(
            "\n  {\"selected_agent_name\":\"Coder\",\"selected_agent_namespace\":\"alice\"}\n",
        )
        .unwrap();
        assert_eq!(verdict.name, "Coder");
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let mut newer = coder();
        newer.version = "0.2.0".to_string();
        let agents = vec![coder(), newer];
        let verdict = Verdict {
            name: "Coder".into(),
            namespace: "alice".into(),
            score: 50,
            reasoning: String::new(),
        };
        let selection = resolve(verdict, &agents).unwrap();
        assert_eq!(selection.agent.version, "0.1.0");
    }
}
