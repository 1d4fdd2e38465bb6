//! Agent catalog access

use crate::platform::{AgentRecord, ListAgentsQuery, Platform, PlatformResult};

/// Fetch every agent in the registry, latest version of each, in one page.
///
/// Nothing is cached; each call reflects the registry as it is now.
pub async fn fetch_agents(platform: &dyn Platform, limit: u32) -> PlatformResult<Vec<AgentRecord>> {
    let query = ListAgentsQuery::all_agents(limit);
    let agents = platform.list_agents(&query).await?;
    tracing::debug!("Fetched {} agents from registry", agents.len());
    Ok(agents)
}
