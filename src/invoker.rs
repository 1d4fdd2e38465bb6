//! Starting agent runs

use crate::config::DEFAULT_MODEL;
use crate::platform::{Platform, PlatformResult, RunAgent, ThreadId};

/// Version string that makes the platform pick the newest published version
pub const LATEST: &str = "latest";

/// Start `agent_name` owned by `owner` and return the thread it runs on.
///
/// `model` falls back to [`DEFAULT_MODEL`]. Failures are returned unchanged.
pub async fn run_agent(
    platform: &dyn Platform,
    owner: &str,
    agent_name: &str,
    version: &str,
    query: Option<&str>,
    model: Option<&str>,
    fork_thread: bool,
) -> PlatformResult<ThreadId> {
    let request = RunAgent {
        owner: owner.to_string(),
        agent_name: agent_name.to_string(),
        version: version.to_string(),
        query: query.map(str::to_string),
        model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        fork_thread,
    };
    platform.run_agent(&request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::fake::{Call, FakePlatform};
    use crate::platform::PlatformError;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_run_defaults_model() {
        let platform = FakePlatform::default();
        platform.push_run(Ok(ThreadId::new("thread_42")));

        let thread = run_agent(&platform, "alice", "Coder", LATEST, Some("build it"), None, false)
            .await
            .unwrap();
        assert_eq!(thread.as_str(), "thread_42");

        assert_eq!(
            platform.calls(),
            vec![Call::RunAgent(RunAgent {
                owner: "alice".into(),
                agent_name: "Coder".into(),
                version: "latest".into(),
                query: Some("build it".into()),
                model: DEFAULT_MODEL.into(),
                fork_thread: false,
            })]
        );
    }

    #[tokio::test]
    async fn test_run_with_explicit_model_and_fork() {
        let platform = FakePlatform::default();

        run_agent(&platform, "alice", "Coder", "0.1.0", None, Some("qwen-72b"), true)
            .await
            .unwrap();

        let calls = platform.calls();
        let Call::RunAgent(request) = &calls[0] else {
            panic!("Expected RunAgent");
        };
        assert_eq!(request.model, "qwen-72b");
        assert_eq!(request.version, "0.1.0");
        assert!(request.fork_thread);
        assert_eq!(request.query, None);
    }

    #[tokio::test]
    async fn test_run_failure_propagates() {
        let platform = FakePlatform::default();
        platform.push_run(Err(PlatformError::Api {
            status: 404,
            message: "agent not found".into(),
        }));

        let err = run_agent(&platform, "alice", "Gone", LATEST, None, None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Api { status: 404, .. }));
    }
}
