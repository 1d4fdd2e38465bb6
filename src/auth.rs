//! Platform credentials

use anyhow::{Context, Result};

/// Environment variable holding the platform API key
pub const API_KEY_ENV: &str = "AGENT_SCOUT_API_KEY";

/// API key authentication for the platform
#[derive(Clone)]
pub struct ApiKey {
    key: String,
}

impl ApiKey {
    /// Create from an API key string
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Load the key from the environment
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(API_KEY_ENV)
            .with_context(|| format!("{} environment variable not set", API_KEY_ENV))?;
        Ok(Self::new(key))
    }

    /// Resolve the key: environment first, then the configured value
    pub fn resolve(configured: Option<&str>) -> Result<Self> {
        Self::resolve_from(std::env::var(API_KEY_ENV).ok().as_deref(), configured)
    }

    /// Pick between an environment value and a configured one.
    ///
    /// A blank value counts as unset, so `AGENT_SCOUT_API_KEY=` in a `.env`
    /// file does not hide the configured key.
    fn resolve_from(env: Option<&str>, configured: Option<&str>) -> Result<Self> {
        let present = |key: &&str| !key.trim().is_empty();
        let key = match env.filter(present).or(configured.filter(present)) {
            Some(key) => Self::new(key),
            None => anyhow::bail!(
                "No platform API key. Set {} or add `api_key` under [platform] in config.toml",
                API_KEY_ENV
            ),
        };
        key.validate()?;
        Ok(key)
    }

    /// Value for the `Authorization` header
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.key)
    }

    /// Reject keys that can never authenticate
    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            anyhow::bail!("API key is empty");
        }
        if self.key.chars().any(char::is_whitespace) {
            anyhow::bail!("API key must not contain whitespace");
        }
        Ok(())
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey").field("key", &"<redacted>").finish()
    }
}
