//! Configuration loading and validation
//!
//! Settings live in `~/.config/agent-scout/config.toml`. Every section is
//! optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! [platform]
//! base_url = "https://api.near.ai/v1"
//!
//! [selector]
//! max_tokens = 555
//!
//! [monitor]
//! max_wait_secs = 888
//! inactivity_secs = 23
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Model used for completions and agent runs unless configured otherwise
pub const DEFAULT_MODEL: &str = "llama-v3p1-70b-instruct";

/// Main configuration structure loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub platform: PlatformConfig,
    pub selector: SelectorConfig,
    pub invoke: InvokeConfig,
    pub monitor: MonitorConfig,
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Config::default())
    }

    /// Load configuration from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Get the config directory path (~/.config/agent-scout)
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("agent-scout"))
    }

    /// Get the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("config.toml"))
    }

    /// Check values that deserialize fine but cannot work
    pub fn validate(&self) -> Result<()> {
        self.platform.base_url()?;
        if self.selector.max_tokens == 0 {
            anyhow::bail!("selector.max_tokens must be greater than zero");
        }
        if self.monitor.poll_interval_ms == 0 {
            anyhow::bail!("monitor.poll_interval_ms must be greater than zero");
        }
        Ok(())
    }
}

/// Where and how to reach the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub base_url: String,
    /// Used when AGENT_SCOUT_API_KEY is not set
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.near.ai/v1".to_string(),
            api_key: None,
            timeout_secs: 60,
        }
    }
}

impl PlatformConfig {
    /// Parsed base URL
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid platform.base_url: {}", self.base_url))?;
        if url.cannot_be_a_base() {
            anyhow::bail!("platform.base_url cannot be used as a base: {}", self.base_url);
        }
        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Agent ranking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Model used for the ranking completion
    pub model: String,
    /// Output budget for the ranking completion
    pub max_tokens: u32,
    /// Maximum number of registry entries considered
    pub catalog_limit: u32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 555,
            catalog_limit: 888,
        }
    }
}

/// Agent run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InvokeConfig {
    /// Model passed to the agent when the caller does not pick one
    pub default_model: String,
    /// Skip the y/n confirmation before running an agent
    pub auto_confirm: bool,
    pub fork_thread: bool,
}

impl Default for InvokeConfig {
    fn default() -> Self {
        Self {
            default_model: DEFAULT_MODEL.to_string(),
            auto_confirm: false,
            fork_thread: false,
        }
    }
}

/// Thread polling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Stop following the thread after this long
    pub max_wait_secs: u64,
    /// Prompt the user once the thread has been quiet this long
    pub inactivity_secs: u64,
    pub poll_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            max_wait_secs: 888,
            inactivity_secs: 23,
            poll_interval_ms: 1000,
        }
    }
}

impl MonitorConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn inactivity(&self) -> Duration {
        Duration::from_secs(self.inactivity_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
