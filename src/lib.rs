//! Agent Scout - find the right agent for a task from the terminal
//!
//! Lists the agents published on an agent platform, asks an LLM which one
//! fits a request best, runs it, and follows the resulting thread.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use agent_scout::{ApiKey, AgentSelector, Config, HttpPlatform};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let platform = HttpPlatform::new(
//!         config.platform.base_url()?,
//!         ApiKey::from_env()?,
//!         &config.selector.model,
//!         config.platform.timeout(),
//!     )?;
//!
//!     let selector = AgentSelector::new(Arc::new(platform), config.selector.clone());
//!     match selector.select("summarize a github repository").await {
//!         Ok(selection) => println!("{} ({})", selection.agent.full_name(), selection.score),
//!         Err(e) => eprintln!("{}", e),
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod config;
pub mod console;
pub mod invoker;
pub mod monitor;
pub mod platform;
pub mod selector;
pub mod shell;

// Re-export the public API
pub use auth::ApiKey;
pub use config::Config;
pub use console::{Console, StdConsole};
pub use monitor::{monitor_thread, MonitorOutcome, MonitorSession};
pub use platform::{HttpPlatform, Platform, PlatformError};
pub use selector::{AgentSelector, Selection, SelectionError};
pub use shell::Shell;
