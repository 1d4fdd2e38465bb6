//! Interactive query loop
//!
//! Reads a request, shows the best matching agent, and on confirmation runs
//! it and follows its thread before prompting again.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::console::{self, Console};
use crate::invoker::{self, LATEST};
use crate::monitor;
use crate::platform::Platform;
use crate::selector::{AgentSelector, Selection, SelectionError};

const QUERY_PROMPT: &str = "\nWhat do you need an agent to do? (or 'quit' to exit): ";
const CONFIRM_PROMPT: &str = "\nWould you like to call this agent? (y/n): ";

/// Consecutive failed query reads before the shell gives up
const MAX_READ_FAILURES: u32 = 3;

pub struct Shell {
    platform: Arc<dyn Platform>,
    console: Arc<dyn Console>,
    selector: AgentSelector,
    config: Config,
}

impl Shell {
    pub fn new(platform: Arc<dyn Platform>, console: Arc<dyn Console>, config: Config) -> Self {
        let selector = AgentSelector::new(platform.clone(), config.selector.clone());
        Self {
            platform,
            console,
            selector,
            config,
        }
    }

    /// Prompt for queries until the user quits or input ends.
    ///
    /// A failure to start an agent ends the loop with an error, as does a
    /// console that keeps failing to read.
    pub async fn run(&self) -> Result<()> {
        let mut read_failures = 0;
        loop {
            let line = match self.console.read_line(QUERY_PROMPT).await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    read_failures += 1;
                    tracing::warn!("Failed to read query: {:#}", e);
                    self.console.print(&format!("Error reading input: {:#}", e));
                    if read_failures >= MAX_READ_FAILURES {
                        return Err(e.context("Console input keeps failing"));
                    }
                    continue;
                }
            };
            read_failures = 0;
            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if console::is_quit(query) {
                break;
            }

            self.handle_query(query).await?;
        }
        Ok(())
    }

    /// Find, show, and optionally run the best agent for one query
    pub async fn handle_query(&self, query: &str) -> Result<()> {
        let selection = match self.selector.select(query).await {
            Ok(selection) => selection,
            Err(e) => {
                self.report(&e);
                self.console
                    .print("\nNo suitable agents found. Please try a different query.");
                return Ok(());
            }
        };

        self.console.print(&format_selection(&selection));

        if !self.confirm().await {
            return Ok(());
        }

        let agent = &selection.agent;
        self.console.print("\nCalling agent...");
        let thread = invoker::run_agent(
            self.platform.as_ref(),
            &agent.namespace,
            &agent.name,
            LATEST,
            Some(query),
            Some(&self.config.invoke.default_model),
            self.config.invoke.fork_thread,
        )
        .await
        .with_context(|| format!("Failed to start agent {}", agent.full_name()))?;
        self.console
            .print(&format!("🤖 Agent started in thread: {}", thread));

        monitor::monitor_thread(
            self.platform.as_ref(),
            self.console.as_ref(),
            &thread,
            &self.config.monitor,
        )
        .await;

        self.console.print("\nReturned to main prompt.");
        Ok(())
    }

    /// Whether to run the shown agent. Unreadable answers count as no.
    async fn confirm(&self) -> bool {
        if self.config.invoke.auto_confirm {
            return true;
        }
        match self.console.read_line(CONFIRM_PROMPT).await {
            Ok(answer) => answer.is_some_and(|a| a.trim().to_lowercase().starts_with('y')),
            Err(e) => {
                tracing::warn!("Failed to read confirmation: {:#}", e);
                self.console.print(&format!("Error reading input: {:#}", e));
                false
            }
        }
    }

    fn report(&self, error: &SelectionError) {
        tracing::warn!("No agent selected: {}", error);
        self.console.print(&error.to_string());
        if let SelectionError::Malformed { raw, .. } = error {
            self.console.print(&format!("Raw response: {}", raw));
        }
    }
}

/// Render a selection for the terminal
pub fn format_selection(selection: &Selection) -> String {
    let agent = &selection.agent;
    let mut lines = vec![
        format!("\n🔹 Found agent: {}", agent.full_name()),
        format!("Version: {}", agent.version),
        format!("Score: {}", selection.score),
        format!("Description: {}", agent.description),
    ];

    if !agent.tags.is_empty() {
        lines.push(format!("Tags: {}", agent.tags.join(", ")));
    }

    let updated = match agent.updated_at() {
        Some(ts) => ts.format("%Y-%m-%d %H:%M UTC").to_string(),
        None => agent.updated.clone(),
    };
    lines.push(format!("Last Updated: {}", updated));
    lines.push(format!("Stars: {}", agent.num_stars));

    let details = serde_json::to_string_pretty(&agent.details).unwrap_or_else(|_| "{}".to_string());
    lines.push(format!("\nDetails:\n{}", details));

    lines.push(format!("\nReasoning: {}", selection.reasoning));

    lines.join("\n")
}
