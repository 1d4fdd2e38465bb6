//! Following an agent's thread
//!
//! The monitor polls the thread once per interval and prints every message it
//! has not printed before. Once the thread has produced something and then
//! gone quiet for longer than the inactivity threshold, the user is asked for
//! a reply, which is appended to the thread. The whole run is bounded by a
//! maximum wait.
//!
//! All bookkeeping lives in [`MonitorSession`], which takes the current time
//! as an argument so it can be exercised without a clock.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use tokio::time::Instant;

use crate::config::MonitorConfig;
use crate::console::{self, Console};
use crate::platform::{Platform, ThreadId, ThreadMessage};

/// Substrings marking platform chatter that is never shown
const NOISE_MARKERS: &[&str] = &["Debugging status_update", "status_update in incorrect format"];

/// Content shorter than this (after trimming) is never shown
const MIN_CONTENT_CHARS: usize = 5;

const RULE_WIDTH: usize = 50;

const REPLY_PROMPT: &str = "\nEnter your response (or 'quit' to return to main prompt): ";

/// Where a monitor run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Nothing has appeared on the thread yet
    WaitingForFirstMessage,
    /// Messages have appeared and the thread is not idle
    Active,
    /// The thread has been quiet longer than the inactivity threshold
    IdlePrompt,
    /// The maximum wait has elapsed
    Done,
}

/// How a monitor run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// The maximum wait elapsed
    Completed,
    /// The user asked to go back to the main prompt
    Quit,
}

/// Bookkeeping for one monitor run
#[derive(Debug)]
pub struct MonitorSession {
    started: Instant,
    last_activity: Instant,
    last_count: usize,
    printed: HashSet<String>,
}

impl MonitorSession {
    pub fn new(now: Instant) -> Self {
        Self {
            started: now,
            last_activity: now,
            last_count: 0,
            printed: HashSet::new(),
        }
    }

    /// Take in the thread's full message list and return the messages to print.
    ///
    /// Nothing happens unless the list grew since the last call. Content that
    /// was printed before is never returned again, and noise is dropped.
    pub fn observe(&mut self, messages: &[ThreadMessage], now: Instant) -> Vec<ThreadMessage> {
        if messages.len() <= self.last_count {
            return Vec::new();
        }

        let mut fresh = Vec::new();
        for message in messages {
            if self.printed.contains(&message.content) || is_noise(&message.content) {
                continue;
            }
            self.printed.insert(message.content.clone());
            fresh.push(message.clone());
        }

        self.last_count = messages.len();
        self.last_activity = now;
        fresh
    }

    /// Reset the inactivity timer
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    /// Whether the thread has ever had messages
    pub fn has_messages(&self) -> bool {
        self.last_count > 0
    }

    pub fn is_idle(&self, now: Instant, threshold: Duration) -> bool {
        self.has_messages() && now.saturating_duration_since(self.last_activity) > threshold
    }

    pub fn is_expired(&self, now: Instant, max_wait: Duration) -> bool {
        now.saturating_duration_since(self.started) >= max_wait
    }

    pub fn state(&self, now: Instant, config: &MonitorConfig) -> MonitorState {
        if self.is_expired(now, config.max_wait()) {
            MonitorState::Done
        } else if self.is_idle(now, config.inactivity()) {
            MonitorState::IdlePrompt
        } else if self.has_messages() {
            MonitorState::Active
        } else {
            MonitorState::WaitingForFirstMessage
        }
    }
}

/// Whether message content is platform chatter rather than output
pub fn is_noise(content: &str) -> bool {
    NOISE_MARKERS.iter().any(|marker| content.contains(marker))
        || content.trim().chars().count() < MIN_CONTENT_CHARS
}

/// Render a message for the terminal
pub fn format_message(message: &ThreadMessage) -> String {
    let rule = "-".repeat(RULE_WIDTH);
    format!(
        "\n🔷 {}\n{}\n{}\n{}",
        message.role.to_uppercase(),
        rule,
        message.content,
        rule
    )
}

enum Reply {
    Sent,
    Skipped,
    Quit,
}

/// Follow `thread` until the maximum wait elapses or the user quits
pub async fn monitor_thread(
    platform: &dyn Platform,
    console: &dyn Console,
    thread: &ThreadId,
    config: &MonitorConfig,
) -> MonitorOutcome {
    let mut session = MonitorSession::new(Instant::now());
    console.print("\n🕵️ Monitoring agent thread...");
    tracing::info!("Monitoring thread {}", thread);

    loop {
        if session.state(Instant::now(), config) == MonitorState::Done {
            break;
        }

        match platform.list_messages(thread).await {
            Ok(messages) => {
                for message in session.observe(&messages, Instant::now()) {
                    console.print(&format_message(&message));
                }
            }
            Err(e) => tracing::warn!("Failed to list messages on {}: {}", thread, e),
        }

        if session.state(Instant::now(), config) == MonitorState::IdlePrompt {
            match prompt_reply(platform, console, thread).await {
                Ok(Reply::Quit) => {
                    tracing::info!("User left thread {}", thread);
                    return MonitorOutcome::Quit;
                }
                Ok(Reply::Sent) | Ok(Reply::Skipped) => session.touch(Instant::now()),
                Err(e) => {
                    tracing::warn!("User input request failed: {:#}", e);
                    console.print(&format!("Error requesting user input: {:#}", e));
                }
            }
        }

        tokio::time::sleep(config.poll_interval()).await;
    }

    console.print("\n🏁 Agent run complete.");
    MonitorOutcome::Completed
}

/// Ask the user for a reply and relay it into the thread
async fn prompt_reply(
    platform: &dyn Platform,
    console: &dyn Console,
    thread: &ThreadId,
) -> Result<Reply> {
    platform.request_user_input(thread).await?;

    let Some(input) = console.read_line(REPLY_PROMPT).await? else {
        return Ok(Reply::Quit);
    };
    if console::is_quit(&input) {
        return Ok(Reply::Quit);
    }
    if input.trim().is_empty() {
        return Ok(Reply::Skipped);
    }

    platform.add_reply(thread, &input).await?;
    tracing::debug!("Relayed reply to {}", thread);
    Ok(Reply::Sent)
}
