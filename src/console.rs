//! Terminal input and output

use std::io::Write;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Where the shell and monitor print to and read from
#[async_trait]
pub trait Console: Send + Sync {
    /// Print a block of text followed by a newline
    fn print(&self, text: &str);

    /// Show `prompt` and read one line. Returns `None` at end of input.
    async fn read_line(&self, prompt: &str) -> Result<Option<String>>;
}

/// Console on the process's stdin and stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

#[async_trait]
impl Console for StdConsole {
    fn print(&self, text: &str) {
        println!("{}", text);
    }

    async fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = std::io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            let read = std::io::stdin()
                .read_line(&mut line)
                .context("Failed to read from stdin")?;
            if read == 0 {
                return Ok(None);
            }
            let trimmed = line.trim_end_matches(['\n', '\r']).len();
            line.truncate(trimmed);
            Ok(Some(line))
        })
        .await
        .context("stdin reader panicked")?
    }
}

/// Whether `input` is the quit sentinel
pub fn is_quit(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("quit")
}

#[cfg(test)]
pub(crate) use scripted::ScriptedConsole;
