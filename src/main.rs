use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agent_scout::{ApiKey, Config, HttpPlatform, Shell, StdConsole};

/// Agent Scout - find, run, and follow agents from the terminal
#[derive(Parser, Debug)]
#[command(name = "agent-scout")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Handle this one request and exit instead of prompting
    query: Option<String>,

    /// Config file (defaults to ~/.config/agent-scout/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Platform API base URL
    #[arg(long, env = "AGENT_SCOUT_BASE_URL")]
    base_url: Option<String>,

    /// Model passed to agents that are run
    #[arg(short, long)]
    model: Option<String>,

    /// Seconds to follow a thread before giving up
    #[arg(long)]
    max_wait: Option<u64>,

    /// Seconds of thread inactivity before asking for a reply
    #[arg(long)]
    inactivity: Option<u64>,

    /// Run the selected agent without asking
    #[arg(short, long)]
    yes: bool,

    /// Log file path
    #[arg(long, default_value = "/tmp/agent-scout.log")]
    log_file: PathBuf,
}

impl Args {
    /// Apply command line overrides on top of the loaded config
    fn apply(&self, config: &mut Config) {
        if let Some(ref base_url) = self.base_url {
            config.platform.base_url = base_url.clone();
        }
        if let Some(ref model) = self.model {
            config.invoke.default_model = model.clone();
        }
        if let Some(max_wait) = self.max_wait {
            config.monitor.max_wait_secs = max_wait;
        }
        if let Some(inactivity) = self.inactivity {
            config.monitor.inactivity_secs = inactivity;
        }
        if self.yes {
            config.invoke.auto_confirm = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up file-based logging so log lines never interleave with prompts
    let log_file = std::fs::File::create(&args.log_file)
        .with_context(|| format!("Failed to create log file: {}", args.log_file.display()))?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,agent_scout=debug")))
        .with(fmt::layer().with_writer(log_file).with_ansi(false))
        .init();

    // Load .env files (local first, then home directory)
    // Errors are ignored - files are optional
    let _ = dotenvy::from_filename(".env");
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".env"));
    }

    let mut config = match args.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    args.apply(&mut config);
    config.validate()?;

    let api_key = ApiKey::resolve(config.platform.api_key.as_deref())?;
    let platform = HttpPlatform::new(
        config.platform.base_url()?,
        api_key,
        &config.selector.model,
        config.platform.timeout(),
    )?;
    tracing::info!("Using platform at {}", config.platform.base_url);

    let shell = Shell::new(Arc::new(platform), Arc::new(StdConsole), config);
    match args.query {
        Some(ref query) => shell.handle_query(query.trim()).await,
        None => shell.run().await,
    }
}
