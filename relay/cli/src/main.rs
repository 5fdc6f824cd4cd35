//! Relay - Chunked LLM Completions on the Terminal
//!
//! Sends a prompt to an OpenAI-compatible completion API and prints the
//! streamed answer as it arrives, one chunk at a time, word-wrapped to the
//! configured line length.
//!
//! # Usage
//!
//! ```bash
//! # One-shot prompt
//! relay "Explain backpressure in one paragraph"
//!
//! # Conversation: one prompt per stdin line, history is kept
//! relay --nick alice
//!
//! # Smaller, snappier chunks
//! relay --chunk-max 120 --chunk-delay-ms 500 "Tell me a story"
//!
//! # Verbose logging (to stderr)
//! RUST_LOG=debug relay "hello"
//! ```
//!
//! # Signals
//!
//! - `SIGINT`: abandon the current completion and exit

mod relay;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use relay_core::{default_config_path, load_config_from_path, ConfigOverrides, RelayConfig};

use relay::Relay;

/// Relay - print streamed LLM completions in sentence-sized chunks
#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Prompt to send; reads one prompt per line from stdin when omitted
    prompt: Vec<String>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "RELAY_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Identity checked against the configured admin list
    #[arg(short = 'n', long, env = "RELAY_NICK", default_value = "")]
    nick: String,

    /// Model override
    #[arg(short = 'm', long)]
    model: Option<String>,

    /// Chunk size limit in bytes
    #[arg(long, value_name = "BYTES")]
    chunk_max: Option<usize>,

    /// Idle time before a sentence-boundary flush
    #[arg(long, value_name = "MS")]
    chunk_delay_ms: Option<u64>,

    /// Wall-clock budget per completion
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Generation cap per completion
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "RELAY_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            model: self.model.clone(),
            chunk_max: self.chunk_max,
            chunk_delay_ms: self.chunk_delay_ms,
            client_timeout_secs: self.timeout_secs,
            max_tokens: self.max_tokens,
        }
    }
}

/// Initialize logging with the specified level
///
/// Logs go to stderr so stdout carries only completion text.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("relay={level},relay_core={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn load(args: &Args) -> Result<RelayConfig> {
    let path = args.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;
    args.overrides().apply(&mut config);
    config.validate().context("Invalid configuration")?;

    info!(
        source = %config.source(),
        model = %config.model,
        chunk_max = config.chunk_max,
        chunk_delay_ms = config.chunk_delay.as_millis() as u64,
        "Configuration loaded"
    );
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = load(&args)?;

    if !config.admins.is_admin(&args.nick) {
        warn!(nick = %args.nick, "Rejected non-admin identity");
        anyhow::bail!("'{}' is not allowed to use this relay", args.nick);
    }

    let mut relay = Relay::new(config);

    tokio::select! {
        result = async {
            if args.prompt.is_empty() {
                relay.run_interactive().await
            } else {
                relay.run_once(&args.prompt.join(" ")).await
            }
        } => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    }
}
