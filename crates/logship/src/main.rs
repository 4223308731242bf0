//! logship - ships log records from the bus into a search index
//!
//! # Usage
//!
//! ```bash
//! # Inspect raw records
//! logship parse records.log
//! tail -f raw.log | logship parse
//!
//! # Index a file through the full pipeline, following one instance
//! logship --config configs/logship.toml replay records.log --follow web-1
//!
//! # Create the index (ping, exists, create)
//! logship index init
//!
//! # Validate a config file
//! logship config check configs/logship.toml
//! ```

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use logship_config::{LogConfig, LogFormat, LogOutput};
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// logship - log shipping to a search index, with live follow
#[derive(Parser, Debug)]
#[command(name = "logship")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true, env = "LOGSHIP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config and LOGSHIP_LOG_LEVEL.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse raw records and print them as JSON lines
    Parse(cmd::parse::ParseArgs),

    /// Index a file of raw records through the index pipeline
    Replay(cmd::replay::ReplayArgs),

    /// Search index management
    Index(cmd::index::IndexArgs),

    /// Configuration tools
    Config(cmd::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Parse(args) => {
            // Parse doesn't need logging - just outputs to stdout
            cmd::parse::run(args).await
        }
        Command::Replay(args) => {
            let loaded = cmd::load_config(cli.config.as_deref())?;
            let log = loaded.config.log.for_stdout_data(args.prints_replies());
            init_logging(&resolve_log_level(cli.log_level.as_deref(), &log), &log)?;
            loaded.log_source();
            cmd::replay::run(args, loaded.config).await
        }
        Command::Index(args) => {
            let loaded = cmd::load_config(cli.config.as_deref())?;
            let log = loaded.config.log;
            init_logging(&resolve_log_level(cli.log_level.as_deref(), &log), &log)?;
            loaded.log_source();
            cmd::index::run(args, loaded.config).await
        }
        Command::Config(args) => {
            // Config check prints its own report
            cmd::config::run(args, cli.config.as_deref()).await
        }
    }
}

/// Resolve log level: CLI flag > config (file or environment) > default "info"
fn resolve_log_level(cli_level: Option<&str>, log: &LogConfig) -> String {
    match cli_level {
        Some(level) => level.to_string(),
        None => log.level.as_str().to_string(),
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str, log: &LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match (log.format, log.output) {
        (LogFormat::Console, LogOutput::Stdout) => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .boxed(),
        (LogFormat::Console, LogOutput::Stderr) => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_writer(std::io::stderr)
            .boxed(),
        (LogFormat::Json, LogOutput::Stdout) => fmt::layer().json().with_target(true).boxed(),
        (LogFormat::Json, LogOutput::Stderr) => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    Ok(())
}
