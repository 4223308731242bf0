//! Config commands
//!
//! # Usage
//!
//! ```bash
//! logship config check configs/logship.toml
//! logship --config configs/logship.toml config check
//! LOGSHIP_INDEX_SHARDS=3 logship config check configs/logship.toml
//! ```
//!
//! The check covers the file plus any `LOGSHIP_*` environment overrides.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use logship_config::Config;
use owo_colors::OwoColorize;

/// Config commands
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Load and validate a config file
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Config file to check (default: the global --config)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,
}

pub async fn run(args: ConfigArgs, config_path: Option<&Path>) -> Result<()> {
    match args.command {
        ConfigCommand::Check(args) => check(args, config_path),
    }
}

fn check(args: CheckArgs, config_path: Option<&Path>) -> Result<()> {
    let Some(path) = args.path.as_deref().or(config_path) else {
        anyhow::bail!("no config file given (pass a path or --config)");
    };

    print!("Checking {}... ", path.display());
    let (config, overrides) = match load_checked(path) {
        Ok(loaded) => {
            println!("{}", "✓".green());
            loaded
        }
        Err(e) => {
            println!("{}", "✗".red());
            println!("  {}", e.to_string().red());
            return Err(e.into());
        }
    };

    println!();
    for line in summary(&config) {
        println!("{}", line);
    }
    if !overrides.is_empty() {
        println!("Overrides     {}", overrides.join(", ").yellow());
    }
    Ok(())
}

/// Load `path`, apply `LOGSHIP_*` overrides and validate the result
fn load_checked(path: &Path) -> logship_config::Result<(Config, Vec<String>)> {
    let mut config = Config::from_file(path)?;
    let overrides = config.apply_env()?;
    config.validate()?;
    Ok((config, overrides))
}

/// One line per setting that matters at startup
fn summary(config: &Config) -> Vec<String> {
    let bus = &config.bus;
    let index = &config.index;
    let follow = &config.follow;

    vec![
        format!("Log           {} ({:?})", config.log.level.as_str(), config.log.format),
        format!("Brokers       {}", bus.brokers.join(", ")),
        format!("Indexer group {} on /{}/", bus.group_id, bus.topic_pattern),
        format!(
            "Consumer      {}, {}, batch {}",
            bus.offsets_initial,
            bus.balance_strategy,
            if bus.batch_mode {
                bus.batch_max.to_string()
            } else {
                "off".to_string()
            }
        ),
        if index.enabled {
            format!(
                "Index         {} on {} ({} shards, {} replicas)",
                index.index_name,
                index.urls.join(", "),
                index.shards,
                index.replicas
            )
        } else {
            "Index         disabled".to_string()
        },
        format!(
            "Follow        {} (batch {} of max {})",
            follow.topic, follow.default_batch_size, follow.max_batch_size
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_summary_defaults() {
        let lines = summary(&Config::default());
        assert!(lines.iter().any(|l| l.contains("localhost:9092")));
        assert!(lines.iter().any(|l| l.contains("logship-logs")));
        assert!(lines.iter().any(|l| l.contains("newest, range, batch 500")));
    }

    #[test]
    fn test_summary_disabled_index() {
        let config = Config::from_str("[index]\nenabled = false").unwrap();
        assert!(summary(&config).iter().any(|l| l.ends_with("disabled")));
    }

    #[test]
    fn test_load_checked_rejects_unsafe_index_name() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[index]\nindex_name = \"logs/_doc\"\n").unwrap();

        let err = load_checked(file.path()).unwrap_err();
        assert!(err.to_string().contains("index_name"));
    }

    #[test]
    fn test_check_requires_a_path() {
        let args = CheckArgs { path: None };
        assert!(check(args, None).is_err());
    }
}
