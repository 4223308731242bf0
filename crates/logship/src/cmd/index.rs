//! Index management commands
//!
//! # Usage
//!
//! ```bash
//! logship index init                               # ping, check, create if missing
//! logship index init --url http://es-1:9200 --url http://es-2:9200
//! logship index init --index flow-logs
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use logship_config::Config;
use logship_sinks::{ElasticsearchClient, ElasticsearchConfig, ensure_index};
use owo_colors::OwoColorize;

/// Index management commands
#[derive(Args, Debug)]
pub struct IndexArgs {
    #[command(subcommand)]
    pub command: IndexCommand,
}

#[derive(Subcommand, Debug)]
pub enum IndexCommand {
    /// Run the index startup sequence and exit
    Init(InitArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Search node URL, repeatable (overrides [index].urls)
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Index name (overrides [index].index_name)
    #[arg(long)]
    pub index: Option<String>,
}

pub async fn run(args: IndexArgs, config: Config) -> Result<()> {
    match args.command {
        IndexCommand::Init(args) => init(args, &config).await,
    }
}

async fn init(args: InitArgs, config: &Config) -> Result<()> {
    let index = &config.index;

    let urls = if args.urls.is_empty() {
        index.urls.clone()
    } else {
        args.urls
    };
    let name = args.index.unwrap_or_else(|| index.index_name.clone());

    let client = ElasticsearchClient::new(
        &ElasticsearchConfig::default()
            .with_urls(urls)
            .with_request_timeout(index.request_timeout),
    )?;

    println!();
    println!("{}", "logship index init".bold());
    println!("{}", "─".repeat(50));
    println!("Index         {}", name.cyan());
    println!("Nodes         {}", client.urls().join(", ").dimmed());
    println!("Shards        {}", index.shards);
    println!("Replicas      {}", index.replicas);
    println!("{}", "─".repeat(50));
    println!();

    print!("Checking index... ");
    match ensure_index(&client, &name, index.shards, index.replicas).await {
        Ok(true) => println!("{} (created)", "✓".green()),
        Ok(false) => println!("{} (already exists)", "✓".green()),
        Err(e) => {
            println!("{}", "✗".red());
            println!("  {}", e.to_string().red());
            return Err(e.into());
        }
    }

    Ok(())
}
