mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use second_me::config::SecondMeConfig;

#[derive(Parser)]
#[command(name = "second-me", version, about = "Ask questions about your own dated logs")]
struct Cli {
    /// Config file (defaults to ~/.second-me/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create today's log templates
    Init,
    /// Rebuild the semantic index over all logs
    Index,
    /// Ask a question with the most relevant log as context
    Ask {
        #[arg(required = true)]
        prompt: Vec<String>,
    },
    /// Summarize today's chat log
    Summarize,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Check configuration, model files, and index state
    Doctor,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model into the model cache
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SecondMeConfig::load_from(path)?,
        None => SecondMeConfig::load()?,
    };

    // stdout carries answers; diagnostics go to stderr.
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Init => cli::init::init(&config)?,
        Command::Index => cli::index::index(&config)?,
        Command::Ask { prompt } => cli::ask::ask(&config, &prompt.join(" ")).await?,
        Command::Summarize => cli::summarize::summarize(&config).await?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
