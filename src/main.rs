mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use memlog::config::{default_config_path, MemlogConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "memlog", version, about = "Personal memory log: embed what you browse, then ask about it")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Search stored events from the terminal
    Search {
        /// Natural language query
        query: String,
        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Ask a question about stored events
    Ask {
        /// The question
        question: String,
    },
    /// Check database health and configuration
    Doctor,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.memlog/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = MemlogConfig::load()?;

    // stdout is reserved for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &config.loaded_from {
        Some(path) => tracing::info!("loaded config from {}", path.display()),
        None => tracing::info!(
            "no config file at {}, using defaults",
            default_config_path().display()
        ),
    }

    match cli.command {
        Command::Serve => memlog::server::serve(config).await?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
        Command::Search { query, limit } => cli::search::search(&config, &query, limit).await?,
        Command::Ask { question } => cli::search::ask(&config, &question).await?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
