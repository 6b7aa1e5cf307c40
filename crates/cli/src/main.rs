//! Startup Navigator CLI
//!
//! Main entry point for the navigator command-line tool: build the book
//! vector index, search it, and get book recommendations for startup problems.

mod commands;

use clap::{Parser, Subcommand};
use commands::{BuildIndexCommand, InitCommand, RecommendCommand, SearchCommand, WizardCommand};
use navigator_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Startup Navigator - book recommendations for founders
#[derive(Parser, Debug)]
#[command(name = "navigator")]
#[command(about = "Retrieval-augmented book recommendations for startup founders", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "NAVIGATOR_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "NAVIGATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider for recommendations (openai, ollama)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// LLM model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default config file into the workspace
    Init(InitCommand),

    /// Embed the book catalog and persist the vector store
    BuildIndex(BuildIndexCommand),

    /// Show the catalog entries most similar to a problem description
    Search(SearchCommand),

    /// Recommend one book for a growth stage, challenge and problem
    Recommend(RecommendCommand),

    /// Interactive recommendation session
    Wizard(WizardCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load(cli.workspace, cli.config)?.with_overrides(
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Startup Navigator starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!(
        "LLM: {}/{}, embeddings: {}/{}",
        config.llm.provider,
        config.llm.model,
        config.embedding.provider,
        config.embedding.model
    );

    config.validate()?;

    if config.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let command_name = match &cli.command {
        Commands::Init(_) => "init",
        Commands::BuildIndex(_) => "build-index",
        Commands::Search(_) => "search",
        Commands::Recommend(_) => "recommend",
        Commands::Wizard(_) => "wizard",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Init(cmd) => cmd.execute(&config),
        Commands::BuildIndex(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Recommend(cmd) => cmd.execute(&config).await,
        Commands::Wizard(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
