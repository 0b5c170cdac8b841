//! Scrivener command-line entry point

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scrivener")]
#[command(about = "Evaluate, proofread and improve technical blog articles", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Configuration file (TOML)
    #[arg(short, long, env = "SCRIVENER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one or more articles
    Evaluate {
        /// Markdown files to evaluate
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Append the evaluations to the evaluation history
        #[arg(long)]
        record: bool,

        /// Print the evaluation records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run one improvement cycle over the most recent posts
    Improve,

    /// Proofread an article
    Proofread {
        /// Markdown file to proofread
        file: PathBuf,

        /// Write auto-corrections back to the file
        #[arg(long)]
        apply: bool,
    },

    /// Generate the evolution report
    Report {
        /// Also print the Markdown report to stdout
        #[arg(long)]
        print: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: cli::config::ConfigAction,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::new(format!(
        "scrivener={},scrivener_core={}",
        level.as_str().to_lowercase(),
        level.as_str().to_lowercase()
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("Scrivener v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = cli::helpers::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Evaluate {
            files,
            record,
            json,
        } => cli::evaluate::handle(&config, files, record, json).await,
        Commands::Improve => cli::improve::handle(config).await,
        Commands::Proofread { file, apply } => cli::proofread::handle(&config, file, apply).await,
        Commands::Report { print } => cli::report::handle(&config, print).await,
        Commands::Config { action } => cli::config::handle(action, &config).await,
    }
}
