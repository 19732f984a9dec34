//! Unified nodelink CLI.
//!
//! - `nodelink sync` - Keep this node in sync with its management panel
//! - `nodelink check` - Validate a config file and exit

use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// nodelink unified CLI.
#[derive(Parser)]
#[command(
    name = "nodelink",
    version,
    about = "Panel sync agent for multi-protocol proxy nodes",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the panel sync agent.
    #[command(name = "sync", alias = "run")]
    Sync(Box<nodelink_panel::SyncArgs>),

    /// Load and validate a config file.
    #[command(name = "check")]
    Check {
        /// Config file path.
        #[arg(short, long, default_value = "nodelink.toml")]
        config: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync(args) => nodelink_panel::cli::run(*args).await,
        Commands::Check { config } => nodelink::check_config(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
