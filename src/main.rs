//! Hierarchos CLI entry point.

use anyhow::Result;
use clap::Parser;

use hierarchos::cli::commands::{analyze, decompose, reason, serve, sessions};
use hierarchos::cli::{handle_error, Cli, Commands};
use hierarchos::infrastructure::config::ConfigLoader;
use hierarchos::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&LogConfig::from(&config.logging))?;

    match cli.command {
        Commands::Reason {
            task,
            context,
            max_h,
            max_l,
            threshold,
        } => {
            let request =
                reason::build_request(&config, task, context.as_deref(), max_h, max_l, threshold)?;
            reason::execute(&config, request, cli.json).await
        }
        Commands::Decompose { task } => decompose::execute(&config, &task, cli.json).await,
        Commands::Analyze { session_id } => analyze::execute(&config, &session_id, cli.json).await,
        Commands::Sessions(args) => sessions::execute(&config, args, cli.json).await,
        Commands::Serve => serve::execute(&config).await,
    }
}
