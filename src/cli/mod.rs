//! Command-line interface.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::commands::sessions::SessionsArgs;

#[derive(Parser, Debug)]
#[command(name = "hierarchos")]
#[command(about = "Hierarchical reasoning engine with an MCP tool server", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .hierarchos/
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a full hierarchical reasoning pass over a task
    Reason {
        /// Task to solve
        task: String,
        /// Extra context as a JSON object
        #[arg(long)]
        context: Option<String>,
        /// Maximum strategic rounds (1-50)
        #[arg(long = "max-h")]
        max_h: Option<u32>,
        /// Maximum refinement cycles per goal (3-20)
        #[arg(long = "max-l")]
        max_l: Option<u32>,
        /// Overall confidence required to converge (0.5-1.0)
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Show the goals a task decomposes into
    Decompose {
        /// Task to decompose
        task: String,
    },

    /// Analyze a completed session
    Analyze {
        /// Session ID
        session_id: String,
    },

    /// Inspect and maintain stored sessions
    Sessions(SessionsArgs),

    /// Serve the reasoning tools over MCP stdio
    Serve,
}

/// Report a command failure and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": format!("{err:#}"),
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_reason_flags() {
        let cli = Cli::parse_from([
            "hierarchos", "--json", "reason", "implement X", "--max-h", "3", "--threshold", "0.9",
        ]);
        assert!(cli.json);
        match cli.command {
            Commands::Reason { task, max_h, max_l, threshold, .. } => {
                assert_eq!(task, "implement X");
                assert_eq!(max_h, Some(3));
                assert_eq!(max_l, None);
                assert_eq!(threshold, Some(0.9));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
