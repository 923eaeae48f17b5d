//! `sessions`: list and purge stored sessions.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::Cell;
use serde::Serialize;

use crate::cli::output::{list_table, output, truncate, CommandOutput};
use crate::domain::models::{Config, Session, SessionStatus};

#[derive(Args, Debug)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: SessionsCommands,
}

#[derive(Subcommand, Debug)]
pub enum SessionsCommands {
    /// List stored sessions, newest first
    List {
        /// Filter by status (active, completed, error, timeout)
        #[arg(short, long)]
        status: Option<String>,
        /// Maximum number of sessions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Delete finished sessions older than the retention window
    Purge {
        /// Retention in days (defaults to persistence.retention_days)
        #[arg(short, long)]
        days: Option<u32>,
    },
}

#[derive(Debug, Serialize)]
pub struct SessionOutput {
    pub id: String,
    pub status: String,
    pub confidence: Option<f64>,
    pub iterations: Option<u32>,
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Session> for SessionOutput {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id.to_string(),
            status: s.status.as_str().to_string(),
            confidence: s.final_solution.as_ref().map(|r| r.confidence_score),
            iterations: s.final_solution.as_ref().map(|r| r.total_iterations),
            error: s.error.clone(),
            created_at: s.created_at.to_rfc3339(),
            updated_at: s.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionListOutput {
    pub sessions: Vec<SessionOutput>,
    pub total: usize,
}

impl CommandOutput for SessionListOutput {
    fn to_human(&self) -> String {
        if self.sessions.is_empty() {
            return "No sessions found.".to_string();
        }

        let mut table = list_table(&["id", "status", "confidence", "iterations", "created"]);
        for s in &self.sessions {
            table.add_row(vec![
                Cell::new(&s.id),
                Cell::new(&s.status),
                Cell::new(s.confidence.map(|c| format!("{c:.2}")).unwrap_or_else(|| "-".into())),
                Cell::new(s.iterations.map(|i| i.to_string()).unwrap_or_else(|| "-".into())),
                Cell::new(truncate(&s.created_at, 19)),
            ]);
        }
        format!("{} session(s):\n{table}", self.total)
    }
}

#[derive(Debug, Serialize)]
pub struct PurgeOutput {
    pub purged: u64,
    pub retention_days: u32,
}

impl CommandOutput for PurgeOutput {
    fn to_human(&self) -> String {
        format!(
            "Purged {} session(s) older than {} day(s)",
            self.purged, self.retention_days
        )
    }
}

pub async fn execute(config: &Config, args: SessionsArgs, json_mode: bool) -> Result<()> {
    let service = super::open_service(config).await?;
    let pool = service.pool();

    match args.command {
        SessionsCommands::List { status, limit } => {
            let status = status
                .map(|s| {
                    SessionStatus::from_str(&s)
                        .ok_or_else(|| anyhow::anyhow!("Invalid status: {s}"))
                })
                .transpose()?;
            let sessions = pool
                .list_sessions(status, limit)
                .await
                .context("Failed to list sessions")?;

            let out = SessionListOutput {
                total: sessions.len(),
                sessions: sessions.iter().map(SessionOutput::from).collect(),
            };
            output(&out, json_mode);
        }

        SessionsCommands::Purge { days } => {
            let retention_days = days.unwrap_or(config.persistence.retention_days);
            let purged = pool
                .purge_expired(chrono::Duration::days(i64::from(retention_days)))
                .await
                .context("Failed to purge sessions")?;
            output(&PurgeOutput { purged, retention_days }, json_mode);
        }
    }

    Ok(())
}
