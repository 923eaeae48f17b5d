//! `serve`: the MCP stdio tool server.

use anyhow::{Context, Result};

use crate::adapters::mcp::StdioServer;
use crate::domain::models::Config;
use crate::services::{JanitorConfig, SessionJanitor};

pub async fn execute(config: &Config) -> Result<()> {
    let service = super::open_service(config).await?;

    let recovered = service
        .pool()
        .recover()
        .await
        .context("Failed to recover orphaned sessions")?;
    if recovered > 0 {
        tracing::warn!(recovered, "Timed out sessions left active by a previous run");
    }

    let janitor = SessionJanitor::new(service.pool().clone(), JanitorConfig::from_config(config))
        .spawn();

    let result = StdioServer::new(service).run().await;
    janitor.stop().await;
    result
}
