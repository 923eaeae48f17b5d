//! CLI command implementations.

pub mod analyze;
pub mod decompose;
pub mod reason;
pub mod serve;
pub mod sessions;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::sqlite::{initialize_database, SqliteSessionRepository};
use crate::domain::models::Config;
use crate::services::{ReasoningService, SessionPool};

/// Open the configured session store and wire the reasoning service over it.
pub async fn open_service(config: &Config) -> Result<Arc<ReasoningService<SqliteSessionRepository>>> {
    let pool = initialize_database(&config.persistence.database_url())
        .await
        .context("Failed to initialize session store")?;

    let repository = Arc::new(SqliteSessionRepository::new(pool));
    let sessions = Arc::new(SessionPool::new(
        repository,
        config.server.max_concurrent_sessions,
    ));
    Ok(Arc::new(ReasoningService::new(sessions, config.clone())))
}
