//! Background session maintenance.
//!
//! While the tool server runs, a janitor periodically times out admitted
//! sessions that have outlived the session timeout and purges finished
//! sessions past the retention window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::domain::errors::DomainResult;
use crate::domain::models::Config;
use crate::domain::ports::SessionRepository;
use crate::services::session_pool::SessionPool;

/// Largest timeout `chrono::Duration` can represent in minutes. Cutoffs this
/// far back are unrepresentable, so nothing times out.
const MAX_TIMEOUT_MINUTES: i64 = i64::MAX / 60_000;

/// Maintenance schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JanitorConfig {
    pub interval: Duration,
    pub retention: chrono::Duration,
    pub session_timeout: chrono::Duration,
}

impl JanitorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            interval: Duration::from_secs(config.persistence.cleanup_interval_secs.max(1)),
            retention: chrono::Duration::days(i64::from(config.persistence.retention_days)),
            session_timeout: chrono::Duration::minutes(
                i64::try_from(config.server.session_timeout_minutes)
                    .unwrap_or(MAX_TIMEOUT_MINUTES)
                    .min(MAX_TIMEOUT_MINUTES),
            ),
        }
    }
}

/// Counts from one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub timed_out: usize,
    pub purged: u64,
}

pub struct SessionJanitor<R: SessionRepository> {
    pool: Arc<SessionPool<R>>,
    config: JanitorConfig,
    stop_flag: Arc<AtomicBool>,
}

/// Handle to a spawned janitor.
pub struct JanitorHandle {
    stop_flag: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl JanitorHandle {
    /// Stop the janitor and wait for its task to end.
    pub async fn stop(self) {
        self.stop_flag.store(true, Ordering::Release);
        self.task.abort();
        let _ = self.task.await;
    }
}

impl<R: SessionRepository + 'static> SessionJanitor<R> {
    pub fn new(pool: Arc<SessionPool<R>>, config: JanitorConfig) -> Self {
        Self {
            pool,
            config,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// One maintenance pass.
    pub async fn run_once(&self) -> DomainResult<MaintenanceReport> {
        let timed_out = self.pool.expire_stale(self.config.session_timeout).await?;
        let purged = self.pool.purge_expired(self.config.retention).await?;
        Ok(MaintenanceReport { timed_out, purged })
    }

    /// Run passes on the configured interval until stopped. The first pass
    /// runs immediately.
    pub fn spawn(self) -> JanitorHandle {
        let stop_flag = self.stop_flag.clone();
        let task = tokio::spawn(async move {
            let mut timer = interval(self.config.interval);
            loop {
                timer.tick().await;
                if self.stop_flag.load(Ordering::Acquire) {
                    break;
                }
                match self.run_once().await {
                    Ok(report) => tracing::debug!(
                        timed_out = report.timed_out,
                        purged = report.purged,
                        "Session maintenance finished"
                    ),
                    Err(e) => tracing::warn!(error = %e, "Session maintenance failed"),
                }
            }
        });
        JanitorHandle { stop_flag, task }
    }
}
