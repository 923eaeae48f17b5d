use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for hierarchos
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Session admission configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Controller and convergence tuning
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Session store configuration
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Session admission configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Admission ceiling: maximum concurrently active sessions
    #[serde(default = "default_max_concurrent_sessions")]
    pub max_concurrent_sessions: usize,

    /// Minutes after which a still-active stored session is considered stale
    #[serde(default = "default_session_timeout_minutes")]
    pub session_timeout_minutes: u64,
}

const fn default_max_concurrent_sessions() -> usize {
    10
}

const fn default_session_timeout_minutes() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sessions: default_max_concurrent_sessions(),
            session_timeout_minutes: default_session_timeout_minutes(),
        }
    }
}

/// Controller and convergence tuning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReasoningConfig {
    #[serde(default)]
    pub h_controller: StrategicControllerConfig,

    #[serde(default)]
    pub l_controller: ExecutionControllerConfig,

    #[serde(default)]
    pub convergence: ConvergenceConfig,
}

/// Strategic (H) controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StrategicControllerConfig {
    /// Default bound on outer-loop rounds (1-50)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Confidence below which analysis flags a run as low-confidence
    #[serde(default = "default_min_confidence_threshold")]
    pub min_confidence_threshold: f64,
}

const fn default_max_iterations() -> u32 {
    10
}

const fn default_min_confidence_threshold() -> f64 {
    0.7
}

impl Default for StrategicControllerConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            min_confidence_threshold: default_min_confidence_threshold(),
        }
    }
}

/// Execution (L) controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExecutionControllerConfig {
    /// Default refinement cycles per goal attempt (3-20)
    #[serde(default = "default_max_cycles_per_h")]
    pub max_cycles_per_h: u32,

    /// Lower bound accepted for per-request cycle counts
    #[serde(default = "default_min_cycles_per_h")]
    pub min_cycles_per_h: u32,

    /// Hard ceiling on cycles in a single invocation, independent of requests
    #[serde(default = "default_hard_cycle_ceiling")]
    pub hard_cycle_ceiling: u32,
}

const fn default_max_cycles_per_h() -> u32 {
    6
}

const fn default_min_cycles_per_h() -> u32 {
    3
}

const fn default_hard_cycle_ceiling() -> u32 {
    1000
}

impl Default for ExecutionControllerConfig {
    fn default() -> Self {
        Self {
            max_cycles_per_h: default_max_cycles_per_h(),
            min_cycles_per_h: default_min_cycles_per_h(),
            hard_cycle_ceiling: default_hard_cycle_ceiling(),
        }
    }
}

/// Convergence detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConvergenceConfig {
    /// Default confidence required for global convergence
    #[serde(default = "default_global_threshold")]
    pub global_threshold: f64,

    /// Stability threshold used by the execution controller
    #[serde(default = "default_local_threshold")]
    pub local_threshold: f64,

    /// Minimum history length before local convergence can hold
    #[serde(default = "default_min_iterations")]
    pub min_iterations: usize,

    /// Number of trailing values that must agree
    #[serde(default = "default_stability_window")]
    pub stability_window: usize,

    /// Decisions averaged by the early-termination check
    #[serde(default = "default_no_progress_limit")]
    pub no_progress_limit: usize,
}

const fn default_global_threshold() -> f64 {
    0.85
}

const fn default_local_threshold() -> f64 {
    0.90
}

const fn default_min_iterations() -> usize {
    3
}

const fn default_stability_window() -> usize {
    3
}

const fn default_no_progress_limit() -> usize {
    3
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            global_threshold: default_global_threshold(),
            local_threshold: default_local_threshold(),
            min_iterations: default_min_iterations(),
            stability_window: default_stability_window(),
            no_progress_limit: default_no_progress_limit(),
        }
    }
}

/// Session store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PersistenceConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Finished sessions older than this are purged
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Interval between background purges while serving
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_database_path() -> String {
    ".hierarchos/hierarchos.db".to_string()
}

const fn default_retention_days() -> u32 {
    7
}

const fn default_cleanup_interval_secs() -> u64 {
    3600
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            retention_days: default_retention_days(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl PersistenceConfig {
    /// `SQLite` connection URL for the configured path
    pub fn database_url(&self) -> String {
        if self.database_path.starts_with("sqlite:") {
            self.database_path.clone()
        } else {
            format!("sqlite:{}", self.database_path)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation policy for file logs: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_adds_scheme() {
        let config = PersistenceConfig::default();
        assert_eq!(config.database_url(), "sqlite:.hierarchos/hierarchos.db");

        let explicit = PersistenceConfig {
            database_path: "sqlite::memory:".to_string(),
            ..Default::default()
        };
        assert_eq!(explicit.database_url(), "sqlite::memory:");
    }
}
