use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Upper bound on `retention_days` (100 years).
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Upper bound on `session_timeout_minutes` (one year).
pub const MAX_SESSION_TIMEOUT_MINUTES: u64 = 525_600;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_concurrent_sessions: {0}. Must be at least 1")]
    InvalidConcurrency(usize),

    #[error("Invalid session_timeout_minutes: {0}. Must be between 1 and 525600")]
    InvalidSessionTimeout(u64),

    #[error("Invalid max_iterations: {0}. Must be between 1 and 50")]
    InvalidMaxIterations(u32),

    #[error("Invalid max_cycles_per_h: {0}. Must be between 3 and 20 and at least min_cycles_per_h")]
    InvalidMaxCycles(u32),

    #[error("Invalid hard_cycle_ceiling: {0}. Must be at least max_cycles_per_h ({1})")]
    InvalidCycleCeiling(u32, u32),

    #[error("Invalid {0}: {1}. Must be between 0.5 and 1.0")]
    InvalidThreshold(&'static str, f64),

    #[error("Invalid stability_window: {0}. Must be at least 1")]
    InvalidStabilityWindow(usize),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid retention_days: {0}. Must be between 1 and 36500")]
    InvalidRetention(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .hierarchos/config.yaml (project config)
    /// 3. .hierarchos/local.yaml (project local overrides, optional)
    /// 4. Environment variables (HIERARCHOS_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".hierarchos/config.yaml"))
            .merge(Yaml::file(".hierarchos/local.yaml"))
            .merge(Env::prefixed("HIERARCHOS_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("HIERARCHOS_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.server.max_concurrent_sessions == 0 {
            return Err(ConfigError::InvalidConcurrency(
                config.server.max_concurrent_sessions,
            ));
        }
        let timeout = config.server.session_timeout_minutes;
        if !(1..=MAX_SESSION_TIMEOUT_MINUTES).contains(&timeout) {
            return Err(ConfigError::InvalidSessionTimeout(timeout));
        }

        let h = &config.reasoning.h_controller;
        if !(1..=50).contains(&h.max_iterations) {
            return Err(ConfigError::InvalidMaxIterations(h.max_iterations));
        }

        let l = &config.reasoning.l_controller;
        if !(3..=20).contains(&l.max_cycles_per_h) || l.max_cycles_per_h < l.min_cycles_per_h {
            return Err(ConfigError::InvalidMaxCycles(l.max_cycles_per_h));
        }
        if l.hard_cycle_ceiling < l.max_cycles_per_h {
            return Err(ConfigError::InvalidCycleCeiling(
                l.hard_cycle_ceiling,
                l.max_cycles_per_h,
            ));
        }

        let c = &config.reasoning.convergence;
        for (name, value) in [
            ("global_threshold", c.global_threshold),
            ("local_threshold", c.local_threshold),
            ("min_confidence_threshold", h.min_confidence_threshold),
        ] {
            if !(0.5..=1.0).contains(&value) {
                return Err(ConfigError::InvalidThreshold(name, value));
            }
        }
        if c.stability_window == 0 {
            return Err(ConfigError::InvalidStabilityWindow(c.stability_window));
        }

        if config.persistence.database_path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if !(1..=MAX_RETENTION_DAYS).contains(&config.persistence.retention_days) {
            return Err(ConfigError::InvalidRetention(config.persistence.retention_days));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.max_concurrent_sessions, 10);
        assert_eq!(config.reasoning.l_controller.hard_cycle_ceiling, 1000);
        assert_eq!(config.persistence.database_path, ".hierarchos/hierarchos.db");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
server:
  max_concurrent_sessions: 3
reasoning:
  h_controller:
    max_iterations: 20
  convergence:
    global_threshold: 0.9
logging:
  level: debug
  format: pretty
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.server.max_concurrent_sessions, 3);
        assert_eq!(config.server.session_timeout_minutes, 30);
        assert_eq!(config.reasoning.h_controller.max_iterations, 20);
        assert!((config.reasoning.convergence.global_threshold - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.reasoning.l_controller.max_cycles_per_h, 6);
        assert_eq!(config.logging.format, "pretty");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = Config::default();
        config.server.max_concurrent_sessions = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidConcurrency(0))
        ));
    }

    #[test]
    fn test_validate_iteration_bounds() {
        let mut config = Config::default();
        config.reasoning.h_controller.max_iterations = 51;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxIterations(51))
        ));
    }

    #[test]
    fn test_validate_cycle_bounds() {
        let mut config = Config::default();
        config.reasoning.l_controller.max_cycles_per_h = 2;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxCycles(2))
        ));

        let mut config = Config::default();
        config.reasoning.l_controller.min_cycles_per_h = 8;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxCycles(6))
        ));

        let mut config = Config::default();
        config.reasoning.l_controller.hard_cycle_ceiling = 5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidCycleCeiling(5, 6))
        ));
    }

    #[test]
    fn test_validate_thresholds() {
        let mut config = Config::default();
        config.reasoning.convergence.local_threshold = 0.4;
        match ConfigLoader::validate(&config) {
            Err(ConfigError::InvalidThreshold(name, _)) => assert_eq!(name, "local_threshold"),
            other => panic!("Expected InvalidThreshold, got {other:?}"),
        }

        let mut config = Config::default();
        config.reasoning.convergence.stability_window = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidStabilityWindow(0))
        ));
    }

    #[test]
    fn test_validate_persistence() {
        let mut config = Config::default();
        config.persistence.database_path = String::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyDatabasePath)
        ));

        let mut config = Config::default();
        config.persistence.retention_days = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidRetention(0))
        ));

        let mut config = Config::default();
        config.persistence.retention_days = u32::MAX;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidRetention(u32::MAX))
        ));
    }

    #[test]
    fn test_validate_session_timeout_bounds() {
        let mut config = Config::default();
        config.server.session_timeout_minutes = u64::MAX;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSessionTimeout(u64::MAX))
        ));

        config.server.session_timeout_minutes = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSessionTimeout(0))
        ));

        config.server.session_timeout_minutes = MAX_SESSION_TIMEOUT_MINUTES;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_logging() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));

        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogRotation(_))
        ));
    }

    #[test]
    fn test_env_override() {
        temp_env::with_vars(
            [
                ("HIERARCHOS_SERVER__MAX_CONCURRENT_SESSIONS", Some("4")),
                ("HIERARCHOS_LOGGING__LEVEL", Some("debug")),
            ],
            || {
                let config = ConfigLoader::load().unwrap();
                assert_eq!(config.server.max_concurrent_sessions, 4);
                assert_eq!(config.logging.level, "debug");
            },
        );
    }

    #[test]
    fn test_env_override_is_validated() {
        temp_env::with_var("HIERARCHOS_SERVER__MAX_CONCURRENT_SESSIONS", Some("0"), || {
            assert!(ConfigLoader::load().is_err());
        });
    }

    #[test]
    fn test_load_from_file_merges_over_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "persistence:\n  retention_days: 14\nlogging:\n  level: warn"
        )
        .unwrap();
        file.flush().unwrap();

        let config = temp_env::with_vars_unset(
            [
                "HIERARCHOS_SERVER__MAX_CONCURRENT_SESSIONS",
                "HIERARCHOS_LOGGING__LEVEL",
            ],
            || ConfigLoader::load_from_file(file.path()).unwrap(),
        );
        assert_eq!(config.persistence.retention_days, 14);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "server:\n  max_concurrent_sessions: 5\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(
            override_file,
            "server:\n  max_concurrent_sessions: 15\nlogging:\n  level: debug"
        )
        .unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.server.max_concurrent_sessions, 15, "Override should win");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json", "Base value should persist");
    }
}
