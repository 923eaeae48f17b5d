//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber. Console output
//! always goes to stderr; stdout belongs to the MCP protocol.

pub mod config;
pub mod logger;

pub use config::{LogConfig, LogFormat, RotationPolicy};
pub use logger::LoggerImpl;
