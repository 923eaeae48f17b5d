//! Hierarchos - hierarchical reasoning engine
//!
//! A two-level control loop for solving tasks: a strategic (H) controller
//! decomposes a task into ordered goals and tracks overall confidence, while an
//! execution (L) controller repeatedly attempts each goal until its confidence
//! stabilises. Runs are admitted through a bounded session pool, persisted to
//! `SQLite`, and exposed as MCP tools over stdio.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): models, ports, and errors
//! - **Service Layer** (`services`): controllers, orchestrator, session pool
//! - **Adapters** (`adapters`): `SQLite` and in-memory stores, MCP stdio server
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use hierarchos::adapters::memory::InMemorySessionRepository;
//! use hierarchos::{Config, ReasoningRequest, ReasoningService, SessionPool};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = Arc::new(SessionPool::new(Arc::new(InMemorySessionRepository::new()), 4));
//!     let service = ReasoningService::new(pool, Config::default());
//!     let response = service.hierarchical_reason(&ReasoningRequest::new("implement a cache")).await?;
//!     println!("{}", response.result.solution.primary_solution);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, Goal, OrchestratorPhase, ReasoningRequest, ReasoningResult, Session, SessionStatus,
    StrategicState,
};
pub use domain::ports::{Decomposer, ExecutionStrategy, SessionRepository};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Orchestrator, ReasoningService, SessionPool};
