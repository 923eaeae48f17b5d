//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces for the collaborators of the
//! reasoning loop:
//! - Decomposer: task to ordered subgoals
//! - ExecutionStrategy: one attempt at a subgoal
//! - SessionRepository: durable session storage

pub mod decomposer;
pub mod execution_strategy;
pub mod session_repository;

pub use decomposer::{DecomposedTask, Decomposer};
pub use execution_strategy::ExecutionStrategy;
pub use session_repository::SessionRepository;
