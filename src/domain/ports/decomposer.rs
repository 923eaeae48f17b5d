//! Decomposer port.
//!
//! Maps a task description to the initial ordered sequence of subgoals.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Goal, TaskKind};

/// Result of decomposing a task.
#[derive(Debug, Clone, PartialEq)]
pub struct DecomposedTask {
    /// Classification the goals were derived from
    pub kind: TaskKind,
    /// Ordered subgoals; non-empty for any non-empty task
    pub goals: Vec<Goal>,
}

/// Turns a task into subgoals for the strategic controller.
#[async_trait]
pub trait Decomposer: Send + Sync {
    /// Decompose `task` given caller `context`.
    ///
    /// Implementations must return at least one goal for a non-empty task.
    async fn decompose(&self, task: &str, context: &Map<String, Value>)
        -> DomainResult<DecomposedTask>;
}
