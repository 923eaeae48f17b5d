//! Execution strategy port.
//!
//! Produces one `{solution, success, confidence}` attempt for a subgoal.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Attempt;

/// Evaluates a single refinement cycle for a goal.
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    /// Attempt `goal_description` in the context of `original_task`.
    async fn attempt(&self, goal_description: &str, original_task: &str) -> DomainResult<Attempt>;
}
