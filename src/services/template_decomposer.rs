//! Keyword-classified, template-driven decomposer.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::TaskKind;
use crate::domain::ports::{DecomposedTask, Decomposer};

/// Default [`Decomposer`]: classify with [`TaskKind::classify`], then
/// instantiate the kind's goal template. Deterministic apart from goal ids.
#[derive(Debug, Clone, Default)]
pub struct TemplateDecomposer;

impl TemplateDecomposer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Decomposer for TemplateDecomposer {
    async fn decompose(
        &self,
        task: &str,
        _context: &Map<String, Value>,
    ) -> DomainResult<DecomposedTask> {
        if task.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "task must not be empty".to_string(),
            ));
        }

        let kind = TaskKind::classify(task);
        let goals = kind.goals_for(task);
        if goals.is_empty() {
            return Err(DomainError::EmptyDecomposition(task.to_string()));
        }

        Ok(DecomposedTask { kind, goals })
    }
}
