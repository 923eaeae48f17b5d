//! Goal domain model.
//!
//! Goals are the subgoals a task is decomposed into. They are created once by
//! the decomposer, owned by the strategic controller's ledger, and move from
//! the pending partition to the completed partition when an execution outcome
//! for them is ingested. Goals are never deleted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single subgoal in the strategic ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Short opaque identifier (8 hex characters)
    pub id: String,
    /// Human-readable description of the work
    pub description: String,
    /// Whether the last attempt at this goal succeeded
    #[serde(default)]
    pub completed: bool,
    /// Confidence reported by the last attempt, in [0, 1]
    #[serde(default)]
    pub confidence: f64,
}

impl Goal {
    /// Create a new pending goal with a fresh short identifier.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: short_id(),
            description: description.into(),
            completed: false,
            confidence: 0.0,
        }
    }

    /// Replace the generated identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder: set the confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Builder: mark as completed.
    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }
}

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
