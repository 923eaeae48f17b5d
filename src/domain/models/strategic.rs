//! Strategic (H-controller) state.
//!
//! The strategic state is the goal ledger plus the append-only decision log
//! and the aggregate confidence of the run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::goal::Goal;

/// Kind of strategic decision recorded by a planning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Architectural,
    Algorithmic,
    Structural,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Architectural => "architectural",
            Self::Algorithmic => "algorithmic",
            Self::Structural => "structural",
        }
    }
}

/// One entry of the strategic decision log. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategicDecision {
    pub kind: DecisionKind,
    pub rationale: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl StrategicDecision {
    pub fn new(kind: DecisionKind, rationale: impl Into<String>, confidence: f64) -> Self {
        Self {
            kind,
            rationale: rationale.into(),
            confidence: confidence.clamp(0.0, 1.0),
            timestamp: Utc::now(),
        }
    }
}

/// State owned by the strategic controller.
///
/// `completed_goals.len() + pending_goals.len()` is fixed by the initial
/// decomposition and conserved by every later update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategicState {
    /// Original task, its classification, and caller context
    pub problem_representation: Map<String, Value>,
    /// Caller-supplied context, kept verbatim
    #[serde(default)]
    pub global_context: Map<String, Value>,
    /// Append-only decision log
    #[serde(default)]
    pub decisions: Vec<StrategicDecision>,
    /// Goals that have been attempted (successfully or not), in ingestion order
    #[serde(default)]
    pub completed_goals: Vec<Goal>,
    /// Goals not yet attempted, in FIFO order
    #[serde(default)]
    pub pending_goals: Vec<Goal>,
    /// Aggregate confidence in [0, 1]
    #[serde(default)]
    pub overall_confidence: f64,
    /// Number of planning calls made so far
    #[serde(default)]
    pub iteration: u32,
}

impl StrategicState {
    /// Total number of goals in the ledger, across both partitions.
    pub fn total_goals(&self) -> usize {
        self.completed_goals.len() + self.pending_goals.len()
    }

    /// Original task text, if the problem has been initialized.
    pub fn original_task(&self) -> Option<&str> {
        self.problem_representation
            .get("original_task")
            .and_then(Value::as_str)
    }

    /// Mean confidence of the most recent `window` decisions.
    pub fn recent_decision_confidence(&self, window: usize) -> Option<f64> {
        if window == 0 || self.decisions.len() < window {
            return None;
        }
        let recent = &self.decisions[self.decisions.len() - window..];
        let sum: f64 = recent.iter().map(|d| d.confidence).sum();
        Some(sum / window as f64)
    }
}
