//! Execution (L-controller) state and the outcome handed back to the
//! strategic controller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::instruction::Directive;

/// Raw result of one call to the execution strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub solution: String,
    pub success: bool,
    /// Confidence in [0, 1]
    pub confidence: f64,
}

impl Attempt {
    pub fn new(solution: impl Into<String>, success: bool, confidence: f64) -> Self {
        Self {
            solution: solution.into(),
            success,
            confidence,
        }
    }

    /// Confidence is finite and inside [0, 1].
    pub fn is_well_formed(&self) -> bool {
        self.confidence.is_finite() && (0.0..=1.0).contains(&self.confidence)
    }
}

/// One refinement-cycle record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionTrace {
    pub action: String,
    pub result: Attempt,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
}

impl ExecutionTrace {
    pub fn for_cycle(cycle: u32, result: Attempt) -> Self {
        Self {
            action: format!("Cycle {cycle}"),
            success: result.success,
            result,
            timestamp: Utc::now(),
        }
    }
}

/// State scoped to a single `execute_cycles` invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub current_task: Option<Directive>,
    #[serde(default)]
    pub trace: Vec<ExecutionTrace>,
    #[serde(default)]
    pub iteration: u32,
}

impl ExecutionState {
    pub fn for_directive(directive: Directive) -> Self {
        Self {
            current_task: Some(directive),
            trace: Vec::new(),
            iteration: 0,
        }
    }
}

/// Result of attempting one goal, handed from the execution controller to the
/// strategic controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub solution: String,
    pub success: bool,
    /// Confidence of the last recorded cycle
    pub confidence: f64,
    pub cycle_count: u32,
    pub trace: Vec<ExecutionTrace>,
    /// The attempt was cut off by the hard cycle ceiling
    #[serde(default)]
    pub ceiling_exceeded: bool,
}

impl Outcome {
    /// Failed outcome for an attempt that hit the hard cycle ceiling.
    pub fn ceiling_exceeded(ceiling: u32, trace: Vec<ExecutionTrace>) -> Self {
        Self {
            solution: format!("Execution exceeded hard cycle ceiling ({ceiling})"),
            success: false,
            confidence: 0.0,
            cycle_count: ceiling,
            trace,
            ceiling_exceeded: true,
        }
    }
}
