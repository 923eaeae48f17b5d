//! Request and result types for a full hierarchical reasoning run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::errors::{DomainError, DomainResult};

/// Output verbosity requested by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Minimal,
    #[default]
    Normal,
    Detailed,
}

impl Verbosity {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "minimal" => Some(Self::Minimal),
            "normal" => Some(Self::Normal),
            "detailed" => Some(Self::Detailed),
            _ => None,
        }
    }
}

/// Input to a reasoning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningRequest {
    pub task: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default = "default_max_h_iterations")]
    pub max_h_iterations: u32,
    #[serde(default = "default_max_l_cycles")]
    pub max_l_cycles: u32,
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,
    #[serde(default)]
    pub verbosity: Verbosity,
}

const fn default_max_h_iterations() -> u32 {
    10
}

const fn default_max_l_cycles() -> u32 {
    6
}

const fn default_convergence_threshold() -> f64 {
    0.85
}

impl ReasoningRequest {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            context: Map::new(),
            max_h_iterations: default_max_h_iterations(),
            max_l_cycles: default_max_l_cycles(),
            convergence_threshold: default_convergence_threshold(),
            verbosity: Verbosity::default(),
        }
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn with_max_h_iterations(mut self, max: u32) -> Self {
        self.max_h_iterations = max;
        self
    }

    pub fn with_max_l_cycles(mut self, max: u32) -> Self {
        self.max_l_cycles = max;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    /// Check bounds before any session is admitted.
    pub fn validate(&self) -> DomainResult<()> {
        if self.task.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "task must not be empty".to_string(),
            ));
        }
        if !(1..=50).contains(&self.max_h_iterations) {
            return Err(DomainError::ValidationFailed(format!(
                "max_h_iterations must be between 1 and 50, got {}",
                self.max_h_iterations
            )));
        }
        if !(3..=20).contains(&self.max_l_cycles) {
            return Err(DomainError::ValidationFailed(format!(
                "max_l_cycles must be between 3 and 20, got {}",
                self.max_l_cycles
            )));
        }
        if !(0.5..=1.0).contains(&self.convergence_threshold) {
            return Err(DomainError::ValidationFailed(format!(
                "convergence_threshold must be between 0.5 and 1.0, got {}",
                self.convergence_threshold
            )));
        }
        Ok(())
    }
}

/// Orchestrator state machine phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorPhase {
    Planning,
    Executing,
    Converged,
    Exhausted,
    TerminatedEarly,
}

impl OrchestratorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Executing => "executing",
            Self::Converged => "converged",
            Self::Exhausted => "exhausted",
            Self::TerminatedEarly => "terminated_early",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged | Self::Exhausted | Self::TerminatedEarly)
    }
}

/// Compiled solution text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionReport {
    pub primary_solution: String,
    pub implementation_notes: String,
    /// Set when failed or very low-confidence goals dragged the run below 0.6
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infeasibility_warning: Option<String>,
}

/// Condensed view of the strategic trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    /// Number of strategic decisions recorded
    pub h_iterations: usize,
    pub completed_goals: usize,
    pub final_confidence: f64,
    pub final_phase: OrchestratorPhase,
}

/// Result bundle of a reasoning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningResult {
    pub solution: SolutionReport,
    pub trace_summary: TraceSummary,
    pub confidence_score: f64,
    pub total_iterations: u32,
    pub computation_time_secs: f64,
    /// Pending goals were empty at exit
    pub convergence_achieved: bool,
}
