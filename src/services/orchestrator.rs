//! Outer H/L loop.
//!
//! Drives planning and execution for up to `max_h_iterations` rounds, checks
//! global convergence and early termination after each outcome, and compiles
//! the final result from the ledger.
//!
//! ```text
//! PLANNING --complete--> CONVERGED
//!    |
//!    v
//! EXECUTING --global convergence--> CONVERGED
//!    |      --early termination---> TERMINATED_EARLY
//!    v
//! PLANNING ... (bound reached) ---> EXHAUSTED
//! ```

use std::sync::Arc;
use std::time::Instant;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Config, ExecutionState, Instruction, OrchestratorPhase, ReasoningRequest, ReasoningResult,
    SolutionReport, StrategicState, TraceSummary,
};
use crate::domain::ports::{Decomposer, ExecutionStrategy};
use crate::services::convergence::{ConvergenceDetector, DEFAULT_NO_PROGRESS_LIMIT};
use crate::services::execution_controller::{ExecutionController, ExecutionSettings};
use crate::services::strategic_controller::StrategicController;

/// Primary solution text when nothing was attempted.
pub const NO_SOLUTION: &str = "No solution completed";
/// Warning attached when failed goals drag the run below [`FEASIBLE_CONFIDENCE`].
pub const INFEASIBILITY_WARNING: &str =
    "Task contains contradictory or impossible requirements that cannot be satisfied";
/// Goals below this confidence count as failed for the infeasibility check.
const FAILED_GOAL_CONFIDENCE: f64 = 0.3;
/// Overall confidence below which failed goals trigger the infeasibility warning.
pub const FEASIBLE_CONFIDENCE: f64 = 0.6;

/// Everything a caller needs to persist a finished run.
#[derive(Debug, Clone)]
pub struct OrchestrationRun {
    pub result: ReasoningResult,
    pub strategic_state: StrategicState,
    /// Snapshot of the last execution controller invocation, if any ran
    pub execution_state: Option<ExecutionState>,
}

pub struct Orchestrator {
    strategic: StrategicController,
    execution: ExecutionController,
    no_progress_limit: usize,
    phase: OrchestratorPhase,
}

impl Orchestrator {
    pub fn new(
        decomposer: Arc<dyn Decomposer>,
        strategy: Arc<dyn ExecutionStrategy>,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            strategic: StrategicController::new(decomposer),
            execution: ExecutionController::new(strategy, settings),
            no_progress_limit: DEFAULT_NO_PROGRESS_LIMIT,
            phase: OrchestratorPhase::Planning,
        }
    }

    /// Build an orchestrator tuned from configuration.
    pub fn from_config(
        decomposer: Arc<dyn Decomposer>,
        strategy: Arc<dyn ExecutionStrategy>,
        config: &Config,
    ) -> Self {
        let settings = ExecutionSettings::from_config(
            &config.reasoning.l_controller,
            &config.reasoning.convergence,
        );
        Self::new(decomposer, strategy, settings)
            .with_no_progress_limit(config.reasoning.convergence.no_progress_limit)
    }

    pub fn with_no_progress_limit(mut self, limit: usize) -> Self {
        self.no_progress_limit = limit;
        self
    }

    pub fn phase(&self) -> OrchestratorPhase {
        self.phase
    }

    /// Run the loop to a terminal phase.
    ///
    /// Collaborator errors propagate unchanged; a low-confidence run is a
    /// normal result.
    pub async fn run(mut self, request: &ReasoningRequest) -> DomainResult<OrchestrationRun> {
        let started = Instant::now();
        self.strategic
            .initialize_problem(&request.task, request.context.clone())
            .await?;

        let mut rounds: u32 = 0;
        let mut executed = false;

        while rounds < request.max_h_iterations {
            rounds += 1;
            self.phase = OrchestratorPhase::Planning;

            let directive = match self.strategic.plan_cycle() {
                Instruction::Complete => {
                    self.phase = OrchestratorPhase::Converged;
                    break;
                }
                Instruction::Execute(directive) => directive,
            };

            self.phase = OrchestratorPhase::Executing;
            let outcome = self
                .execution
                .execute_cycles(&directive, request.max_l_cycles)
                .await?;
            executed = true;
            self.strategic.update_from_outcome(&outcome, &directive.goal.id);

            let state = self.strategic.state();
            if ConvergenceDetector::check_global_convergence(state, request.convergence_threshold) {
                self.phase = OrchestratorPhase::Converged;
                break;
            }
            if ConvergenceDetector::should_terminate_early(
                state,
                request.max_h_iterations,
                self.no_progress_limit,
            ) {
                self.phase = OrchestratorPhase::TerminatedEarly;
                break;
            }
        }

        if !self.phase.is_terminal() {
            self.phase = OrchestratorPhase::Exhausted;
        }

        let elapsed = started.elapsed().as_secs_f64();
        let state = self.strategic.state();

        tracing::info!(
            phase = self.phase.as_str(),
            rounds,
            completed = state.completed_goals.len(),
            pending = state.pending_goals.len(),
            confidence = state.overall_confidence,
            "Reasoning run finished"
        );

        let result = ReasoningResult {
            solution: compile_solution(state, self.phase),
            trace_summary: TraceSummary {
                h_iterations: state.decisions.len(),
                completed_goals: state.completed_goals.len(),
                final_confidence: state.overall_confidence,
                final_phase: self.phase,
            },
            confidence_score: state.overall_confidence,
            total_iterations: rounds,
            computation_time_secs: elapsed,
            convergence_achieved: state.pending_goals.is_empty(),
        };

        let execution_state = executed.then(|| self.execution.state().clone());
        Ok(OrchestrationRun {
            result,
            strategic_state: self.strategic.into_state(),
            execution_state,
        })
    }
}

/// Deterministic report over the completed partition, in ledger order.
pub fn compile_solution(state: &StrategicState, phase: OrchestratorPhase) -> SolutionReport {
    let implementation_notes = format!(
        "Hierarchical solution from {} strategic decisions ({})",
        state.decisions.len(),
        phase.as_str()
    );

    if state.completed_goals.is_empty() {
        return SolutionReport {
            primary_solution: NO_SOLUTION.to_string(),
            implementation_notes,
            infeasibility_warning: None,
        };
    }

    let lines: Vec<String> = state
        .completed_goals
        .iter()
        .map(|g| format!("- {} (confidence: {:.2})", g.description, g.confidence))
        .collect();

    let has_failures = state
        .completed_goals
        .iter()
        .any(|g| !g.completed || g.confidence < FAILED_GOAL_CONFIDENCE);
    let infeasibility_warning = (has_failures && state.overall_confidence < FEASIBLE_CONFIDENCE)
        .then(|| INFEASIBILITY_WARNING.to_string());

    SolutionReport {
        primary_solution: format!("Completed solutions:\n{}", lines.join("\n")),
        implementation_notes,
        infeasibility_warning,
    }
}
