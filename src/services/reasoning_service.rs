//! Reasoning service: the four externally callable operations.
//!
//! Every full pass is admitted through the [`SessionPool`], runs a fresh
//! [`Orchestrator`], and leaves a completed or failed session behind.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Config, Goal, ReasoningRequest, ReasoningResult, SolutionReport, TaskKind, TraceSummary,
};
use crate::domain::ports::{Decomposer, ExecutionStrategy, SessionRepository};
use crate::services::heuristic_strategy::HeuristicStrategy;
use crate::services::orchestrator::Orchestrator;
use crate::services::session_pool::SessionPool;
use crate::services::template_decomposer::TemplateDecomposer;

/// Cycles per goal used by refinement passes.
pub const REFINEMENT_L_CYCLES: u32 = 4;
/// Convergence threshold used by refinement passes.
pub const REFINEMENT_THRESHOLD: f64 = 0.80;
/// Runs with more rounds than this are flagged as slow to converge.
const SLOW_CONVERGENCE_ITERATIONS: u32 = 8;
/// Lower bound on elapsed time when computing throughput.
const MIN_MEASURED_SECS: f64 = 0.1;

const SLOW_CONVERGENCE_ADVICE: &str = "Consider breaking down the task into smaller subtasks";
const LOW_CONFIDENCE_ADVICE: &str = "Task may need more context or clearer constraints";

/// Result of a full reasoning pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub result: ReasoningResult,
}

/// Goals a task would be decomposed into, without executing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub original_task: String,
    pub task_kind: TaskKind,
    pub subtasks: Vec<Goal>,
    pub total_subtasks: usize,
    /// `min(subtasks / 3, 1)`
    pub estimated_complexity: f64,
}

/// Result of a refinement pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refinement {
    pub session_id: Uuid,
    pub refined_solution: SolutionReport,
    pub improvements: Vec<String>,
    pub refinement_trace: TraceSummary,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_iterations: u32,
    pub computation_time_secs: f64,
    pub convergence_achieved: bool,
    pub final_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub iterations_per_second: f64,
    pub convergence_efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckAnalysis {
    pub slow_convergence: bool,
    pub low_confidence: bool,
    pub recommendations: Vec<String>,
}

/// Analysis of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceAnalysis {
    pub session_id: Uuid,
    pub session_summary: SessionSummary,
    pub performance_metrics: PerformanceMetrics,
    pub bottleneck_analysis: BottleneckAnalysis,
}

impl TraceAnalysis {
    /// Derive metrics and advice from a stored result.
    pub fn from_result(session_id: Uuid, result: &ReasoningResult, min_confidence: f64) -> Self {
        let iterations = result.total_iterations;
        let slow_convergence = iterations > SLOW_CONVERGENCE_ITERATIONS;
        let low_confidence = result.confidence_score < min_confidence;

        let mut recommendations = Vec::new();
        if slow_convergence {
            recommendations.push(SLOW_CONVERGENCE_ADVICE.to_string());
        }
        if low_confidence {
            recommendations.push(LOW_CONFIDENCE_ADVICE.to_string());
        }

        Self {
            session_id,
            session_summary: SessionSummary {
                total_iterations: iterations,
                computation_time_secs: result.computation_time_secs,
                convergence_achieved: result.convergence_achieved,
                final_confidence: result.confidence_score,
            },
            performance_metrics: PerformanceMetrics {
                iterations_per_second: f64::from(iterations)
                    / result.computation_time_secs.max(MIN_MEASURED_SECS),
                convergence_efficiency: if result.convergence_achieved { 1.0 } else { 0.5 },
            },
            bottleneck_analysis: BottleneckAnalysis {
                slow_convergence,
                low_confidence,
                recommendations,
            },
        }
    }
}

pub struct ReasoningService<R: SessionRepository> {
    pool: Arc<SessionPool<R>>,
    decomposer: Arc<dyn Decomposer>,
    strategy: Arc<dyn ExecutionStrategy>,
    config: Config,
}

impl<R: SessionRepository> ReasoningService<R> {
    /// Service with the template decomposer and heuristic strategy.
    pub fn new(pool: Arc<SessionPool<R>>, config: Config) -> Self {
        Self::with_collaborators(
            pool,
            config,
            Arc::new(TemplateDecomposer::new()),
            Arc::new(HeuristicStrategy::new()),
        )
    }

    pub fn with_collaborators(
        pool: Arc<SessionPool<R>>,
        config: Config,
        decomposer: Arc<dyn Decomposer>,
        strategy: Arc<dyn ExecutionStrategy>,
    ) -> Self {
        Self {
            pool,
            decomposer,
            strategy,
            config,
        }
    }

    pub fn pool(&self) -> &Arc<SessionPool<R>> {
        &self.pool
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate, admit, run, and record one full pass.
    pub async fn hierarchical_reason(
        &self,
        request: &ReasoningRequest,
    ) -> DomainResult<ReasonResponse> {
        request.validate()?;

        let session = self.pool.create_session().await?;
        let session_id = session.id;
        tracing::info!(
            session_id = %session_id,
            max_h = request.max_h_iterations,
            max_l = request.max_l_cycles,
            "Reasoning started"
        );

        let orchestrator = Orchestrator::from_config(
            self.decomposer.clone(),
            self.strategy.clone(),
            &self.config,
        );

        match orchestrator.run(request).await {
            Ok(run) => {
                let result = run.result.clone();
                self.pool
                    .complete_session(
                        session_id,
                        run.result,
                        run.strategic_state,
                        run.execution_state,
                    )
                    .await?;
                Ok(ReasonResponse { session_id, result })
            }
            Err(err) => {
                if let Err(fail_err) = self.pool.fail_session(session_id, &err.to_string()).await {
                    tracing::error!(session_id = %session_id, error = %fail_err, "Failed to record session failure");
                }
                Err(err)
            }
        }
    }

    /// Decompose without executing or admitting a session.
    pub async fn decompose_task(&self, task: &str) -> DomainResult<Decomposition> {
        let decomposed = self.decomposer.decompose(task, &Map::new()).await?;
        if decomposed.goals.is_empty() {
            return Err(DomainError::EmptyDecomposition(task.to_string()));
        }

        let total = decomposed.goals.len();
        Ok(Decomposition {
            original_task: task.to_string(),
            task_kind: decomposed.kind,
            subtasks: decomposed.goals,
            total_subtasks: total,
            estimated_complexity: (total as f64 / 3.0).min(1.0),
        })
    }

    /// Run another bounded pass over an existing solution.
    pub async fn refine_solution(
        &self,
        original_solution: Value,
        refinement_goals: Vec<String>,
        max_iterations: u32,
    ) -> DomainResult<Refinement> {
        let mut context = Map::new();
        context.insert("original_solution".to_string(), original_solution);
        context.insert(
            "refinement_goals".to_string(),
            Value::Array(refinement_goals.iter().cloned().map(Value::String).collect()),
        );

        let request = ReasoningRequest::new(format!(
            "Refine solution with goals: {}",
            refinement_goals.join(", ")
        ))
        .with_context(context)
        .with_max_h_iterations(max_iterations)
        .with_max_l_cycles(REFINEMENT_L_CYCLES)
        .with_convergence_threshold(REFINEMENT_THRESHOLD);

        let response = self.hierarchical_reason(&request).await?;
        Ok(Refinement {
            session_id: response.session_id,
            refined_solution: response.result.solution,
            improvements: refinement_goals,
            refinement_trace: response.result.trace_summary,
            confidence: response.result.confidence_score,
        })
    }

    /// Analyze a completed session's stored result.
    pub async fn analyze_session(&self, id: Uuid) -> DomainResult<TraceAnalysis> {
        let session = self
            .pool
            .get_session(id)
            .await?
            .ok_or(DomainError::SessionNotFound(id))?;
        let result = session
            .final_solution
            .as_ref()
            .ok_or(DomainError::SessionIncomplete(id))?;

        Ok(TraceAnalysis::from_result(
            id,
            result,
            self.config.reasoning.h_controller.min_confidence_threshold,
        ))
    }
}
