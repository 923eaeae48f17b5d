//! Strategic (H) controller.
//!
//! Owns the subgoal ledger and aggregate confidence. Selects the next goal in
//! strict FIFO order, records one decision per planning step, and folds
//! execution outcomes back into the ledger.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    DecisionKind, Directive, Instruction, Outcome, StrategicDecision, StrategicState,
};
use crate::domain::ports::Decomposer;

/// Confidence after decomposition, before anything has executed.
pub const INITIAL_CONFIDENCE: f64 = 0.3;
/// Confidence floor while goals exist but none have been attempted.
pub const UNATTEMPTED_CONFIDENCE: f64 = 0.1;
/// Aggregate confidence never reaches certainty.
pub const CONFIDENCE_CAP: f64 = 0.95;
/// Decision confidence used when the selected goal has none yet.
pub const DEFAULT_DECISION_CONFIDENCE: f64 = 0.5;

pub struct StrategicController {
    decomposer: Arc<dyn Decomposer>,
    state: StrategicState,
}

impl StrategicController {
    pub fn new(decomposer: Arc<dyn Decomposer>) -> Self {
        Self {
            decomposer,
            state: StrategicState::default(),
        }
    }

    /// Current ledger state.
    pub fn state(&self) -> &StrategicState {
        &self.state
    }

    /// Consume the controller, yielding its final state.
    pub fn into_state(self) -> StrategicState {
        self.state
    }

    /// Decompose `task` and reset the ledger around the resulting goals.
    ///
    /// Fails with `ValidationFailed` on a blank task and `EmptyDecomposition`
    /// when the decomposer returns no goals. Other decomposer errors surface
    /// as `CollaboratorFailed`.
    pub async fn initialize_problem(
        &mut self,
        task: &str,
        context: Map<String, Value>,
    ) -> DomainResult<()> {
        if task.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "task must not be empty".to_string(),
            ));
        }

        let decomposed = self
            .decomposer
            .decompose(task, &context)
            .await
            .map_err(|e| match e {
                DomainError::ValidationFailed(_)
                | DomainError::EmptyDecomposition(_)
                | DomainError::CollaboratorFailed(_) => e,
                other => DomainError::CollaboratorFailed(format!("decomposer failed: {other}")),
            })?;
        if decomposed.goals.is_empty() {
            return Err(DomainError::EmptyDecomposition(task.to_string()));
        }

        let mut problem = Map::new();
        problem.insert("original_task".to_string(), Value::String(task.to_string()));
        problem.insert(
            "task_type".to_string(),
            Value::String(decomposed.kind.as_str().to_string()),
        );
        problem.insert("context".to_string(), Value::Object(context.clone()));

        tracing::info!(
            task_kind = decomposed.kind.as_str(),
            goals = decomposed.goals.len(),
            "Problem initialized"
        );

        self.state = StrategicState {
            problem_representation: problem,
            global_context: context,
            pending_goals: decomposed.goals,
            overall_confidence: INITIAL_CONFIDENCE,
            ..Default::default()
        };
        Ok(())
    }

    /// Advance the iteration counter and pick the head of the pending queue.
    pub fn plan_cycle(&mut self) -> Instruction {
        self.state.iteration += 1;

        let Some(goal) = self.state.pending_goals.first().cloned() else {
            tracing::debug!(iteration = self.state.iteration, "No pending goals");
            return Instruction::Complete;
        };

        let confidence = if goal.confidence > 0.0 {
            goal.confidence
        } else {
            DEFAULT_DECISION_CONFIDENCE
        };
        self.state.decisions.push(StrategicDecision::new(
            DecisionKind::Algorithmic,
            format!("Selecting goal: {}", goal.description),
            confidence,
        ));

        tracing::debug!(
            iteration = self.state.iteration,
            goal_id = %goal.id,
            "Planned goal"
        );

        let task = self.state.original_task().unwrap_or_default().to_string();
        Instruction::Execute(Directive::new(goal, task))
    }

    /// Record the outcome for `goal_id` and recompute aggregate confidence.
    ///
    /// The goal moves to the completed partition whether or not the attempt
    /// succeeded. Unknown or already-recorded ids leave the ledger untouched.
    pub fn update_from_outcome(&mut self, outcome: &Outcome, goal_id: &str) {
        if let Some(pos) = self
            .state
            .pending_goals
            .iter()
            .position(|g| g.id == goal_id)
        {
            let mut goal = self.state.pending_goals.remove(pos);
            goal.completed = outcome.success;
            goal.confidence = outcome.confidence;
            self.state.completed_goals.push(goal);
        } else {
            tracing::debug!(goal_id, "Outcome for goal not pending, ignored");
        }

        self.state.overall_confidence = Self::aggregate_confidence(&self.state);
        tracing::debug!(
            goal_id,
            success = outcome.success,
            confidence = self.state.overall_confidence,
            "Ledger updated"
        );
    }

    /// Mean confidence of recorded goals times coverage, capped below 1.
    pub fn aggregate_confidence(state: &StrategicState) -> f64 {
        let total = state.total_goals();
        if total == 0 {
            return 0.0;
        }
        let completed = &state.completed_goals;
        if completed.is_empty() {
            return UNATTEMPTED_CONFIDENCE;
        }

        let mean = completed.iter().map(|g| g.confidence).sum::<f64>() / completed.len() as f64;
        let ratio = completed.len() as f64 / total as f64;
        (mean * ratio).min(CONFIDENCE_CAP)
    }
}
