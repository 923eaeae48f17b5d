//! Execution (L) controller.
//!
//! Runs bounded refinement cycles for a single directive. Every invocation
//! starts from fresh execution state; nothing carries over between goals.

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ConvergenceConfig, Directive, ExecutionControllerConfig, ExecutionState, ExecutionTrace,
    Outcome,
};
use crate::domain::ports::ExecutionStrategy;
use crate::services::convergence::ConvergenceDetector;

/// Tuning for one controller instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionSettings {
    /// Cycles beyond this are fatal for the invocation, whatever `max_cycles` says
    pub hard_cycle_ceiling: u32,
    pub local_threshold: f64,
    pub min_iterations: usize,
    pub stability_window: usize,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self::from_config(
            &ExecutionControllerConfig::default(),
            &ConvergenceConfig::default(),
        )
    }
}

impl ExecutionSettings {
    pub fn from_config(l: &ExecutionControllerConfig, convergence: &ConvergenceConfig) -> Self {
        Self {
            hard_cycle_ceiling: l.hard_cycle_ceiling,
            local_threshold: convergence.local_threshold,
            min_iterations: convergence.min_iterations,
            stability_window: convergence.stability_window,
        }
    }
}

pub struct ExecutionController {
    strategy: Arc<dyn ExecutionStrategy>,
    settings: ExecutionSettings,
    state: ExecutionState,
}

impl ExecutionController {
    pub fn new(strategy: Arc<dyn ExecutionStrategy>, settings: ExecutionSettings) -> Self {
        Self {
            strategy,
            settings,
            state: ExecutionState::default(),
        }
    }

    /// State of the most recent invocation.
    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Run up to `max_cycles` refinement cycles for `directive`.
    ///
    /// Stops early on local convergence of the confidence history. The
    /// outcome carries the last recorded confidence. Running past the hard
    /// ceiling yields a failed outcome with zero confidence rather than an
    /// error; a malformed attempt is an error. Strategy errors surface as
    /// `CollaboratorFailed`.
    pub async fn execute_cycles(
        &mut self,
        directive: &Directive,
        max_cycles: u32,
    ) -> DomainResult<Outcome> {
        self.state = ExecutionState::for_directive(directive.clone());
        let mut history: Vec<f64> = Vec::new();

        for cycle in 0..max_cycles {
            if cycle >= self.settings.hard_cycle_ceiling {
                tracing::warn!(
                    goal_id = %directive.goal.id,
                    ceiling = self.settings.hard_cycle_ceiling,
                    requested = max_cycles,
                    "Hard cycle ceiling exceeded"
                );
                return Ok(Outcome::ceiling_exceeded(
                    self.settings.hard_cycle_ceiling,
                    self.state.trace.clone(),
                ));
            }

            self.state.iteration = cycle;
            let attempt = self
                .strategy
                .attempt(&directive.goal.description, &directive.task)
                .await
                .map_err(|e| match e {
                    DomainError::CollaboratorFailed(_) => e,
                    other => DomainError::CollaboratorFailed(format!(
                        "execution strategy failed on goal {}: {other}",
                        directive.goal.id
                    )),
                })?;

            if !attempt.is_well_formed() {
                return Err(DomainError::MalformedAttempt {
                    goal_id: directive.goal.id.clone(),
                    reason: format!("confidence {} outside [0, 1]", attempt.confidence),
                });
            }

            history.push(attempt.confidence);
            self.state.trace.push(ExecutionTrace::for_cycle(cycle, attempt));

            if ConvergenceDetector::check_local_convergence(
                &history,
                self.settings.local_threshold,
                self.settings.min_iterations,
                self.settings.stability_window,
            ) {
                tracing::debug!(
                    goal_id = %directive.goal.id,
                    cycle,
                    "Local convergence reached"
                );
                break;
            }
        }

        let trace = self.state.trace.clone();
        let outcome = match trace.last() {
            Some(last) => Outcome {
                solution: last.result.solution.clone(),
                success: last.result.success,
                confidence: last.result.confidence,
                cycle_count: trace.len() as u32,
                trace,
                ceiling_exceeded: false,
            },
            None => Outcome {
                solution: String::new(),
                success: false,
                confidence: 0.0,
                cycle_count: 0,
                trace,
                ceiling_exceeded: false,
            },
        };

        tracing::debug!(
            goal_id = %directive.goal.id,
            cycles = outcome.cycle_count,
            confidence = outcome.confidence,
            success = outcome.success,
            "Execution finished"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::models::{Attempt, Goal};

    /// Replays a fixed confidence sequence, repeating the last value.
    struct Scripted {
        confidences: Vec<f64>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(confidences: Vec<f64>) -> Self {
            Self {
                confidences,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ExecutionStrategy for Scripted {
        async fn attempt(&self, goal: &str, _task: &str) -> DomainResult<Attempt> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let idx = n.min(self.confidences.len() - 1);
            Ok(Attempt::new(format!("{goal} #{n}"), true, self.confidences[idx]))
        }
    }

    fn directive() -> Directive {
        Directive::new(Goal::new("Implement core logic for: x"), "x")
    }

    fn controller(confidences: Vec<f64>, ceiling: u32) -> ExecutionController {
        let settings = ExecutionSettings {
            hard_cycle_ceiling: ceiling,
            ..Default::default()
        };
        ExecutionController::new(Arc::new(Scripted::new(confidences)), settings)
    }

    #[tokio::test]
    async fn test_stops_on_local_convergence() {
        let mut l = controller(vec![0.9], 1000);
        let outcome = l.execute_cycles(&directive(), 10).await.unwrap();
        assert_eq!(outcome.cycle_count, 3);
        assert_eq!(outcome.trace.len(), 3);
        assert!(outcome.success);
        assert_eq!(l.state().iteration, 2);
    }

    #[tokio::test]
    async fn test_exhausts_cycles_and_reports_last_confidence() {
        let mut l = controller(vec![0.2, 0.9, 0.2, 0.9, 0.4], 1000);
        let outcome = l.execute_cycles(&directive(), 5).await.unwrap();
        assert_eq!(outcome.cycle_count, 5);
        assert!((outcome.confidence - 0.4).abs() < f64::EPSILON);
        assert_eq!(outcome.trace[0].action, "Cycle 0");
    }

    #[tokio::test]
    async fn test_ceiling_boundary_is_not_fatal() {
        let mut l = controller(vec![0.1, 0.9, 0.1, 0.9], 4);
        let outcome = l.execute_cycles(&directive(), 4).await.unwrap();
        assert!(!outcome.ceiling_exceeded);
        assert_eq!(outcome.cycle_count, 4);
    }

    #[tokio::test]
    async fn test_ceiling_exceeded_is_failed_outcome() {
        let mut l = controller(vec![0.1, 0.9, 0.1, 0.9, 0.1], 4);
        let outcome = l.execute_cycles(&directive(), 5).await.unwrap();
        assert!(outcome.ceiling_exceeded);
        assert!(!outcome.success);
        assert!(outcome.confidence.abs() < f64::EPSILON);
        assert_eq!(outcome.trace.len(), 4);
    }

    #[tokio::test]
    async fn test_malformed_attempt_is_error() {
        let mut l = controller(vec![1.5], 1000);
        let err = l.execute_cycles(&directive(), 3).await.unwrap_err();
        assert!(matches!(err, DomainError::MalformedAttempt { .. }));
    }

    #[tokio::test]
    async fn test_each_invocation_starts_fresh() {
        let mut l = controller(vec![0.9], 1000);
        l.execute_cycles(&directive(), 3).await.unwrap();
        let outcome = l.execute_cycles(&directive(), 3).await.unwrap();
        assert_eq!(outcome.trace.len(), 3);
        assert_eq!(l.state().trace.len(), 3);
    }

    #[tokio::test]
    async fn test_zero_cycles_yields_empty_failed_outcome() {
        let mut l = controller(vec![0.9], 1000);
        let outcome = l.execute_cycles(&directive(), 0).await.unwrap();
        assert_eq!(outcome.cycle_count, 0);
        assert!(!outcome.success);
    }

    struct Unavailable;

    #[async_trait]
    impl ExecutionStrategy for Unavailable {
        async fn attempt(&self, _goal: &str, _task: &str) -> DomainResult<Attempt> {
            Err(DomainError::DatabaseError("backend offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_strategy_error_surfaces_as_collaborator_failure() {
        let mut l = ExecutionController::new(Arc::new(Unavailable), ExecutionSettings::default());
        match l.execute_cycles(&directive(), 3).await {
            Err(DomainError::CollaboratorFailed(message)) => {
                assert!(message.contains("backend offline"));
            }
            other => panic!("Expected CollaboratorFailed, got {other:?}"),
        }
    }
}
