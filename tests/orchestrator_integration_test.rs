//! End-to-end runs of the reasoning loop with the default collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use hierarchos::adapters::memory::InMemorySessionRepository;
use hierarchos::domain::models::{Attempt, Config, OrchestratorPhase, ReasoningRequest, SessionStatus};
use hierarchos::domain::{DomainError, DomainResult};
use hierarchos::services::{
    ExecutionSettings, HeuristicStrategy, Orchestrator, ReasoningService, SessionPool,
    TemplateDecomposer,
};
use hierarchos::ExecutionStrategy;
use proptest::prelude::*;

fn orchestrator() -> Orchestrator {
    Orchestrator::new(
        Arc::new(TemplateDecomposer::new()),
        Arc::new(HeuristicStrategy::new()),
        ExecutionSettings::default(),
    )
}

#[tokio::test]
async fn test_implementation_task_converges() {
    let request = ReasoningRequest::new("implement X").with_max_l_cycles(3);
    let run = orchestrator().run(&request).await.unwrap();

    assert_eq!(run.result.trace_summary.final_phase, OrchestratorPhase::Converged);
    assert!(run.result.convergence_achieved);
    assert_eq!(run.result.total_iterations, 4);
    assert_eq!(run.strategic_state.completed_goals.len(), 4);
    assert!(run.result.confidence_score >= 0.85);
    assert!(run.result.solution.infeasibility_warning.is_none());
    assert!(run
        .result
        .solution
        .primary_solution
        .starts_with("Completed solutions:"));
}

#[tokio::test]
async fn test_iteration_bound_terminates_early() {
    let request = ReasoningRequest::new("implement X")
        .with_max_h_iterations(3)
        .with_max_l_cycles(3);
    let run = orchestrator().run(&request).await.unwrap();

    assert_eq!(
        run.result.trace_summary.final_phase,
        OrchestratorPhase::TerminatedEarly
    );
    assert_eq!(run.result.total_iterations, 3);
    assert_eq!(run.strategic_state.completed_goals.len(), 3);
    assert_eq!(run.strategic_state.pending_goals.len(), 1);
    assert!(!run.result.convergence_achieved);
}

#[tokio::test]
async fn test_contradictory_task_is_flagged() {
    let request = ReasoningRequest::new("sort both ascending and reverse the original list");
    let run = orchestrator().run(&request).await.unwrap();

    assert!(run.result.confidence_score < 0.6);
    assert!(run.result.solution.infeasibility_warning.is_some());
    assert!(run
        .strategic_state
        .completed_goals
        .iter()
        .all(|g| g.confidence < 0.3));
}

#[tokio::test]
async fn test_blank_task_is_rejected() {
    let request = ReasoningRequest::new("   ");
    assert!(orchestrator().run(&request).await.is_err());
}

/// Oscillates on design goals so they never settle; steady elsewhere.
struct OscillatingDesign {
    calls: AtomicUsize,
}

#[async_trait]
impl ExecutionStrategy for OscillatingDesign {
    async fn attempt(&self, goal: &str, _task: &str) -> DomainResult<Attempt> {
        if goal.starts_with("Design") {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let confidence = if n % 2 == 0 { 0.1 } else { 0.9 };
            Ok(Attempt::new("unstable design", true, confidence))
        } else {
            Ok(Attempt::new(format!("done: {goal}"), true, 0.9))
        }
    }
}

#[tokio::test]
async fn test_ceiling_breach_fails_goal_and_run_continues() {
    let settings = ExecutionSettings {
        hard_cycle_ceiling: 3,
        ..Default::default()
    };
    let orchestrator = Orchestrator::new(
        Arc::new(TemplateDecomposer::new()),
        Arc::new(OscillatingDesign {
            calls: AtomicUsize::new(0),
        }),
        settings,
    );
    let request = ReasoningRequest::new("implement X").with_max_l_cycles(5);
    let run = orchestrator.run(&request).await.unwrap();

    let completed = &run.strategic_state.completed_goals;
    assert_eq!(completed.len(), 4);
    assert!(run.strategic_state.pending_goals.is_empty());

    let design = &completed[0];
    assert!(design.description.starts_with("Design"));
    assert!(!design.completed);
    assert!(design.confidence.abs() < f64::EPSILON);

    for goal in &completed[1..] {
        assert!(goal.completed);
        assert!((goal.confidence - 0.9).abs() < f64::EPSILON);
    }
    // Confidence 0.675 is below the global threshold, so a fifth round finds
    // nothing pending and completes.
    assert_eq!(run.result.total_iterations, 5);
    assert_eq!(run.result.trace_summary.final_phase, OrchestratorPhase::Converged);
}

/// Fails on the second goal it is asked about.
struct FailsOnSecondGoal {
    goals_seen: AtomicUsize,
    last_goal: std::sync::Mutex<String>,
}

#[async_trait]
impl ExecutionStrategy for FailsOnSecondGoal {
    async fn attempt(&self, goal: &str, _task: &str) -> DomainResult<Attempt> {
        {
            let mut last = self.last_goal.lock().unwrap();
            if *last != goal {
                *last = goal.to_string();
                self.goals_seen.fetch_add(1, Ordering::SeqCst);
            }
        }
        if self.goals_seen.load(Ordering::SeqCst) >= 2 {
            return Err(DomainError::DatabaseError("strategy backend offline".to_string()));
        }
        Ok(Attempt::new("ok", true, 0.9))
    }
}

#[tokio::test]
async fn test_strategy_failure_mid_run_fails_session_and_frees_slot() {
    let pool = Arc::new(SessionPool::new(Arc::new(InMemorySessionRepository::new()), 1));
    let service = ReasoningService::with_collaborators(
        pool.clone(),
        Config::default(),
        Arc::new(TemplateDecomposer::new()),
        Arc::new(FailsOnSecondGoal {
            goals_seen: AtomicUsize::new(0),
            last_goal: std::sync::Mutex::new(String::new()),
        }),
    );

    let err = service
        .hierarchical_reason(&ReasoningRequest::new("implement X"))
        .await
        .unwrap_err();
    match &err {
        DomainError::CollaboratorFailed(message) => {
            assert!(message.contains("strategy backend offline"));
        }
        other => panic!("Expected CollaboratorFailed, got {other:?}"),
    }

    assert_eq!(pool.active_count(), 0);
    let failed = pool.list_sessions(Some(SessionStatus::Error), 10).await.unwrap();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].final_solution.is_none());
    assert!(failed[0]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("strategy backend offline")));

    // The released slot admits the next run.
    assert!(pool.create_session().await.is_ok());
}

proptest! {
    /// Property: goals are never lost or duplicated across a run
    #[test]
    fn prop_goals_are_conserved(
        task in prop::sample::select(vec![
            "implement a parser",
            "refactor the cache layer",
            "fix the crash on startup",
            "speed up the importer",
            "write the release notes",
        ]),
        max_h in 1u32..=12,
        max_l in 3u32..=8,
    ) {
        let request = ReasoningRequest::new(task)
            .with_max_h_iterations(max_h)
            .with_max_l_cycles(max_l);
        let run = tokio_test::block_on(orchestrator().run(&request)).unwrap();

        let state = &run.strategic_state;
        let expected = hierarchos::domain::models::TaskKind::classify(task).template().len();
        prop_assert_eq!(state.completed_goals.len() + state.pending_goals.len(), expected);

        let mut ids: Vec<&str> = state
            .completed_goals
            .iter()
            .chain(&state.pending_goals)
            .map(|g| g.id.as_str())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), expected);
    }

    /// Property: rounds never exceed the bound and confidence stays in range
    #[test]
    fn prop_run_respects_bounds(
        max_h in 1u32..=12,
        threshold in 0.5f64..=1.0,
    ) {
        let request = ReasoningRequest::new("implement a rate limiter")
            .with_max_h_iterations(max_h)
            .with_convergence_threshold(threshold);
        let run = tokio_test::block_on(orchestrator().run(&request)).unwrap();

        prop_assert!(run.result.total_iterations <= max_h);
        prop_assert!(run.strategic_state.iteration <= max_h);
        prop_assert!((0.0..=0.95).contains(&run.result.confidence_score));
        prop_assert!(run.result.trace_summary.final_phase.is_terminal());
    }
}
