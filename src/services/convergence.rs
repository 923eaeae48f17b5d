//! Convergence detection.
//!
//! Stateless checks shared by both controllers:
//!
//! - **Local** -- the tail of a confidence history has stopped moving.
//! - **Global** -- every goal has been attempted and aggregate confidence is high enough.
//! - **Progress** -- completion ratio with a small confidence tie-breaker.
//! - **Early termination** -- the iteration budget is spent or recent decisions
//!   have been persistently low-confidence.

use crate::domain::models::StrategicState;

/// Default stability threshold for local convergence.
pub const DEFAULT_LOCAL_THRESHOLD: f64 = 0.95;
/// Default minimum history length for local convergence.
pub const DEFAULT_MIN_ITERATIONS: usize = 3;
/// Default number of trailing values inspected for local convergence.
pub const DEFAULT_STABILITY_WINDOW: usize = 3;
/// Default confidence threshold for global convergence.
pub const DEFAULT_GLOBAL_THRESHOLD: f64 = 0.85;
/// Default number of decisions averaged by the early-termination check.
pub const DEFAULT_NO_PROGRESS_LIMIT: usize = 3;
/// Mean recent decision confidence below which a run is considered stuck.
pub const NO_PROGRESS_CONFIDENCE: f64 = 0.3;
/// Weight of aggregate confidence in the progress score.
const CONFIDENCE_BONUS_WEIGHT: f64 = 0.2;

/// Pure convergence checks. Holds no state.
pub struct ConvergenceDetector;

impl ConvergenceDetector {
    /// True when the last `stability_window` values all lie strictly within
    /// `1 - threshold` of their mean.
    ///
    /// Fails closed when the history is shorter than `min_iterations` or than
    /// the window. Does not require monotonic improvement, only a flat tail.
    pub fn check_local_convergence(
        history: &[f64],
        threshold: f64,
        min_iterations: usize,
        stability_window: usize,
    ) -> bool {
        if history.len() < min_iterations {
            return false;
        }
        if stability_window == 0 || history.len() < stability_window {
            return false;
        }

        let recent = &history[history.len() - stability_window..];
        let mean = recent.iter().sum::<f64>() / recent.len() as f64;
        let tolerance = 1.0 - threshold;

        recent.iter().all(|score| (score - mean).abs() < tolerance)
    }

    /// Local convergence with the default minimum length and window.
    pub fn check_local_convergence_default(history: &[f64], threshold: f64) -> bool {
        Self::check_local_convergence(
            history,
            threshold,
            DEFAULT_MIN_ITERATIONS,
            DEFAULT_STABILITY_WINDOW,
        )
    }

    /// True only if at least one goal was attempted, none are pending, and
    /// aggregate confidence reaches `confidence_threshold`.
    pub fn check_global_convergence(state: &StrategicState, confidence_threshold: f64) -> bool {
        if state.completed_goals.is_empty() {
            return false;
        }
        if !state.pending_goals.is_empty() {
            return false;
        }
        state.overall_confidence >= confidence_threshold
    }

    /// Completion ratio plus `0.2 * overall_confidence`, capped at 1.
    /// Zero when the ledger is empty.
    pub fn calculate_progress_score(state: &StrategicState) -> f64 {
        let total = state.total_goals();
        if total == 0 {
            return 0.0;
        }

        let ratio = state.completed_goals.len() as f64 / total as f64;
        let bonus = state.overall_confidence * CONFIDENCE_BONUS_WEIGHT;
        (ratio + bonus).min(1.0)
    }

    /// Safety valve independent of convergence.
    ///
    /// True once `iteration >= max_iterations`, or when at least
    /// `no_progress_limit` decisions exist and the mean confidence of the most
    /// recent `no_progress_limit` is below 0.3.
    pub fn should_terminate_early(
        state: &StrategicState,
        max_iterations: u32,
        no_progress_limit: usize,
    ) -> bool {
        if state.iteration >= max_iterations {
            return true;
        }

        state
            .recent_decision_confidence(no_progress_limit)
            .is_some_and(|mean| mean < NO_PROGRESS_CONFIDENCE)
    }
}
