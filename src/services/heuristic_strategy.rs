//! Keyword heuristic execution strategy.
//!
//! Screens a goal for contradictory or vague requirements, then scores it by
//! the kind of work its description names.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Attempt;
use crate::domain::ports::ExecutionStrategy;

/// Confidence reported for goals with contradictory requirements.
pub const CONTRADICTION_CONFIDENCE: f64 = 0.15;
/// Confidence reported for goals too vague to act on.
pub const VAGUE_CONFIDENCE: f64 = 0.25;
/// Combined goal and task text shorter than this is considered vague.
const MIN_DESCRIPTION_LEN: usize = 10;

const CONTRADICTION_REASON: &str =
    "Task contains contradictory requirements that cannot be satisfied simultaneously";
const VAGUE_REASON: &str = "Task description too vague to implement effectively";

/// `(lead, connector, keywords)`: matches when `lead` occurs, `connector`
/// occurs (or is empty), and any keyword occurs.
const CONTRADICTIONS: &[(&str, &str, &[&str])] = &[
    ("both", "and", &["sort", "reverse", "maintain", "original"]),
    ("simultaneously", "", &["opposite", "contradictory"]),
    ("returns both", "", &["true", "false"]),
    ("both", "and", &["increase", "decrease"]),
    ("maintain", "while", &["changing", "modifying"]),
];

/// `(keyword, solution prefix, confidence)`, first match wins.
const WORK_KINDS: &[(&str, &str, f64)] = &[
    ("design", "Architecture design for", 0.85),
    ("implement", "Implementation for", 0.90),
    ("test", "Test suite for", 0.80),
];
const FALLBACK_PREFIX: &str = "Solution for";
const FALLBACK_CONFIDENCE: f64 = 0.75;

/// Default [`ExecutionStrategy`]. Deterministic for a given input.
#[derive(Debug, Clone, Default)]
pub struct HeuristicStrategy;

impl HeuristicStrategy {
    pub fn new() -> Self {
        Self
    }

    /// Returns a failed attempt when the goal cannot be satisfied as stated.
    fn assess_feasibility(goal_description: &str, original_task: &str) -> Option<Attempt> {
        let combined = format!("{goal_description} {original_task}").to_lowercase();

        let contradictory = CONTRADICTIONS.iter().any(|(lead, connector, keywords)| {
            combined.contains(lead)
                && (connector.is_empty() || combined.contains(connector))
                && keywords.iter().any(|k| combined.contains(k))
        });
        if contradictory {
            return Some(Attempt::new(
                CONTRADICTION_REASON,
                false,
                CONTRADICTION_CONFIDENCE,
            ));
        }

        if combined.trim().chars().count() < MIN_DESCRIPTION_LEN {
            return Some(Attempt::new(VAGUE_REASON, false, VAGUE_CONFIDENCE));
        }

        None
    }

    fn score(goal_description: &str) -> Attempt {
        let lower = goal_description.to_lowercase();
        let (prefix, confidence) = WORK_KINDS
            .iter()
            .find(|(keyword, _, _)| lower.contains(keyword))
            .map_or((FALLBACK_PREFIX, FALLBACK_CONFIDENCE), |(_, prefix, c)| {
                (*prefix, *c)
            });

        Attempt::new(format!("{prefix}: {goal_description}"), true, confidence)
    }
}

#[async_trait]
impl ExecutionStrategy for HeuristicStrategy {
    async fn attempt(&self, goal_description: &str, original_task: &str) -> DomainResult<Attempt> {
        if let Some(rejected) = Self::assess_feasibility(goal_description, original_task) {
            tracing::debug!(goal = goal_description, reason = %rejected.solution, "Goal infeasible");
            return Ok(rejected);
        }
        Ok(Self::score(goal_description))
    }
}
