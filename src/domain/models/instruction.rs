//! Instructions issued by the strategic controller to the execution controller.

use serde::{Deserialize, Serialize};

use super::goal::Goal;

/// Expected-output tag attached to every directive.
pub const EXPECTED_OUTPUT: &str = "implementation_solution";

/// Fixed constraint set bundled with every directive.
pub const DEFAULT_CONSTRAINTS: &[&str] = &[
    "Maintain code quality",
    "Follow security best practices",
    "Ensure type safety",
];

/// Work order for a single goal attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    /// Snapshot of the goal at planning time
    pub goal: Goal,
    /// Strategy line, e.g. `Execute: <goal description>`
    pub strategy: String,
    pub constraints: Vec<String>,
    pub expected_output: String,
    /// The original task the goal was decomposed from
    pub task: String,
}

impl Directive {
    pub fn new(goal: Goal, task: impl Into<String>) -> Self {
        Self {
            strategy: format!("Execute: {}", goal.description),
            goal,
            constraints: DEFAULT_CONSTRAINTS.iter().map(|c| (*c).to_string()).collect(),
            expected_output: EXPECTED_OUTPUT.to_string(),
            task: task.into(),
        }
    }
}

/// Result of a planning step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "instruction", rename_all = "snake_case")]
pub enum Instruction {
    /// No pending goals remain.
    Complete,
    /// Attempt the bundled goal.
    Execute(Directive),
}

impl Instruction {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }

    pub fn directive(&self) -> Option<&Directive> {
        match self {
            Self::Complete => None,
            Self::Execute(directive) => Some(directive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_bundles_fixed_constraints() {
        let directive = Directive::new(Goal::new("Add tests for: x"), "x");
        assert_eq!(directive.strategy, "Execute: Add tests for: x");
        assert_eq!(directive.constraints.len(), 3);
        assert_eq!(directive.expected_output, "implementation_solution");
    }

    #[test]
    fn test_complete_has_no_directive() {
        assert!(Instruction::Complete.is_complete());
        assert!(Instruction::Complete.directive().is_none());
    }
}
