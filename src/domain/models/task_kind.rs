//! Task classification.
//!
//! A task description is classified into a closed set of kinds by a pure
//! keyword function. Each kind maps to a fixed goal template; the template
//! decomposer consumes this table so the control loop never dispatches on
//! strings.

use serde::{Deserialize, Serialize};

use super::goal::Goal;

/// Closed classification of an incoming task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Implementation,
    Refactoring,
    Debugging,
    Optimization,
}

const IMPLEMENTATION_KEYWORDS: &[&str] = &["implement", "create", "build", "develop"];
const REFACTORING_KEYWORDS: &[&str] = &["refactor", "restructure", "improve"];
const DEBUGGING_KEYWORDS: &[&str] = &["debug", "fix", "resolve", "solve"];

const IMPLEMENTATION_TEMPLATE: &[&str] = &[
    "Design architecture for: {task}",
    "Implement core logic for: {task}",
    "Add error handling for: {task}",
    "Add tests for: {task}",
];
const REFACTORING_TEMPLATE: &[&str] = &[
    "Analyze current structure: {task}",
    "Design new structure: {task}",
    "Apply refactoring: {task}",
];
const ANALYSIS_TEMPLATE: &[&str] = &["Analyze problem: {task}", "Generate solution: {task}"];

impl TaskKind {
    /// Classify a task description. Keyword groups are checked in order
    /// implementation, refactoring, debugging; anything else is optimization.
    pub fn classify(task: &str) -> Self {
        let lower = task.to_lowercase();
        let contains_any = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if contains_any(IMPLEMENTATION_KEYWORDS) {
            Self::Implementation
        } else if contains_any(REFACTORING_KEYWORDS) {
            Self::Refactoring
        } else if contains_any(DEBUGGING_KEYWORDS) {
            Self::Debugging
        } else {
            Self::Optimization
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Implementation => "implementation",
            Self::Refactoring => "refactoring",
            Self::Debugging => "debugging",
            Self::Optimization => "optimization",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "implementation" => Some(Self::Implementation),
            "refactoring" => Some(Self::Refactoring),
            "debugging" => Some(Self::Debugging),
            "optimization" => Some(Self::Optimization),
            _ => None,
        }
    }

    /// Goal description template for this kind; `{task}` is substituted.
    pub fn template(&self) -> &'static [&'static str] {
        match self {
            Self::Implementation => IMPLEMENTATION_TEMPLATE,
            Self::Refactoring => REFACTORING_TEMPLATE,
            Self::Debugging | Self::Optimization => ANALYSIS_TEMPLATE,
        }
    }

    /// Instantiate the template for a concrete task.
    pub fn goals_for(&self, task: &str) -> Vec<Goal> {
        self.template()
            .iter()
            .map(|line| Goal::new(line.replace("{task}", task)))
            .collect()
    }
}
