//! Domain models for reasoning sessions.
//!
//! A session wraps one strategic state, optionally the last execution-state
//! snapshot, a lifecycle status, and the final solution once complete.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::execution::ExecutionState;
use super::reasoning::ReasoningResult;
use super::strategic::StrategicState;

/// Session lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Reasoning run admitted and in progress
    #[default]
    Active,
    /// Run finished and a final solution is stored
    Completed,
    /// Run was orphaned or exceeded its time budget
    Timeout,
    /// Run failed with an error
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Timeout => "timeout",
            Self::Error => "error",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "completed" | "complete" => Some(Self::Completed),
            "timeout" => Some(Self::Timeout),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Returns true if no further transitions are expected.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

/// A persisted reasoning session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    pub id: Uuid,

    /// Current lifecycle status
    pub status: SessionStatus,

    /// Strategic controller state
    pub strategic_state: Option<StrategicState>,

    /// Snapshot of the last execution controller invocation
    pub execution_state: Option<ExecutionState>,

    /// Final result, once the session is completed
    pub final_solution: Option<ReasoningResult>,

    /// Error message, when the session failed
    pub error: Option<String>,

    /// Session creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a new active session with a fresh UUID
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Creates a new active session with the given identifier
    pub fn with_id(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: SessionStatus::Active,
            strategic_state: None,
            execution_state: None,
            final_solution: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Store the final controller state and result, and mark the session completed
    pub fn complete(
        &mut self,
        result: ReasoningResult,
        strategic_state: StrategicState,
        execution_state: Option<ExecutionState>,
    ) {
        self.final_solution = Some(result);
        self.strategic_state = Some(strategic_state);
        self.execution_state = execution_state;
        self.update_status(SessionStatus::Completed);
    }

    /// Store a result that arrived after the session left the active state.
    /// The status is left as it is.
    pub fn attach_late_result(
        &mut self,
        result: ReasoningResult,
        strategic_state: StrategicState,
        execution_state: Option<ExecutionState>,
    ) {
        self.final_solution = Some(result);
        self.strategic_state = Some(strategic_state);
        self.execution_state = execution_state;
        self.updated_at = Utc::now();
    }

    /// Mark the session failed with the given message
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.update_status(SessionStatus::Error);
    }

    /// Updates session status
    pub fn update_status(&mut self, status: SessionStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Returns true if session is active
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// The instant `age` before now, or `None` when that lies outside the
/// representable range and so nothing can be old enough.
pub fn cutoff_before(age: Duration) -> Option<DateTime<Utc>> {
    Utc::now().checked_sub_signed(age)
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_active() {
        let session = Session::new();
        assert!(session.is_active());
        assert!(session.final_solution.is_none());
        assert_eq!(session.created_at, session.updated_at);
    }

    #[test]
    fn test_fail_records_message() {
        let mut session = Session::new();
        session.fail("decomposer exploded");
        assert_eq!(session.status, SessionStatus::Error);
        assert_eq!(session.error.as_deref(), Some("decomposer exploded"));
        assert!(session.status.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            SessionStatus::Active,
            SessionStatus::Completed,
            SessionStatus::Timeout,
            SessionStatus::Error,
        ] {
            assert_eq!(SessionStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(SessionStatus::from_str("paused"), None);
    }

    #[test]
    fn test_cutoff_before_unrepresentable_age() {
        assert!(cutoff_before(Duration::days(i64::from(u32::MAX))).is_none());
        let cutoff = cutoff_before(Duration::days(7)).unwrap();
        assert!(cutoff < Utc::now());
    }

    #[test]
    fn test_serde_uses_lowercase_status() {
        let json = serde_json::to_value(SessionStatus::Timeout).unwrap();
        assert_eq!(json, serde_json::json!("timeout"));
    }
}
