//! Domain errors for the hierarchos reasoning system.

use thiserror::Error;
use uuid::Uuid;

/// Domain-level errors that can occur while planning, executing, or persisting
/// a hierarchical reasoning run.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Decomposer produced no goals for task: {0}")]
    EmptyDecomposition(String),

    #[error("Malformed attempt for goal {goal_id}: {reason}")]
    MalformedAttempt { goal_id: String, reason: String },

    #[error("Collaborator failed: {0}")]
    CollaboratorFailed(String),

    #[error("Maximum concurrent sessions reached ({capacity})")]
    AdmissionRejected { capacity: usize },

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Session {0} has no final solution yet")]
    SessionIncomplete(Uuid),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
