//! Domain models for the hierarchical reasoning loop.

pub mod config;
pub mod execution;
pub mod goal;
pub mod instruction;
pub mod reasoning;
pub mod session;
pub mod strategic;
pub mod task_kind;

pub use config::{
    Config, ConvergenceConfig, ExecutionControllerConfig, LoggingConfig, PersistenceConfig,
    ReasoningConfig, ServerConfig, StrategicControllerConfig,
};
pub use execution::{Attempt, ExecutionState, ExecutionTrace, Outcome};
pub use goal::Goal;
pub use instruction::{Directive, Instruction, DEFAULT_CONSTRAINTS, EXPECTED_OUTPUT};
pub use reasoning::{
    OrchestratorPhase, ReasoningRequest, ReasoningResult, SolutionReport, TraceSummary, Verbosity,
};
pub use session::{Session, SessionStatus};
pub use strategic::{DecisionKind, StrategicDecision, StrategicState};
pub use task_kind::TaskKind;
