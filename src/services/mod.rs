pub mod convergence;
pub mod execution_controller;
pub mod heuristic_strategy;
pub mod orchestrator;
pub mod reasoning_service;
pub mod session_janitor;
pub mod session_pool;
pub mod strategic_controller;
pub mod template_decomposer;

pub use convergence::ConvergenceDetector;
pub use execution_controller::{ExecutionController, ExecutionSettings};
pub use heuristic_strategy::HeuristicStrategy;
pub use orchestrator::{compile_solution, OrchestrationRun, Orchestrator};
pub use reasoning_service::{
    Decomposition, ReasonResponse, ReasoningService, Refinement, TraceAnalysis,
};
pub use session_janitor::{JanitorConfig, JanitorHandle, MaintenanceReport, SessionJanitor};
pub use session_pool::SessionPool;
pub use strategic_controller::StrategicController;
pub use template_decomposer::TemplateDecomposer;
