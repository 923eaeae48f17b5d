//! `reason`: run one hierarchical reasoning pass.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, ReasoningRequest};
use crate::services::ReasonResponse;

#[derive(Debug, Serialize)]
pub struct ReasonOutput {
    #[serde(flatten)]
    pub response: ReasonResponse,
}

impl CommandOutput for ReasonOutput {
    fn to_human(&self) -> String {
        let result = &self.response.result;
        let mut lines = vec![
            format!("Session: {}", self.response.session_id),
            format!(
                "Phase: {}  Confidence: {:.2}  Iterations: {}  Converged: {}",
                result.trace_summary.final_phase.as_str(),
                result.confidence_score,
                result.total_iterations,
                result.convergence_achieved
            ),
            String::new(),
            result.solution.primary_solution.clone(),
            String::new(),
            result.solution.implementation_notes.clone(),
        ];
        if let Some(ref warning) = result.solution.infeasibility_warning {
            lines.push(format!("Warning: {warning}"));
        }
        lines.join("\n")
    }
}

/// Build a request from CLI flags, filling gaps from configuration.
pub fn build_request(
    config: &Config,
    task: String,
    context: Option<&str>,
    max_h: Option<u32>,
    max_l: Option<u32>,
    threshold: Option<f64>,
) -> Result<ReasoningRequest> {
    let context = match context {
        Some(raw) => match serde_json::from_str::<Value>(raw).context("Invalid --context JSON")? {
            Value::Object(map) => map,
            _ => anyhow::bail!("--context must be a JSON object"),
        },
        None => Map::new(),
    };

    let defaults = &config.reasoning;
    Ok(ReasoningRequest::new(task)
        .with_context(context)
        .with_max_h_iterations(max_h.unwrap_or(defaults.h_controller.max_iterations))
        .with_max_l_cycles(max_l.unwrap_or(defaults.l_controller.max_cycles_per_h))
        .with_convergence_threshold(threshold.unwrap_or(defaults.convergence.global_threshold)))
}

pub async fn execute(config: &Config, request: ReasoningRequest, json_mode: bool) -> Result<()> {
    let service = super::open_service(config).await?;
    let response = service
        .hierarchical_reason(&request)
        .await
        .context("Reasoning failed")?;
    output(&ReasonOutput { response }, json_mode);
    Ok(())
}
