//! `analyze`: metrics and advice for a completed session.

use anyhow::{Context, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::services::TraceAnalysis;

#[derive(Debug, Serialize)]
pub struct AnalyzeOutput {
    #[serde(flatten)]
    pub analysis: TraceAnalysis,
}

impl CommandOutput for AnalyzeOutput {
    fn to_human(&self) -> String {
        let a = &self.analysis;
        let s = &a.session_summary;
        let mut lines = vec![
            format!("Session: {}", a.session_id),
            format!("Iterations: {}", s.total_iterations),
            format!("Computation time: {:.3}s", s.computation_time_secs),
            format!("Converged: {}", s.convergence_achieved),
            format!("Final confidence: {:.2}", s.final_confidence),
            format!(
                "Iterations/sec: {:.2}  Convergence efficiency: {:.1}",
                a.performance_metrics.iterations_per_second,
                a.performance_metrics.convergence_efficiency
            ),
        ];
        for advice in &a.bottleneck_analysis.recommendations {
            lines.push(format!("- {advice}"));
        }
        lines.join("\n")
    }
}

pub async fn execute(config: &Config, session_id: &str, json_mode: bool) -> Result<()> {
    let id = Uuid::parse_str(session_id)
        .with_context(|| format!("Invalid session id: {session_id}"))?;
    let service = super::open_service(config).await?;
    let analysis = service
        .analyze_session(id)
        .await
        .context("Analysis failed")?;
    output(&AnalyzeOutput { analysis }, json_mode);
    Ok(())
}
