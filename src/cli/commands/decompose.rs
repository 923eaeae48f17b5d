//! `decompose`: show a task's goals without executing them.

use anyhow::{Context, Result};
use comfy_table::Cell;
use serde::Serialize;

use crate::cli::output::{list_table, output, CommandOutput};
use crate::domain::models::Config;
use crate::services::Decomposition;

#[derive(Debug, Serialize)]
pub struct DecomposeOutput {
    #[serde(flatten)]
    pub decomposition: Decomposition,
}

impl CommandOutput for DecomposeOutput {
    fn to_human(&self) -> String {
        let d = &self.decomposition;
        let mut table = list_table(&["#", "id", "goal"]);
        for (i, goal) in d.subtasks.iter().enumerate() {
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(&goal.id),
                Cell::new(&goal.description),
            ]);
        }
        format!(
            "Task kind: {}  Subtasks: {}  Complexity: {:.2}\n{table}",
            d.task_kind.as_str(),
            d.total_subtasks,
            d.estimated_complexity
        )
    }
}

pub async fn execute(config: &Config, task: &str, json_mode: bool) -> Result<()> {
    let service = super::open_service(config).await?;
    let decomposition = service
        .decompose_task(task)
        .await
        .context("Decomposition failed")?;
    output(&DecomposeOutput { decomposition }, json_mode);
    Ok(())
}
