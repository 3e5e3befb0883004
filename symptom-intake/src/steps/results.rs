use async_trait::async_trait;
use intake_flow::{Context, NextAction, Result, Step, StepResult};

use crate::state;

/// Read-only report. Shows whatever the last analysis produced.
pub struct ResultsStep;

#[async_trait]
impl Step for ResultsStep {
    fn id(&self) -> &str {
        "results"
    }

    fn title(&self) -> &str {
        "Results"
    }

    async fn enter(&self, context: Context) -> Result<StepResult> {
        let html: Option<String> = context.get(state::RESULTS_HTML).await;
        Ok(StepResult::new(html, NextAction::End))
    }
}
