use async_trait::async_trait;
use intake_flow::{Context, Result, Step, StepResult};
use std::sync::Arc;
use tracing::info;

use crate::analysis;
use crate::client::IntakeBackend;

/// Entering the interview step submits everything gathered for analysis
pub struct InterviewStep {
    backend: Arc<dyn IntakeBackend>,
}

impl InterviewStep {
    pub fn new(backend: Arc<dyn IntakeBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Step for InterviewStep {
    fn id(&self) -> &str {
        "interview"
    }

    fn title(&self) -> &str {
        "Interview"
    }

    async fn enter(&self, context: Context) -> Result<StepResult> {
        info!("Running analysis");
        let html = analysis::run(&context, self.backend.as_ref()).await?;
        Ok(StepResult::wait(Some(html)))
    }
}
