use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    error::{FlowError, Result},
    step::{NextAction, Step, StepResult},
    storage::Session,
};

/// An ordered sequence of steps walked by index
pub struct Wizard {
    pub id: String,
    steps: Vec<Arc<dyn Step>>,
}

impl Wizard {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step; steps are indexed in insertion order starting at 0
    pub fn add_step(&mut self, step: Arc<dyn Step>) -> &mut Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the terminal step
    pub fn last_index(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    pub fn step(&self, index: usize) -> Option<Arc<dyn Step>> {
        self.steps.get(index).cloned()
    }

    /// Position of a step by ID
    pub fn position(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id() == step_id)
    }

    pub fn step_ids(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.id().to_string()).collect()
    }

    fn current(&self, session: &Session) -> Result<Arc<dyn Step>> {
        self.step(session.current_step)
            .ok_or_else(|| FlowError::StepNotFound(session.current_step.to_string()))
    }

    /// Validate the current step and, when it passes, move forward by one and enter the new
    /// step. Validation failures leave the session where it was.
    pub async fn advance(&self, session: &mut Session) -> Result<ExecutionResult> {
        let step = self.current(session)?;

        if session.current_step >= self.last_index() {
            debug!(session_id = %session.id, step_id = %step.id(), "Already at final step");
            return Ok(self.result_for(session, None, ExecutionStatus::Completed));
        }

        let validation = step.validate(&session.context).await?;
        if !validation.is_valid() {
            info!(
                session_id = %session.id,
                step_id = %step.id(),
                error_count = validation.errors().len(),
                "Step validation failed"
            );
            return Ok(self.result_for(
                session,
                None,
                ExecutionStatus::Rejected(validation.into_errors()),
            ));
        }

        step.commit(session.context.clone()).await?;

        session.current_step += 1;
        info!(
            session_id = %session.id,
            from = %step.id(),
            to = session.current_step,
            "Advancing wizard"
        );

        self.enter_current(session).await
    }

    /// Step back by one, floored at the first step. Nothing is validated or cleared.
    pub fn retreat(&self, session: &mut Session) -> ExecutionResult {
        session.current_step = session.current_step.saturating_sub(1);
        session.status_message = None;
        self.result_for(session, None, ExecutionStatus::WaitingForInput)
    }

    /// Jump to a step and run its entry side effect, bypassing validation
    pub async fn jump_to(&self, session: &mut Session, step_id: &str) -> Result<ExecutionResult> {
        let target = self
            .position(step_id)
            .ok_or_else(|| FlowError::StepNotFound(step_id.to_string()))?;
        session.current_step = target;
        self.enter_current(session).await
    }

    /// Display a step without running its entry side effect
    pub fn show(&self, session: &mut Session, step_id: &str) -> Result<ExecutionResult> {
        let target = self
            .position(step_id)
            .ok_or_else(|| FlowError::StepNotFound(step_id.to_string()))?;
        session.current_step = target;
        Ok(self.result_for(session, None, self.resting_status(session)))
    }

    /// Steps already visited and the one immediately after the current step are reachable
    pub fn can_navigate_to(&self, session: &Session, target: usize) -> bool {
        target < self.len() && target <= session.current_step + 1
    }

    /// Run the entry side effect of the session's current step and follow whatever
    /// action it asks for.
    pub async fn enter_current(&self, session: &mut Session) -> Result<ExecutionResult> {
        let step = self.current(session)?;
        let result: StepResult = step.enter(session.context.clone()).await?;
        session.status_message = result.status_message.clone();

        match &result.next_action {
            NextAction::WaitForInput => {
                let status = self.resting_status(session);
                Ok(self.result_for(session, result.response, status))
            }
            NextAction::ContinueAndExecute => {
                if session.current_step < self.last_index() {
                    session.current_step += 1;
                    debug!(
                        session_id = %session.id,
                        from = %step.id(),
                        to = session.current_step,
                        "Continuing to next step"
                    );
                    Box::pin(self.enter_current(session)).await
                } else {
                    Ok(self.result_for(session, result.response, ExecutionStatus::Completed))
                }
            }
            NextAction::GoTo(target_id) => {
                let target = self
                    .position(target_id)
                    .ok_or_else(|| FlowError::StepNotFound(target_id.clone()))?;
                session.current_step = target;
                Box::pin(self.enter_current(session)).await
            }
            NextAction::End => {
                Ok(self.result_for(session, result.response, ExecutionStatus::Completed))
            }
        }
    }

    fn resting_status(&self, session: &Session) -> ExecutionStatus {
        if session.current_step >= self.last_index() {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::WaitingForInput
        }
    }

    fn result_for(
        &self,
        session: &Session,
        response: Option<String>,
        status: ExecutionStatus,
    ) -> ExecutionResult {
        ExecutionResult {
            response,
            status,
            step_index: session.current_step,
            step_id: self
                .step(session.current_step)
                .map(|s| s.id().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Builder for creating wizards
pub struct WizardBuilder {
    wizard: Wizard,
}

impl WizardBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            wizard: Wizard::new(id),
        }
    }

    pub fn add_step(mut self, step: Arc<dyn Step>) -> Self {
        self.wizard.add_step(step);
        self
    }

    pub fn build(self) -> Wizard {
        self.wizard
    }
}

/// Status of a wizard transition
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub response: Option<String>,
    pub status: ExecutionStatus,
    pub step_index: usize,
    pub step_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Waiting for user input on the current step
    WaitingForInput,
    /// The current step did not validate; the messages are listed together
    Rejected(Vec<String>),
    /// The terminal step has been reached
    Completed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::WaitingForInput => "waiting_for_input",
            ExecutionStatus::Rejected(_) => "rejected",
            ExecutionStatus::Completed => "completed",
        }
    }
}
