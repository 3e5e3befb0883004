use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{context::Context, error::Result};

/// Outcome of validating the step a user is trying to leave
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    errors: Vec<String>,
}

impl Validation {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

/// Result of entering a step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Rendered content to show for the step
    pub response: Option<String>,
    /// Next action to take
    pub next_action: NextAction,
    /// Short human-readable status
    pub status_message: Option<String>,
}

impl StepResult {
    pub fn new(response: Option<String>, next_action: NextAction) -> Self {
        Self {
            response,
            next_action,
            status_message: None,
        }
    }

    pub fn new_with_status(
        response: Option<String>,
        next_action: NextAction,
        status_message: Option<String>,
    ) -> Self {
        Self {
            response,
            next_action,
            status_message,
        }
    }

    /// Stay on the step and wait for the user.
    pub fn wait(response: Option<String>) -> Self {
        Self::new(response, NextAction::WaitForInput)
    }
}

/// Defines what should happen after a step has been entered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextAction {
    /// Stay on the entered step until the user acts
    WaitForInput,
    /// Move on to the following step and enter it immediately
    ContinueAndExecute,
    /// Jump to a specific step by ID and enter it
    GoTo(String),
    /// The wizard has reached its terminal step
    End,
}

/// Core trait that all wizard steps implement
#[async_trait]
pub trait Step: Send + Sync {
    /// Unique identifier for this step
    fn id(&self) -> &str;

    /// Display name shown in navigation
    fn title(&self) -> &str {
        self.id()
    }

    /// Check the user's input before the wizard leaves this step.
    async fn validate(&self, _context: &Context) -> Result<Validation> {
        Ok(Validation::ok())
    }

    /// Persist validated input. Runs only after `validate` passed.
    async fn commit(&self, _context: Context) -> Result<()> {
        Ok(())
    }

    /// Side effect run when the wizard arrives at this step.
    async fn enter(&self, _context: Context) -> Result<StepResult> {
        Ok(StepResult::wait(None))
    }
}
