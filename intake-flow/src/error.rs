use thiserror::Error;

/// Errors raised by the step engine
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Step not found: {0}")]
    StepNotFound(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Context error: {0}")]
    ContextError(String),

    #[error("Step execution failed: {0}")]
    StepExecutionFailed(String),

    #[error("Navigation to step {target} refused from step {current}")]
    NavigationRefused { current: usize, target: usize },

    #[error("{action} is already in progress for session {session_id}")]
    Busy { session_id: String, action: String },

    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
