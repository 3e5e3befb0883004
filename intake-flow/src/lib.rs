pub mod context;
pub mod error;
pub mod runner;
pub mod step;
pub mod storage;
pub mod wizard;

// Re-export commonly used types
pub use context::Context;
pub use error::{FlowError, Result};
pub use runner::{FlowRunner, InFlight};
pub use step::{NextAction, Step, StepResult, Validation};
pub use storage::{InMemorySessionStorage, Session, SessionStorage};
pub use wizard::{ExecutionResult, ExecutionStatus, Wizard, WizardBuilder};
