use intake_flow::{FlowRunner, SessionStorage, Wizard, WizardBuilder};
use std::sync::Arc;

use crate::client::IntakeBackend;
use crate::steps::*;

pub const WIZARD_ID: &str = "symptom_intake";

/// The seven intake steps in the order they are walked
pub fn build_intake_wizard(backend: Arc<dyn IntakeBackend>) -> Wizard {
    WizardBuilder::new(WIZARD_ID)
        .add_step(Arc::new(CaseTypeStep))
        .add_step(Arc::new(PatientStep))
        .add_step(Arc::new(VitalsStep))
        .add_step(Arc::new(HistoryFollowupStep::new(backend.clone())))
        .add_step(Arc::new(SymptomEntryStep::new(backend.clone())))
        .add_step(Arc::new(InterviewStep::new(backend)))
        .add_step(Arc::new(ResultsStep))
        .build()
}

pub fn create_flow_runner(
    backend: Arc<dyn IntakeBackend>,
    session_storage: Arc<dyn SessionStorage>,
) -> FlowRunner {
    let wizard = Arc::new(build_intake_wizard(backend));
    FlowRunner::new(wizard, session_storage)
}
