use async_trait::async_trait;
use intake_flow::{Context, Result, Step};
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::IntakeBackend;
use crate::history::{self, HistoryQuestionnaire};
use crate::models::PatientSummary;
use crate::state;
use crate::summary;

/// Optional questionnaire about the patient's history. Leaving the step produces the
/// patient summary.
pub struct HistoryFollowupStep {
    backend: Arc<dyn IntakeBackend>,
}

impl HistoryFollowupStep {
    pub fn new(backend: Arc<dyn IntakeBackend>) -> Self {
        Self { backend }
    }
}

/// Ask the backend for history questions, falling back to ones derived from the patient
pub async fn generate_questions(context: &Context, backend: &dyn IntakeBackend) -> Result<HistoryQuestionnaire> {
    let form = state::load_form(context).await;
    let generated = match backend.generate_followup_questions(&form.patient_profile()).await {
        Ok(body) => HistoryQuestionnaire::from_response(&body),
        Err(e) => {
            warn!(error = %e, "Follow-up question generation failed");
            None
        }
    };

    let questionnaire = generated.unwrap_or_else(|| {
        info!("Using fallback history questions");
        HistoryQuestionnaire::new(history::fallback_questions(&form), true)
    });
    info!(
        questions = questionnaire.questions.len(),
        fallback = questionnaire.fallback,
        "History questionnaire ready"
    );
    context.set(state::HISTORY, &questionnaire).await?;
    Ok(questionnaire)
}

pub async fn summarize(context: &Context, backend: &dyn IntakeBackend) -> Result<PatientSummary> {
    let form = state::load_form(context).await;
    let summary = match backend.generate_patient_summary(&form).await {
        Ok(body) => summary::from_response(&body),
        Err(e) => {
            warn!(error = %e, "Patient summary generation failed");
            None
        }
    }
    .unwrap_or_else(|| summary::fallback(&form));
    context.set(state::PATIENT_SUMMARY, &summary).await?;
    Ok(summary)
}

#[async_trait]
impl Step for HistoryFollowupStep {
    fn id(&self) -> &str {
        "patient_history_followup"
    }

    fn title(&self) -> &str {
        "Patient History Followup"
    }

    async fn commit(&self, context: Context) -> Result<()> {
        info!("Generating patient summary");
        summarize(&context, self.backend.as_ref()).await?;
        Ok(())
    }
}
