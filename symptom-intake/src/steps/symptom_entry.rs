use async_trait::async_trait;
use intake_flow::{Context, NextAction, Result, Step, StepResult, Validation};
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::IntakeBackend;
use crate::interview::{self, InterviewState, QuestionPayload};
use crate::render;
use crate::state;
use crate::validation;

/// Symptom search and description. Entering the step asks the backend what to ask next.
pub struct SymptomEntryStep {
    backend: Arc<dyn IntakeBackend>,
}

impl SymptomEntryStep {
    pub fn new(backend: Arc<dyn IntakeBackend>) -> Self {
        Self { backend }
    }
}

/// Submit the form to `/submit_symptoms` and store what the interview should show.
///
/// Network failures and unusable replies both end in the fallback question table.
pub async fn request_questions(context: &Context, backend: &dyn IntakeBackend) -> Result<InterviewState> {
    let form = state::load_form(context).await;
    let payload = match backend.submit_symptoms(&form).await {
        Ok(body) => QuestionPayload::classify(&body),
        Err(e) => {
            warn!(error = %e, "Follow-up question request failed");
            QuestionPayload::Malformed
        }
    };
    if payload == QuestionPayload::Malformed {
        info!("Using fallback structured questions");
    }

    let interview = InterviewState::from_payload(payload);
    context.set(state::INTERVIEW, &interview).await?;
    Ok(interview)
}

pub async fn interview_panel(context: &Context) -> String {
    let interview: InterviewState = context.get(state::INTERVIEW).await.unwrap_or_default();
    let form = state::load_form(context).await;
    render::interview::panel(&interview, interview::progress(&form))
}

#[async_trait]
impl Step for SymptomEntryStep {
    fn id(&self) -> &str {
        "symptom_entry"
    }

    fn title(&self) -> &str {
        "Symptom Entry"
    }

    async fn validate(&self, context: &Context) -> Result<Validation> {
        let form = state::load_form(context).await;
        let free_text: String = state::load_draft(context, state::DRAFT_FREE_TEXT).await;
        Ok(validation::symptoms(&form.symptoms, Some(free_text.as_str())))
    }

    async fn commit(&self, context: Context) -> Result<()> {
        let free_text: String = state::load_draft(&context, state::DRAFT_FREE_TEXT).await;
        let mut form = state::load_form(&context).await;
        let trimmed = free_text.trim();
        form.free_text_symptoms = (!trimmed.is_empty()).then(|| trimmed.to_string());
        state::store_form(&context, &form).await
    }

    async fn enter(&self, context: Context) -> Result<StepResult> {
        info!("Requesting follow-up questions");
        let interview = request_questions(&context, self.backend.as_ref()).await?;

        if interview == InterviewState::Completed {
            return Ok(StepResult::new_with_status(
                None,
                NextAction::ContinueAndExecute,
                Some("No further questions, analysing symptoms".to_string()),
            ));
        }

        Ok(StepResult::wait(Some(interview_panel(&context).await)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use serde_json::json;

    #[tokio::test]
    async fn network_failure_shows_fallback_questions() {
        let step = SymptomEntryStep::new(Arc::new(FakeBackend::default()));
        let context = Context::new();

        let result = step.enter(context.clone()).await.unwrap();

        assert_eq!(result.next_action, NextAction::WaitForInput);
        let html = result.response.unwrap();
        assert_eq!(html.matches("symptom-question-row").count(), 18);
        let interview: InterviewState = context.get(state::INTERVIEW).await.unwrap();
        assert!(matches!(interview, InterviewState::Structured { fallback: true, .. }));
    }

    #[tokio::test]
    async fn completed_reply_continues() {
        let backend = FakeBackend::default().with_submit(json!({ "completed": true }));
        let step = SymptomEntryStep::new(Arc::new(backend));

        let result = step.enter(Context::new()).await.unwrap();
        assert_eq!(result.next_action, NextAction::ContinueAndExecute);
    }

    #[tokio::test]
    async fn needs_a_symptom_or_description() {
        let step = SymptomEntryStep::new(Arc::new(FakeBackend::default()));
        let context = Context::new();
        assert!(!step.validate(&context).await.unwrap().is_valid());

        context.set(state::DRAFT_FREE_TEXT, "  sore throat ").await.unwrap();
        assert!(step.validate(&context).await.unwrap().is_valid());

        step.commit(context.clone()).await.unwrap();
        assert_eq!(
            state::load_form(&context).await.free_text_symptoms.as_deref(),
            Some("sore throat")
        );
    }
}
