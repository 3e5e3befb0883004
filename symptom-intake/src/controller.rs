//! Every action a client can take against an intake session.
//!
//! Actions follow the runner's _lock → load → mutate → save_ pattern. A user mistake is
//! reported as a rejected [`ExecutionResult`] carrying the message to show; only engine and
//! storage failures come back as errors.

use chrono::Utc;
use intake_flow::{ExecutionResult, ExecutionStatus, FlowRunner, Result, Session};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::analysis;
use crate::client::{IntakeBackend, ServerStatus};
use crate::drafts;
use crate::history::{HistoryError, HistoryQuestionnaire};
use crate::interview::{self, DynamicAnswer, FollowupReply, InterviewState, StructuredRow};
use crate::labels;
use crate::models::{
    CaseTypeSelection, FileUploadRequest, FormState, PatientInput, PatientSummary, UploadedFile,
    VitalsInput,
};
use crate::render;
use crate::state;
use crate::steps::{history_followup, symptom_entry};
use crate::suggestions::{SuggestionOutcome, SuggestionRegistry};
use crate::view;

pub const ANSWER_REQUIRED: &str = "Please provide an answer before continuing.";
pub const STRUCTURED_ANSWER_REQUIRED: &str = "Please answer at least some questions before submitting.";

/// Suggestion lookup outcome plus the dropdown to show for it, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionReply {
    pub lookup: SuggestionOutcome,
    pub html: Option<String>,
}

pub struct IntakeController {
    runner: FlowRunner,
    backend: Arc<dyn IntakeBackend>,
    suggestions: SuggestionRegistry,
}

impl IntakeController {
    pub fn new(runner: FlowRunner, backend: Arc<dyn IntakeBackend>, debounce: Duration) -> Self {
        Self {
            runner,
            backend,
            suggestions: SuggestionRegistry::new(debounce),
        }
    }

    pub fn runner(&self) -> &FlowRunner {
        &self.runner
    }

    fn finish(&self, session: &Session, response: Option<String>, status: ExecutionStatus) -> ExecutionResult {
        ExecutionResult {
            response,
            status,
            step_index: session.current_step,
            step_id: self
                .runner
                .wizard()
                .step(session.current_step)
                .map(|s| s.id().to_string())
                .unwrap_or_default(),
        }
    }

    fn result_at(&self, session: &Session, response: Option<String>) -> ExecutionResult {
        let status = if session.current_step >= self.runner.wizard().last_index() {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::WaitingForInput
        };
        self.finish(session, response, status)
    }

    fn rejected(&self, session: &Session, message: impl Into<String>) -> ExecutionResult {
        let message = message.into();
        info!(session_id = %session.id, %message, "Action rejected");
        self.finish(session, None, ExecutionStatus::Rejected(vec![message]))
    }

    pub async fn create(&self) -> Result<Session> {
        let session = self.runner.create().await?;
        info!(session_id = %session.id, "Intake session started");
        Ok(session)
    }

    /// Drop a session with everything kept for it, so a restart begins from nothing
    pub async fn abandon(&self, session_id: &str) -> Result<()> {
        self.runner.remove(session_id).await?;
        self.suggestions.forget(session_id);
        info!(%session_id, "Intake session abandoned");
        Ok(())
    }

    /// Abandon a session and start a fresh one in its place
    pub async fn restart(&self, session_id: &str) -> Result<Session> {
        self.abandon(session_id).await?;
        self.create().await
    }

    /// Everything a client needs to draw the current step
    pub async fn view(&self, session_id: &str) -> Result<Value> {
        let session = self.runner.load(session_id).await?;
        Ok(view::render(self.runner.wizard(), &session).await)
    }

    pub async fn next(&self, session_id: &str) -> Result<ExecutionResult> {
        self.runner.next(session_id).await
    }

    pub async fn prev(&self, session_id: &str) -> Result<ExecutionResult> {
        self.runner.prev(session_id).await
    }

    pub async fn navigate(&self, session_id: &str, target: usize) -> Result<ExecutionResult> {
        self.runner.navigate(session_id, target).await
    }

    pub async fn select_case_type(&self, session_id: &str, selection: CaseTypeSelection) -> Result<ExecutionResult> {
        let _guard = self.runner.acquire(session_id).await;
        let session = self.runner.load(session_id).await?;
        session
            .context
            .set(state::DRAFT_CASE_TYPE, selection.case_type.trim())
            .await?;
        let result = self.result_at(&session, None);
        self.runner.save(session).await?;
        Ok(result)
    }

    /// Merge a patient form update. Age and date of birth take effect immediately.
    pub async fn update_patient(&self, session_id: &str, update: PatientInput) -> Result<ExecutionResult> {
        let _guard = self.runner.acquire(session_id).await;
        let session = self.runner.load(session_id).await?;
        let context = &session.context;

        let mut form = state::load_form(context).await;
        let mut draft: PatientInput = state::load_draft(context, state::DRAFT_PATIENT).await;
        drafts::apply_patient_update(&mut form, &mut draft, update, Utc::now().date_naive());
        context.set(state::DRAFT_PATIENT, &draft).await?;
        state::store_form(context, &form).await?;

        let result = self.result_at(&session, draft.age.clone());
        self.runner.save(session).await?;
        Ok(result)
    }

    /// Merge a vitals form update and recompute BMI. The response is the BMI to display,
    /// absent while weight or height is missing.
    pub async fn update_vitals(&self, session_id: &str, update: VitalsInput) -> Result<ExecutionResult> {
        let _guard = self.runner.acquire(session_id).await;
        let session = self.runner.load(session_id).await?;
        let context = &session.context;

        let mut draft: VitalsInput = state::load_draft(context, state::DRAFT_VITALS).await;
        draft.merge(update);
        let mut form = state::load_form(context).await;
        let bmi = drafts::refresh_bmi(&mut form, &draft);
        context.set(state::DRAFT_VITALS, &draft).await?;
        state::store_form(context, &form).await?;

        let result = self.result_at(&session, bmi.map(|b| b.display()));
        self.runner.save(session).await?;
        Ok(result)
    }

    /// Remember an uploaded document. Only its metadata is kept.
    pub async fn record_upload(&self, session_id: &str, upload: FileUploadRequest) -> Result<ExecutionResult> {
        let _guard = self.runner.acquire(session_id).await;
        let session = self.runner.load(session_id).await?;
        if upload.field_id.trim().is_empty() || upload.name.trim().is_empty() {
            return Ok(self.rejected(&session, "No file selected"));
        }

        let mut form = state::load_form(&session.context).await;
        info!(session_id = %session.id, field = %upload.field_id, file = %upload.name, "Document uploaded");
        form.uploaded_files.insert(
            upload.field_id,
            UploadedFile {
                name: upload.name,
                size: upload.size,
                content_type: upload.content_type,
                uploaded_at: Utc::now(),
            },
        );
        state::store_form(&session.context, &form).await?;

        let result = self.result_at(&session, None);
        self.runner.save(session).await?;
        Ok(result)
    }

    /// Debounced symptom search. Runs outside the session lock so that a newer keystroke
    /// can supersede a pending one.
    pub async fn suggestions(&self, session_id: &str, query: &str) -> Result<SuggestionReply> {
        let session = self.runner.load(session_id).await?;
        let lookup = self.suggestions.for_session(session_id);
        let outcome = lookup
            .lookup(query, self.suggestions.debounce(), self.backend.as_ref())
            .await;

        let html = match &outcome {
            SuggestionOutcome::Cached(found) | SuggestionOutcome::Fetched(found) => {
                let form = state::load_form(&session.context).await;
                Some(render::symptoms::suggestions(found, &form.symptoms))
            }
            SuggestionOutcome::Failed(message) => Some(render::symptoms::suggestions_error(message)),
            _ => None,
        };
        Ok(SuggestionReply { lookup: outcome, html })
    }

    pub async fn add_symptom(&self, session_id: &str, symptom: &str) -> Result<ExecutionResult> {
        let _guard = self.runner.acquire(session_id).await;
        let session = self.runner.load(session_id).await?;
        let symptom = symptom.trim();
        if symptom.is_empty() {
            return Ok(self.rejected(&session, "Please enter a symptom"));
        }

        let mut form = state::load_form(&session.context).await;
        if form.add_symptom(symptom) {
            info!(session_id = %session.id, %symptom, "Symptom added");
            state::store_form(&session.context, &form).await?;
        }

        let result = self.result_at(&session, Some(render::symptoms::selected_tags(&form.symptoms)));
        self.runner.save(session).await?;
        Ok(result)
    }

    /// Removing a symptom that is not selected changes nothing
    pub async fn remove_symptom(&self, session_id: &str, symptom: &str) -> Result<ExecutionResult> {
        let _guard = self.runner.acquire(session_id).await;
        let session = self.runner.load(session_id).await?;

        let mut form = state::load_form(&session.context).await;
        if form.remove_symptom(symptom.trim()) {
            state::store_form(&session.context, &form).await?;
        }

        let result = self.result_at(&session, Some(render::symptoms::selected_tags(&form.symptoms)));
        self.runner.save(session).await?;
        Ok(result)
    }

    /// Keep the free-text description and refresh the extracted labels
    pub async fn update_free_text(&self, session_id: &str, text: &str) -> Result<ExecutionResult> {
        let _guard = self.runner.acquire(session_id).await;
        let session = self.runner.load(session_id).await?;
        session.context.set(state::DRAFT_FREE_TEXT, text).await?;
        let html = labels::refresh(&session.context, self.backend.as_ref()).await?;

        let result = self.result_at(&session, html);
        self.runner.save(session).await?;
        Ok(result)
    }

    /// Explicit label analysis. Fails with `Busy` while a previous request is in flight.
    pub async fn analyze_labels(&self, session_id: &str) -> Result<ExecutionResult> {
        let _running = self.runner.try_begin(session_id, "label analysis")?;
        let _guard = self.runner.acquire(session_id).await;
        let session = self.runner.load(session_id).await?;
        if !labels::has_input(&session.context).await {
            return Ok(self.rejected(&session, labels::NOTHING_TO_ANALYZE));
        }

        let html = labels::refresh(&session.context, self.backend.as_ref()).await?;
        let result = self.result_at(&session, html);
        self.runner.save(session).await?;
        Ok(result)
    }

    pub async fn history_generate(&self, session_id: &str) -> Result<ExecutionResult> {
        let _guard = self.runner.acquire(session_id).await;
        let session = self.runner.load(session_id).await?;
        let questionnaire =
            history_followup::generate_questions(&session.context, self.backend.as_ref()).await?;

        let html = render::history::panel(Some(&questionnaire), None);
        let result = self.result_at(&session, Some(html));
        self.runner.save(session).await?;
        Ok(result)
    }

    async fn with_history<F>(&self, session_id: &str, action: F) -> Result<ExecutionResult>
    where
        F: FnOnce(&mut HistoryQuestionnaire, &mut FormState) -> std::result::Result<(), HistoryError>,
    {
        let _guard = self.runner.acquire(session_id).await;
        let session = self.runner.load(session_id).await?;
        let context = &session.context;

        let Some(mut questionnaire) = context.get::<HistoryQuestionnaire>(state::HISTORY).await else {
            return Ok(self.rejected(&session, HistoryError::NotStarted.to_string()));
        };
        let mut form = state::load_form(context).await;
        if let Err(e) = action(&mut questionnaire, &mut form) {
            return Ok(self.rejected(&session, e.to_string()));
        }
        context.set(state::HISTORY, &questionnaire).await?;
        state::store_form(context, &form).await?;

        let summary: Option<PatientSummary> = context.get(state::PATIENT_SUMMARY).await;
        let html = render::history::panel(Some(&questionnaire), summary.as_ref());
        let result = self.result_at(&session, Some(html));
        self.runner.save(session).await?;
        Ok(result)
    }

    pub async fn history_answer(&self, session_id: &str, answer: &str) -> Result<ExecutionResult> {
        self.with_history(session_id, |q, form| q.answer_and_next(form, answer))
            .await
    }

    pub async fn history_previous(&self, session_id: &str) -> Result<ExecutionResult> {
        self.with_history(session_id, |q, _| {
            q.previous();
            Ok(())
        })
        .await
    }

    pub async fn history_complete(&self, session_id: &str, answer: &str) -> Result<ExecutionResult> {
        self.with_history(session_id, |q, form| q.complete(form, answer))
            .await
    }

    pub async fn history_review(&self, session_id: &str) -> Result<ExecutionResult> {
        self.with_history(session_id, |q, _| {
            q.review();
            Ok(())
        })
        .await
    }

    /// Show symptom entry straight away, without leaving the history step the usual way
    pub async fn history_proceed(&self, session_id: &str) -> Result<ExecutionResult> {
        let _guard = self.runner.acquire(session_id).await;
        let mut session = self.runner.load(session_id).await?;
        let mut result = self.runner.show_locked(&mut session, "symptom_entry")?;

        let form = state::load_form(&session.context).await;
        let free_text: String = state::load_draft(&session.context, state::DRAFT_FREE_TEXT).await;
        let labels: Option<String> = session.context.get(state::LABELS_HTML).await;
        result.response = Some(render::symptoms::panel(&form.symptoms, &free_text, labels.as_deref()));

        self.runner.save(session).await?;
        Ok(result)
    }

    /// Answer the single dynamic question and ask the backend what comes next
    pub async fn interview_answer(&self, session_id: &str, answer: DynamicAnswer) -> Result<ExecutionResult> {
        let _guard = self.runner.acquire(session_id).await;
        let mut session = self.runner.load(session_id).await?;

        let interview: InterviewState = session.context.get_or_default(state::INTERVIEW).await;
        let InterviewState::Dynamic { question } = interview else {
            return Ok(self.rejected(&session, "No question is waiting for an answer"));
        };
        let Some(detailed) = answer.into_detailed() else {
            return Ok(self.rejected(&session, ANSWER_REQUIRED));
        };

        let mut form = state::load_form(&session.context).await;
        form.detailed_symptoms.insert(question.question.clone(), detailed);
        state::store_form(&session.context, &form).await?;
        info!(
            session_id = %session.id,
            answered = form.detailed_symptoms.len(),
            "Interview answer recorded"
        );

        let next = symptom_entry::request_questions(&session.context, self.backend.as_ref()).await?;
        let result = if next == InterviewState::Completed {
            let wizard = self.runner.wizard();
            let target = (session.current_step + 1).min(wizard.last_index());
            let step_id = wizard
                .step(target)
                .map(|s| s.id().to_string())
                .unwrap_or_default();
            self.runner.jump_locked(&mut session, &step_id).await?
        } else {
            let html = symptom_entry::interview_panel(&session.context).await;
            self.result_at(&session, Some(html))
        };

        self.runner.save(session).await?;
        Ok(result)
    }

    /// Submit the Yes/No/Notes table and go straight to the results.
    ///
    /// Fails with `Busy` while a previous submission is in flight.
    pub async fn interview_structured(&self, session_id: &str, rows: Vec<StructuredRow>) -> Result<ExecutionResult> {
        let _running = self.runner.try_begin(session_id, "structured submit")?;
        let _guard = self.runner.acquire(session_id).await;
        let mut session = self.runner.load(session_id).await?;

        let interview: InterviewState = session.context.get_or_default(state::INTERVIEW).await;
        let Some(questions) = interview.structured_questions() else {
            return Ok(self.rejected(&session, "No question table is waiting for answers"));
        };

        let mut form = state::load_form(&session.context).await;
        let recorded = interview::apply_structured_answers(&mut form, questions, &rows);
        if recorded == 0 {
            return Ok(self.rejected(&session, STRUCTURED_ANSWER_REQUIRED));
        }
        info!(session_id = %session.id, recorded, "Structured answers submitted");
        state::store_form(&session.context, &form).await?;
        session
            .context
            .set(state::INTERVIEW, InterviewState::Completed)
            .await?;

        let html = analysis::run(&session.context, self.backend.as_ref()).await?;
        let mut result = self.runner.show_locked(&mut session, "results")?;
        result.response = Some(html);

        self.runner.save(session).await?;
        Ok(result)
    }

    /// One round of the per-question `/followup` loop. Without an answer, a failed round
    /// is sent again.
    pub async fn interview_legacy(&self, session_id: &str, answer: Option<String>) -> Result<ExecutionResult> {
        let _guard = self.runner.acquire(session_id).await;
        let session = self.runner.load(session_id).await?;
        let context = &session.context;

        let interview: InterviewState = context.get_or_default(state::INTERVIEW).await;
        let answer = answer.as_deref().map(str::trim).filter(|a| !a.is_empty());
        let mut form = state::load_form(context).await;

        let question = match &interview {
            InterviewState::LegacyRetry { question } => question.clone(),
            InterviewState::Dynamic { question } | InterviewState::Legacy { question } => {
                let Some(answer) = answer else {
                    return Ok(self.rejected(&session, ANSWER_REQUIRED));
                };
                interview::record_legacy_answer(&mut form, &question.question, answer);
                state::store_form(context, &form).await?;
                question.clone()
            }
            _ => return Ok(self.rejected(&session, "No question is waiting for an answer")),
        };

        let reply = match self.backend.followup(&form).await {
            Ok(body) => FollowupReply::classify(&body),
            Err(e) => {
                warn!(session_id = %session.id, error = %e, "Follow-up request failed");
                FollowupReply::Unusable
            }
        };
        let next = match reply {
            FollowupReply::Next(question) => InterviewState::Legacy { question },
            FollowupReply::Complete => InterviewState::LegacyComplete,
            FollowupReply::Unusable => InterviewState::LegacyRetry { question },
        };
        context.set(state::INTERVIEW, &next).await?;

        let html = render::interview::panel(&next, interview::progress(&form));
        let result = self.result_at(&session, Some(html));
        self.runner.save(session).await?;
        Ok(result)
    }

    /// Ask for the analysis again after a failure. Fails with `Busy` while one is running.
    pub async fn retry_analysis(&self, session_id: &str) -> Result<ExecutionResult> {
        let _running = self.runner.try_begin(session_id, "analysis retry")?;
        let _guard = self.runner.acquire(session_id).await;
        let session = self.runner.load(session_id).await?;
        info!(session_id = %session.id, "Retrying analysis");

        let html = analysis::run(&session.context, self.backend.as_ref()).await?;
        let result = self.result_at(&session, Some(html));
        self.runner.save(session).await?;
        Ok(result)
    }

    pub async fn server_status(&self) -> ServerStatus {
        self.backend.server_status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DetailedAnswer;
    use crate::testing::FakeBackend;
    use crate::workflow::create_flow_runner;
    use intake_flow::InMemorySessionStorage;
    use serde_json::json;

    fn setup(backend: FakeBackend) -> (IntakeController, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        let runner = create_flow_runner(backend.clone(), Arc::new(InMemorySessionStorage::new()));
        (
            IntakeController::new(runner, backend.clone(), Duration::from_millis(300)),
            backend,
        )
    }

    /// A session sitting on symptom entry with the given interview state
    async fn on_symptom_entry(controller: &IntakeController, interview: InterviewState) -> String {
        let session = controller.create().await.unwrap();
        let mut session = controller.runner().load(&session.id).await.unwrap();
        controller.runner().show_locked(&mut session, "symptom_entry").unwrap();
        session.context.set(state::INTERVIEW, &interview).await.unwrap();
        let id = session.id.clone();
        controller.runner().save(session).await.unwrap();
        id
    }

    fn rejection(result: &ExecutionResult) -> Option<&str> {
        match &result.status {
            ExecutionStatus::Rejected(errors) => errors.first().map(String::as_str),
            _ => None,
        }
    }

    fn dynamic(question: &str) -> InterviewState {
        InterviewState::Dynamic {
            question: serde_json::from_value(json!({ "question": question, "type": "text" })).unwrap(),
        }
    }

    #[tokio::test]
    async fn vitals_update_reports_bmi() {
        let (controller, _) = setup(FakeBackend::default());
        let session = controller.create().await.unwrap();

        let update = VitalsInput {
            weight: Some("70".to_string()),
            height: Some("175".to_string()),
            ..Default::default()
        };
        let result = controller.update_vitals(&session.id, update).await.unwrap();
        assert!(result.response.unwrap().contains("22.9"));

        let only_weight = VitalsInput {
            height: Some(String::new()),
            ..Default::default()
        };
        let result = controller.update_vitals(&session.id, only_weight).await.unwrap();
        assert_eq!(result.response, None);
    }

    #[tokio::test]
    async fn symptoms_are_kept_unique() {
        let (controller, _) = setup(FakeBackend::default());
        let session = controller.create().await.unwrap();

        controller.add_symptom(&session.id, "Headache").await.unwrap();
        controller.add_symptom(&session.id, "Headache").await.unwrap();
        controller.remove_symptom(&session.id, "Nausea").await.unwrap();

        let loaded = controller.runner().load(&session.id).await.unwrap();
        let form = state::load_form(&loaded.context).await;
        assert_eq!(form.symptoms, vec!["Headache".to_string()]);
    }

    #[tokio::test]
    async fn removed_symptom_is_trimmed() {
        let (controller, _) = setup(FakeBackend::default());
        let session = controller.create().await.unwrap();

        controller.add_symptom(&session.id, "Cough").await.unwrap();
        let result = controller.remove_symptom(&session.id, " Cough ").await.unwrap();

        let loaded = controller.runner().load(&session.id).await.unwrap();
        assert!(state::load_form(&loaded.context).await.symptoms.is_empty());
        assert!(!result.response.unwrap_or_default().contains("Cough"));
    }

    #[tokio::test]
    async fn label_analysis_needs_input() {
        let (controller, backend) = setup(FakeBackend::default());
        let session = controller.create().await.unwrap();

        let result = controller.analyze_labels(&session.id).await.unwrap();
        assert_eq!(rejection(&result), Some(labels::NOTHING_TO_ANALYZE));
        assert_eq!(backend.label_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn label_analysis_is_refused_while_one_is_pending() {
        let (controller, backend) = setup(FakeBackend::default().with_label_delay(Duration::from_secs(5)));
        let controller = Arc::new(controller);
        let session = controller.create().await.unwrap();
        controller.add_symptom(&session.id, "Cough").await.unwrap();

        let pending = tokio::spawn({
            let controller = controller.clone();
            let id = session.id.clone();
            async move { controller.analyze_labels(&id).await }
        });
        while backend.label_calls() == 0 {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            controller.analyze_labels(&session.id).await,
            Err(intake_flow::FlowError::Busy { .. })
        ));
        assert!(pending.await.unwrap().is_ok());
        assert_eq!(backend.label_calls(), 1);
        assert!(controller.analyze_labels(&session.id).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn structured_submit_waits_for_pending_label_extraction() {
        let (controller, backend) = setup(
            FakeBackend::default()
                .with_analysis(json!({ "analysis": "<p>ok</p>" }))
                .with_label_delay(Duration::from_secs(5)),
        );
        let controller = Arc::new(controller);
        let questions = interview::fallback_structured_questions();
        let row = StructuredRow {
            symptom: questions[0].symptom.clone(),
            yes: true,
            ..Default::default()
        };
        let id = on_symptom_entry(
            &controller,
            InterviewState::Structured {
                questions,
                fallback: true,
            },
        )
        .await;

        let typing = tokio::spawn({
            let controller = controller.clone();
            let id = id.clone();
            async move { controller.update_free_text(&id, "sharp pain on the left").await }
        });
        while backend.label_calls() == 0 {
            tokio::task::yield_now().await;
        }

        let result = controller.interview_structured(&id, vec![row]).await.unwrap();
        assert_eq!(result.step_id, "results");
        assert_eq!(backend.analyze_calls(), 1);
        assert!(typing.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn duplicate_structured_submit_is_refused() {
        let (controller, backend) =
            setup(FakeBackend::default().with_analysis(json!({ "analysis": "<p>ok</p>" })));
        let controller = Arc::new(controller);
        let questions = interview::fallback_structured_questions();
        let row = StructuredRow {
            symptom: questions[0].symptom.clone(),
            no: true,
            ..Default::default()
        };
        let id = on_symptom_entry(
            &controller,
            InterviewState::Structured {
                questions,
                fallback: true,
            },
        )
        .await;

        // first submit queues behind this guard
        let held = controller.runner().acquire(&id).await;
        let first = tokio::spawn({
            let controller = controller.clone();
            let id = id.clone();
            let rows = vec![row.clone()];
            async move { controller.interview_structured(&id, rows).await }
        });
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        assert!(matches!(
            controller.interview_structured(&id, vec![row]).await,
            Err(intake_flow::FlowError::Busy { .. })
        ));
        drop(held);

        let result = first.await.unwrap().unwrap();
        assert_eq!(result.step_id, "results");
        assert_eq!(backend.analyze_calls(), 1);
    }

    #[tokio::test]
    async fn abandoned_session_is_gone() {
        let (controller, _) = setup(FakeBackend::default());
        let session = controller.create().await.unwrap();
        controller.add_symptom(&session.id, "Cough").await.unwrap();
        let lookup = controller.suggestions.for_session(&session.id);

        let fresh = controller.restart(&session.id).await.unwrap();

        assert_ne!(fresh.id, session.id);
        assert!(matches!(
            controller.view(&session.id).await,
            Err(intake_flow::FlowError::SessionNotFound(_))
        ));
        assert!(!Arc::ptr_eq(&lookup, &controller.suggestions.for_session(&session.id)));
        let loaded = controller.runner().load(&fresh.id).await.unwrap();
        assert!(state::load_form(&loaded.context).await.symptoms.is_empty());

        assert!(matches!(
            controller.abandon(&session.id).await,
            Err(intake_flow::FlowError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn history_questionnaire_walk() {
        let (controller, _) = setup(FakeBackend::default());
        let session = controller.create().await.unwrap();

        let result = controller.history_answer(&session.id, "Good").await.unwrap();
        assert_eq!(
            rejection(&result),
            Some("Please generate the follow-up questions first")
        );

        controller.history_generate(&session.id).await.unwrap();
        let result = controller.history_answer(&session.id, "  ").await.unwrap();
        assert_eq!(
            rejection(&result),
            Some("Please answer the current question before proceeding.")
        );

        controller.history_answer(&session.id, "Good").await.unwrap();
        controller.history_answer(&session.id, "1-3 days").await.unwrap();
        let result = controller.history_complete(&session.id, "Slightly").await.unwrap();
        assert!(result.response.unwrap().contains("answered-question-item"));

        let loaded = controller.runner().load(&session.id).await.unwrap();
        let form = state::load_form(&loaded.context).await;
        assert_eq!(form.followup_answers.len(), 3);
        assert!(form.patient_history_followup_complete);

        let result = controller.history_proceed(&session.id).await.unwrap();
        assert_eq!(result.step_id, "symptom_entry");
    }

    #[tokio::test]
    async fn dynamic_answer_is_stored_under_the_question() {
        let (controller, backend) = setup(
            FakeBackend::default().with_submit(json!({
                "question": { "question": "Any fever?", "type": "radio", "options": ["Yes", "No"] }
            })),
        );
        let id = on_symptom_entry(&controller, dynamic("How long has it hurt?")).await;

        let blank = controller
            .interview_answer(&id, DynamicAnswer::Text(" ".to_string()))
            .await
            .unwrap();
        assert_eq!(rejection(&blank), Some(ANSWER_REQUIRED));

        let result = controller
            .interview_answer(&id, DynamicAnswer::Text("Two days".to_string()))
            .await
            .unwrap();
        assert!(result.response.unwrap().contains("Any fever?"));
        assert_eq!(backend.submit_calls(), 1);

        let loaded = controller.runner().load(&id).await.unwrap();
        let form = state::load_form(&loaded.context).await;
        assert_eq!(
            form.detailed_symptoms.get("How long has it hurt?"),
            Some(&DetailedAnswer::Text("Two days".to_string()))
        );
    }

    #[tokio::test]
    async fn last_dynamic_answer_moves_to_analysis() {
        let (controller, backend) = setup(
            FakeBackend::default()
                .with_submit(json!({ "completed": true }))
                .with_analysis(json!({ "analysis": "<p>done</p>" })),
        );
        let id = on_symptom_entry(&controller, dynamic("Where is the pain?")).await;

        let result = controller
            .interview_answer(&id, DynamicAnswer::Text("Chest".to_string()))
            .await
            .unwrap();

        assert_eq!(result.step_id, "interview");
        assert_eq!(backend.analyze_calls(), 1);
    }

    #[tokio::test]
    async fn structured_submit_needs_an_answer_and_jumps_to_results() {
        let (controller, backend) =
            setup(FakeBackend::default().with_analysis(json!({ "analysis": "<p>ok</p>" })));
        let questions = interview::fallback_structured_questions();
        let first = questions[0].symptom.clone();
        let id = on_symptom_entry(
            &controller,
            InterviewState::Structured {
                questions,
                fallback: true,
            },
        )
        .await;

        let empty = controller
            .interview_structured(&id, vec![StructuredRow::default()])
            .await
            .unwrap();
        assert_eq!(rejection(&empty), Some(STRUCTURED_ANSWER_REQUIRED));
        assert_eq!(backend.analyze_calls(), 0);

        let row = StructuredRow {
            symptom: first.clone(),
            yes: true,
            no: true,
            notes: Some("since Monday".to_string()),
        };
        let result = controller.interview_structured(&id, vec![row]).await.unwrap();

        assert_eq!(result.step_id, "results");
        assert_eq!(result.status, ExecutionStatus::Completed);
        assert_eq!(backend.analyze_calls(), 1);
        let loaded = controller.runner().load(&id).await.unwrap();
        let form = state::load_form(&loaded.context).await;
        assert_eq!(
            form.detailed_symptoms.get(&first),
            Some(&DetailedAnswer::Text("Yes - since Monday".to_string()))
        );
    }

    #[tokio::test]
    async fn legacy_failure_offers_a_retry() {
        let (controller, _) = setup(
            FakeBackend::default().with_followup(json!({ "completed": true })),
        );
        let id = on_symptom_entry(&controller, dynamic("Any cough?")).await;

        // first round succeeds and completes
        let done = controller
            .interview_legacy(&id, Some("Dry cough".to_string()))
            .await
            .unwrap();
        assert!(done.response.unwrap().contains("Get Medical Analysis"));

        let id = on_symptom_entry(&controller, dynamic("Any rash?")).await;
        let failed = controller
            .interview_legacy(&id, Some("No".to_string()))
            .await
            .unwrap();
        assert!(failed.response.unwrap().contains("Retry"));

        let loaded = controller.runner().load(&id).await.unwrap();
        let interview: InterviewState = loaded.context.get(state::INTERVIEW).await.unwrap();
        assert!(matches!(interview, InterviewState::LegacyRetry { .. }));
    }

    #[tokio::test]
    async fn unknown_session_is_an_error() {
        let (controller, _) = setup(FakeBackend::default());
        assert!(matches!(
            controller.add_symptom("missing", "Cough").await,
            Err(intake_flow::FlowError::SessionNotFound(_))
        ));
    }
}
