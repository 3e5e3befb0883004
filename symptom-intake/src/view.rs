//! JSON snapshot of a session for drawing the wizard: position, sidebar, form data and
//! the panel of the current step.

use intake_flow::{Context, Session, Wizard};
use serde_json::{Value, json};

use crate::drafts;
use crate::history::HistoryQuestionnaire;
use crate::interview::InterviewState;
use crate::models::{FormState, PatientInput, PatientSummary, VitalsInput};
use crate::render;
use crate::state;
use crate::steps::symptom_entry;

pub async fn render(wizard: &Wizard, session: &Session) -> Value {
    let index = session.current_step;
    let current = wizard.step(index);
    let step_id = current.as_ref().map(|s| s.id().to_string()).unwrap_or_default();

    let steps: Vec<Value> = (0..wizard.len())
        .filter_map(|i| wizard.step(i).map(|step| (i, step)))
        .map(|(i, step)| {
            json!({
                "index": i,
                "id": step.id(),
                "title": step.title(),
                "current": i == index,
                "reachable": wizard.can_navigate_to(session, i),
            })
        })
        .collect();

    let form = state::load_form(&session.context).await;
    let panel = panel(&step_id, &session.context, &form).await;

    json!({
        "session_id": session.id,
        "step": {
            "index": index,
            "id": step_id,
            "title": current.as_ref().map(|s| s.title().to_string()),
        },
        "status_message": session.status_message,
        "steps": steps,
        "form_state": form,
        "panel": panel,
    })
}

async fn panel(step_id: &str, context: &Context, form: &FormState) -> Value {
    match step_id {
        "case_type" => json!({
            "selected": context.get::<String>(state::DRAFT_CASE_TYPE).await,
        }),
        "patient_demographics" => {
            let draft: PatientInput = state::load_draft(context, state::DRAFT_PATIENT).await;
            json!({ "draft": draft })
        }
        "clinical_vitals" => {
            let draft: VitalsInput = state::load_draft(context, state::DRAFT_VITALS).await;
            json!({
                "bmi": drafts::draft_bmi(&draft).map(|b| b.display()),
                "draft": draft,
            })
        }
        "patient_history_followup" => {
            let history: Option<HistoryQuestionnaire> = context.get(state::HISTORY).await;
            let summary: Option<PatientSummary> = context.get(state::PATIENT_SUMMARY).await;
            json!({ "html": render::history::panel(history.as_ref(), summary.as_ref()) })
        }
        "symptom_entry" => {
            let free_text: String = state::load_draft(context, state::DRAFT_FREE_TEXT).await;
            let labels: Option<String> = context.get(state::LABELS_HTML).await;
            let interview: InterviewState = context.get_or_default(state::INTERVIEW).await;
            let questions = match interview {
                InterviewState::NotStarted => None,
                _ => Some(symptom_entry::interview_panel(context).await),
            };
            json!({
                "html": render::symptoms::panel(&form.symptoms, &free_text, labels.as_deref()),
                "interview": questions,
            })
        }
        "interview" | "results" => json!({
            "html": context.get::<String>(state::RESULTS_HTML).await,
        }),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use crate::workflow::build_intake_wizard;
    use std::sync::Arc;

    #[tokio::test]
    async fn sidebar_marks_reachable_steps() {
        let wizard = build_intake_wizard(Arc::new(FakeBackend::default()));
        let mut session = Session::new(&wizard.id);
        session.current_step = 2;

        let view = render(&wizard, &session).await;

        assert_eq!(view["step"]["id"], "clinical_vitals");
        assert_eq!(view["step"]["title"], "Clinical Vitals");
        let reachable: Vec<bool> = view["steps"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["reachable"].as_bool().unwrap())
            .collect();
        assert_eq!(reachable, vec![true, true, true, true, false, false, false]);
        assert!(view["panel"]["bmi"].is_null());
    }

    #[tokio::test]
    async fn symptom_entry_shows_selected_symptoms() {
        let wizard = build_intake_wizard(Arc::new(FakeBackend::default()));
        let mut session = Session::new(&wizard.id);
        session.current_step = 4;
        let mut form = FormState::default();
        form.add_symptom("Cough");
        state::store_form(&session.context, &form).await.unwrap();

        let view = render(&wizard, &session).await;

        assert!(view["panel"]["html"].as_str().unwrap().contains("Cough"));
        assert!(view["panel"]["interview"].is_null());
        assert_eq!(view["form_state"]["symptoms"][0], "Cough");
    }
}
