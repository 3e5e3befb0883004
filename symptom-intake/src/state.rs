//! Keys under which the intake keeps its data in the session context.

use intake_flow::{Context, Result};
use serde::de::DeserializeOwned;

use crate::models::FormState;

pub const FORM_STATE: &str = "form_state";

pub const DRAFT_CASE_TYPE: &str = "draft.case_type";
pub const DRAFT_PATIENT: &str = "draft.patient";
pub const DRAFT_VITALS: &str = "draft.vitals";
pub const DRAFT_FREE_TEXT: &str = "draft.free_text";

pub const INTERVIEW: &str = "interview";
pub const ANALYSIS: &str = "analysis";
pub const RESULTS_HTML: &str = "results_html";
pub const HISTORY: &str = "history";
pub const PATIENT_SUMMARY: &str = "patient_summary";
pub const LABELS: &str = "labels";
pub const LABELS_HTML: &str = "labels_html";

pub async fn load_form(context: &Context) -> FormState {
    context.get(FORM_STATE).await.unwrap_or_default()
}

pub async fn store_form(context: &Context, form: &FormState) -> Result<()> {
    context.set(FORM_STATE, form).await
}

/// Draft input for a step, empty until the user has typed something
pub async fn load_draft<T: DeserializeOwned + Default>(context: &Context, key: &str) -> T {
    context.get(key).await.unwrap_or_default()
}
