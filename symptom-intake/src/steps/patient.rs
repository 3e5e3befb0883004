use async_trait::async_trait;
use intake_flow::{Context, Result, Step, Validation};
use tracing::info;

use crate::drafts;
use crate::models::PatientInput;
use crate::state;
use crate::validation;

pub struct PatientStep;

#[async_trait]
impl Step for PatientStep {
    fn id(&self) -> &str {
        "patient_demographics"
    }

    fn title(&self) -> &str {
        "Patient Demographics"
    }

    async fn validate(&self, context: &Context) -> Result<Validation> {
        let draft: PatientInput = state::load_draft(context, state::DRAFT_PATIENT).await;
        Ok(validation::patient(&draft))
    }

    async fn commit(&self, context: Context) -> Result<()> {
        let draft: PatientInput = state::load_draft(&context, state::DRAFT_PATIENT).await;
        let mut form = state::load_form(&context).await;
        drafts::commit_patient(&mut form, &draft);
        info!(age = ?form.demographics.age, "Patient details saved");
        state::store_form(&context, &form).await
    }
}
