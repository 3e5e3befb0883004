use async_trait::async_trait;
use intake_flow::{Context, Result, Step, Validation};
use tracing::info;

use crate::drafts;
use crate::models::VitalsInput;
use crate::state;
use crate::validation;

pub struct VitalsStep;

#[async_trait]
impl Step for VitalsStep {
    fn id(&self) -> &str {
        "clinical_vitals"
    }

    fn title(&self) -> &str {
        "Clinical Vitals"
    }

    async fn validate(&self, context: &Context) -> Result<Validation> {
        let draft: VitalsInput = state::load_draft(context, state::DRAFT_VITALS).await;
        Ok(validation::vitals(&draft))
    }

    async fn commit(&self, context: Context) -> Result<()> {
        let draft: VitalsInput = state::load_draft(&context, state::DRAFT_VITALS).await;
        let mut form = state::load_form(&context).await;
        drafts::commit_vitals(&mut form, &draft);
        info!(bmi = ?form.vitals.as_ref().and_then(|v| v.bmi), "Vitals saved");
        state::store_form(&context, &form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_vitals_pass_and_out_of_range_fail() {
        let context = Context::new();
        assert!(VitalsStep.validate(&context).await.unwrap().is_valid());

        let draft = VitalsInput {
            systolic: Some("260".to_string()),
            ..Default::default()
        };
        context.set(state::DRAFT_VITALS, &draft).await.unwrap();
        assert!(!VitalsStep.validate(&context).await.unwrap().is_valid());
    }

    #[tokio::test]
    async fn commit_copies_vitals_and_bmi() {
        let context = Context::new();
        let draft = VitalsInput {
            pulse_rate: Some("72".to_string()),
            weight: Some("70".to_string()),
            height: Some("175".to_string()),
            ..Default::default()
        };
        context.set(state::DRAFT_VITALS, &draft).await.unwrap();

        VitalsStep.commit(context.clone()).await.unwrap();

        let vitals = state::load_form(&context).await.vitals.unwrap();
        assert_eq!(vitals.pulse_rate, Some(72));
        assert_eq!(vitals.bmi, Some(22.9));
    }
}
