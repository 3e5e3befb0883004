use async_trait::async_trait;
use intake_flow::{Context, Result, Step, Validation};
use tracing::info;

use crate::state;
use crate::validation;

pub struct CaseTypeStep;

#[async_trait]
impl Step for CaseTypeStep {
    fn id(&self) -> &str {
        "case_type"
    }

    fn title(&self) -> &str {
        "Case Type"
    }

    async fn validate(&self, context: &Context) -> Result<Validation> {
        let selected: Option<String> = context.get(state::DRAFT_CASE_TYPE).await;
        Ok(validation::case_type(selected.as_deref()))
    }

    async fn commit(&self, context: Context) -> Result<()> {
        let selected: Option<String> = context.get(state::DRAFT_CASE_TYPE).await;
        let mut form = state::load_form(&context).await;
        form.case_type = selected.map(|s| s.trim().to_string());
        info!(case_type = ?form.case_type, "Case type selected");
        state::store_form(&context, &form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn requires_a_selection() {
        let context = Context::new();
        let validation = CaseTypeStep.validate(&context).await.unwrap();
        assert_eq!(validation.errors(), ["Please select a medical case type to continue"]);

        context.set(state::DRAFT_CASE_TYPE, "general").await.unwrap();
        assert!(CaseTypeStep.validate(&context).await.unwrap().is_valid());

        CaseTypeStep.commit(context.clone()).await.unwrap();
        assert_eq!(state::load_form(&context).await.case_type.as_deref(), Some("general"));
    }
}
