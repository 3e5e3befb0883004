//! Medical label extraction for the symptoms entered so far.

use intake_flow::{Context, Result};
use tracing::{info, warn};

use crate::client::IntakeBackend;
use crate::models::LabelExtraction;
use crate::render::labels;
use crate::state;

pub const NOTHING_TO_ANALYZE: &str = "Please enter some symptoms before analyzing.";

/// Whether there is anything for the label extractor to look at
pub async fn has_input(context: &Context) -> bool {
    let form = state::load_form(context).await;
    let free_text: String = state::load_draft(context, state::DRAFT_FREE_TEXT).await;
    !form.symptoms.is_empty() || !free_text.trim().is_empty()
}

/// Extract labels for the selected symptoms and free text and store the rendered section.
///
/// Returns the section HTML, or `None` when it should be hidden: nothing was entered,
/// the request failed, or no label was found.
pub async fn refresh(context: &Context, backend: &dyn IntakeBackend) -> Result<Option<String>> {
    let form = state::load_form(context).await;
    let free_text: String = state::load_draft(context, state::DRAFT_FREE_TEXT).await;

    if form.symptoms.is_empty() && free_text.trim().is_empty() {
        context.remove(state::LABELS).await;
        context.remove(state::LABELS_HTML).await;
        return Ok(None);
    }

    let extraction = match backend.extract_labels(&form.symptoms, &free_text).await {
        Ok(body) => LabelExtraction::from_value(body),
        Err(e) => {
            warn!(error = %e, "Label extraction failed");
            LabelExtraction::default()
        }
    };
    info!(label_count = extraction.label_count, "Labels extracted");

    let html = labels::panel(&extraction);
    context.set(state::LABELS, &extraction).await?;
    match &html {
        Some(html) => context.set(state::LABELS_HTML, html).await?,
        None => {
            context.remove(state::LABELS_HTML).await;
        }
    }
    Ok(html)
}
