//! Final analysis request and the results panel built from it.

use intake_flow::{Context, Result};
use tracing::{error, info};

use crate::client::IntakeBackend;
use crate::models::AnalysisReport;
use crate::render::results;
use crate::state;

/// Submit the form for analysis and store the rendered results panel.
///
/// A failed request leaves an error panel with a retry affordance in place of the
/// results; it is never an error for the caller.
pub async fn run(context: &Context, backend: &dyn IntakeBackend) -> Result<String> {
    let form = state::load_form(context).await;
    info!(symptom_count = form.symptoms.len(), "Requesting analysis");

    let html = match backend.analyze(&form).await {
        Ok(body) => {
            let report = AnalysisReport::from_value(body);
            info!(
                conditions = report.possible_conditions.len(),
                tests = report.diagnostic_tests.len(),
                "Analysis received"
            );
            let html = results::analysis_panel(&form, &report);
            context.set(state::ANALYSIS, &report).await?;
            html
        }
        Err(e) => {
            error!(error = %e, "Analysis request failed");
            context.remove(state::ANALYSIS).await;
            results::error_panel(&e.to_string())
        }
    };

    context.set(state::RESULTS_HTML, &html).await?;
    Ok(html)
}
