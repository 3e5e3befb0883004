use super::{escape, humanize, title_case};
use crate::models::LabelExtraction;

fn level_class(prefix: &str, level: &str) -> String {
    match level {
        "high" | "medium" => format!("{prefix}-{level}"),
        _ => format!("{prefix}-low"),
    }
}

fn metadata(label: &str, value: &str) -> String {
    format!(
        r#"<div class="metadata-item"><div class="metadata-label">{label}</div><div class="metadata-value">{}</div></div>"#,
        escape(value)
    )
}

pub fn loading() -> String {
    r#"<div class="loading-labels">🤖 AI is analyzing your symptoms to extract medical labels...</div>"#
        .to_string()
}

/// Label cards, or `None` when the section should stay hidden
pub fn panel(extraction: &LabelExtraction) -> Option<String> {
    if extraction.label_count == 0 {
        return None;
    }
    Some(format!(
        r#"<div class="extracted-labels">{}</div>{}"#,
        label_cards(extraction),
        correlation_matrix(extraction).unwrap_or_default()
    ))
}

fn label_cards(extraction: &LabelExtraction) -> String {
    if extraction.extracted_labels.is_empty() {
        return r#"<div class="labels-empty-state">
    <div class="empty-state-icon">🏷️</div>
    <h4 class="empty-state-title">No Labels Detected</h4>
    <p class="empty-state-description">Try describing your symptoms in more detail to get AI-detected medical labels.</p>
</div>"#
            .to_string();
    }

    extraction
        .extracted_labels
        .iter()
        .map(|(label, detail)| {
            let confidence = detail
                .confidence
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or("high")
                .to_lowercase();
            let mut content = metadata(
                "Relevance",
                detail.relevance.as_deref().filter(|r| !r.is_empty()).unwrap_or("High"),
            );
            if let Some(description) = detail.description.as_deref().filter(|d| !d.is_empty()) {
                content.push_str(&metadata("Description", description));
            }
            if let Some(category) = detail.medical_category.as_deref().filter(|c| !c.is_empty()) {
                content.push_str(&metadata("Category", category));
            }
            format!(
                r#"<div class="label-card"><div class="label-header"><div class="label-title">{}</div><div class="label-confidence {}">{} confidence</div></div><div class="label-content">{content}</div></div>"#,
                escape(&title_case(&humanize(label))),
                level_class("confidence", &confidence),
                escape(&confidence),
            )
        })
        .collect()
}

fn correlation_matrix(extraction: &LabelExtraction) -> Option<String> {
    if extraction.correlation_matrix.is_empty() {
        return None;
    }

    let items: String = extraction
        .correlations()
        .into_iter()
        .map(|(label, correlation)| {
            let strength = correlation
                .strength
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("medium")
                .to_lowercase();
            let description = correlation
                .description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| {
                    format!("These symptoms show {strength} correlation based on medical analysis.")
                });
            let questions = if correlation.questions.is_empty() {
                String::new()
            } else {
                format!(
                    r#"<div class="correlation-clinical-notes"><div class="clinical-notes-title">Clinical Questions</div><div class="clinical-notes-content">{}</div></div>"#,
                    correlation
                        .questions
                        .iter()
                        .map(|q| format!("• {}", escape(q)))
                        .collect::<Vec<_>>()
                        .join("<br>")
                )
            };
            format!(
                r#"<div class="correlation-item"><div class="correlation-header"><div class="correlation-symptoms">{} ↔ {}</div><div class="correlation-strength {}">{}</div></div><div class="correlation-description">{}</div>{questions}</div>"#,
                escape(&label.replace('_', " ")),
                escape(&correlation.label.replace('_', " ")),
                level_class("strength", &strength),
                escape(&strength),
                escape(&description),
            )
        })
        .collect();

    Some(format!(
        r#"<div class="correlation-matrix" id="correlationMatrix"><div id="correlationMatrixContent">{items}</div></div>"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hidden_without_labels() {
        assert!(panel(&LabelExtraction::default()).is_none());
    }

    #[test]
    fn cards_use_defaults() {
        let extraction = LabelExtraction::from_value(json!({
            "extracted_labels": {
                "chest_pain": { "confidence": "Medium", "medical_category": "cardiac" },
                "fever": {}
            },
            "label_count": 2,
            "correlation_matrix": {
                "chest_pain": [
                    { "label": "shortness_of_breath", "questions": ["Does it worsen on exertion?"] }
                ]
            }
        }));

        let html = panel(&extraction).unwrap();
        assert!(html.contains(r#"<div class="label-title">Chest Pain</div>"#));
        assert!(html.contains(r#"label-confidence confidence-medium">medium confidence"#));
        assert!(html.contains(r#"label-confidence confidence-high">high confidence"#));
        assert!(html.contains("cardiac"));
        assert_eq!(html.matches(">High</div>").count(), 2);
        assert!(html.contains("chest pain ↔ shortness of breath"));
        assert!(html.contains("strength-medium"));
        assert!(html.contains("These symptoms show medium correlation based on medical analysis."));
        assert!(html.contains("• Does it worsen on exertion?"));
    }

    #[test]
    fn counted_but_empty_labels_show_empty_state() {
        let extraction = LabelExtraction {
            label_count: 1,
            ..Default::default()
        };
        let html = panel(&extraction).unwrap();
        assert!(html.contains("No Labels Detected"));
        assert!(!html.contains("correlation-matrix"));
    }
}
