use super::escape;

pub fn selected_tags(symptoms: &[String]) -> String {
    let tags: String = symptoms
        .iter()
        .map(|symptom| {
            let symptom = escape(symptom);
            format!(
                r#"<span class="symptom-tag">{symptom} <span class="remove" data-symptom="{symptom}">&times;</span></span>"#
            )
        })
        .collect();
    format!(r#"<div id="selectedSymptoms">{tags}</div>"#)
}

/// Suggestion dropdown. Symptoms already selected are left out.
pub fn suggestions(found: &[String], selected: &[String]) -> String {
    if found.is_empty() {
        return r#"<div class="suggestion-empty">No matching symptoms found</div>"#.to_string();
    }
    found
        .iter()
        .filter(|s| !selected.contains(s))
        .map(|s| format!(r#"<div class="suggestion-item">{}</div>"#, escape(s)))
        .collect()
}

pub fn suggestions_loading() -> String {
    r#"<div class="suggestion-loading">Finding matching symptoms...</div>"#.to_string()
}

pub fn suggestions_error(message: &str) -> String {
    format!(
        r#"<div class="suggestion-error">
    Unable to load suggestions: {}
    <br><button class="btn btn-sm btn-secondary mt-2 check-server-btn">Check Server Status</button>
</div>"#,
        escape(message)
    )
}

/// Symptom entry: chosen symptoms, free text and any extracted labels
pub fn panel(symptoms: &[String], free_text: &str, labels: Option<&str>) -> String {
    let labels = labels
        .map(|html| format!(r#"<div id="labelExtractionSection">{html}</div>"#))
        .unwrap_or_default();
    format!(
        r#"<div class="symptom-entry">
    <input type="text" id="symptomInput" placeholder="Start typing a symptom...">
    <div id="symptomSuggestions"></div>
    {}
    <textarea id="freeTextSymptoms" rows="4" placeholder="Describe your symptoms in your own words...">{}</textarea>
    <button class="btn btn-secondary" id="analyzeLabelsBtn">🔬 Analyze My Symptoms</button>
    {labels}
</div>"#,
        selected_tags(symptoms),
        escape(free_text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestions_skip_selected_symptoms() {
        let found = vec!["Headache".to_string(), "Head injury".to_string()];
        let html = suggestions(&found, &["Headache".to_string()]);
        assert_eq!(html.matches("suggestion-item").count(), 1);
        assert!(html.contains("Head injury"));
        assert!(suggestions(&[], &[]).contains("No matching symptoms found"));
    }

    #[test]
    fn panel_escapes_free_text() {
        let html = panel(&["Cough".to_string()], "it hurts <here>", None);
        assert!(html.contains("it hurts &lt;here&gt;"));
        assert!(html.contains(r#"data-symptom="Cough""#));
        assert!(!html.contains("labelExtractionSection"));
    }
}
