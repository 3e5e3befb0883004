use super::{escape, humanize};
use crate::history::{HistoryPhase, HistoryQuestionnaire};
use crate::models::{HistoryQuestion, PatientSummary};

pub fn not_started() -> String {
    r#"<div id="generateQuestionsContainer">
    <p>Generate personalised follow-up questions based on the patient information collected so far.</p>
    <button class="btn btn-primary" id="generateQuestionsBtn">Generate Follow-up Questions</button>
</div>"#
        .to_string()
}

fn answer_input(question: &HistoryQuestion, previous: Option<&str>) -> String {
    match question.kind.as_str() {
        "multiple_choice" => {
            let options: String = question
                .options
                .iter()
                .enumerate()
                .map(|(index, option)| {
                    let checked = if previous == Some(option.as_str()) { " checked" } else { "" };
                    let option = escape(option);
                    format!(
                        r#"<label class="option-label"><input type="radio" name="currentAnswer" value="{option}" data-index="{index}"{checked}><span class="option-text">{option}</span></label>"#
                    )
                })
                .collect();
            format!(r#"<div class="question-options">{options}</div>"#)
        }
        "textarea" => format!(
            r#"<textarea class="question-textarea" name="currentAnswer" placeholder="{}">{}</textarea>"#,
            escape(question.placeholder.as_deref().unwrap_or("Please provide details...")),
            escape(previous.unwrap_or_default()),
        ),
        "scale" => {
            let min = question.min.unwrap_or(0);
            let max = question.max.unwrap_or(10);
            let mid = ((min + max) as f64 / 2.0).round() as i64;
            let value = previous.map(str::to_string).unwrap_or_else(|| mid.to_string());
            format!(
                r#"<div class="scale-container"><input type="range" class="scale-slider" name="currentAnswer" min="{min}" max="{max}" value="{value}"><div class="scale-value">{value}</div><div class="scale-labels"><span class="min-label">{}</span><span class="max-label">{}</span></div></div>"#,
                escape(question.min_label.as_deref().unwrap_or_default()),
                escape(question.max_label.as_deref().unwrap_or_default()),
                value = escape(&value),
            )
        }
        _ => String::new(),
    }
}

fn question_card(questionnaire: &HistoryQuestionnaire) -> String {
    let Some(question) = questionnaire.current() else {
        return String::new();
    };
    let previous = questionnaire
        .answers
        .get(questionnaire.index)
        .and_then(Option::as_ref)
        .map(|a| a.answer.as_str());
    let progress = questionnaire.progress();

    let prev_button = if questionnaire.index > 0 {
        r#"<button class="btn btn-secondary" id="prevQuestionBtn">Previous</button>"#
    } else {
        ""
    };
    let next_button = if questionnaire.is_last() {
        r#"<button class="btn btn-success" id="completeQuestionsBtn">Complete</button>"#
    } else {
        r#"<button class="btn btn-primary" id="nextQuestionBtn">Next</button>"#
    };

    format!(
        r#"<div id="followupQuestionsSection">
    <div class="questions-progress">
        Question <span id="currentQuestionNumber">{current}</span> of <span id="totalQuestions">{total}</span>
        (<span id="progressPercent">{pct}</span>%)
        <div class="progress-bar"><div class="progress-fill" id="questionsProgressFill" style="width: {pct}%"></div></div>
    </div>
    <div class="current-question-card">
        <div class="question-header">
            <div class="question-category">{category}</div>
            <h4 class="question-text">{text}</h4>
            <p class="question-relevance">{relevance}</p>
        </div>
        <div class="question-answer-section">{input}</div>
    </div>
    <div class="question-navigation">{prev_button}{next_button}</div>
</div>"#,
        current = progress.current,
        total = progress.total,
        pct = progress.percentage,
        category = escape(&humanize(&question.category).to_uppercase()),
        text = escape(&question.question),
        relevance = escape(&question.relevance),
        input = answer_input(question, previous),
    )
}

fn answered_summary(questionnaire: &HistoryQuestionnaire, summary: Option<&PatientSummary>) -> String {
    let answers: String = questionnaire
        .answered()
        .map(|answer| {
            format!(
                r#"<div class="answered-question-item"><div class="answer-question">{}</div><div class="answer-response"><strong>Answer:</strong> {}</div><div class="answer-category">Category: {}</div></div>"#,
                escape(&answer.question),
                escape(&answer.answer),
                escape(&answer.category.replace('_', " ")),
            )
        })
        .collect();

    format!(
        r#"<div id="questionsSummary">
    <div id="answeredQuestions"><div class="answered-questions-grid">{answers}</div></div>
    {}
    <div class="summary-actions">
        <button class="btn btn-secondary" id="reviewAnswersBtn">Review Answers</button>
        <button class="btn btn-primary" id="proceedToSymptomsBtn">Proceed to Symptoms</button>
    </div>
</div>"#,
        summary.map(patient_summary).unwrap_or_default()
    )
}

fn findings(title: &str, class: &str, items: &[String]) -> String {
    if items.is_empty() {
        return String::new();
    }
    let list: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", escape(item)))
        .collect();
    format!(r#"<div class="{class}"><h5>{title}</h5><ul>{list}</ul></div>"#)
}

/// Summary sections are HTML produced by the backend or by the fallback builder
pub fn patient_summary(summary: &PatientSummary) -> String {
    let sections = &summary.patient_summary;
    let vitals = &summary.vitals_abnormalities;
    let significance = &summary.medical_significance;
    format!(
        r#"<div class="patient-summary">
    <h4>Patient Summary</h4>
    <div class="summary-block">{}{}{}{}</div>
    <div class="vitals-abnormalities">{}{}{}{}</div>
    <div class="medical-significance">{}{}{}{}</div>
</div>"#,
        sections.demographics_summary,
        sections.medical_history_summary,
        sections.risk_factors_summary,
        sections.clinical_relevance,
        findings("Critical", "critical-abnormalities", &vitals.critical_abnormalities),
        findings("Moderate", "moderate-abnormalities", &vitals.moderate_abnormalities),
        findings("Mild", "mild-abnormalities", &vitals.mild_abnormalities),
        findings("Normal", "normal-findings", &vitals.normal_findings),
        significance.diagnostic_indicators,
        significance.objective_findings,
        significance.clinical_correlations,
        significance.next_steps,
    )
}

pub fn panel(questionnaire: Option<&HistoryQuestionnaire>, summary: Option<&PatientSummary>) -> String {
    match questionnaire {
        None => not_started(),
        Some(q) if q.phase == HistoryPhase::Summary => answered_summary(q, summary),
        Some(q) => question_card(q),
    }
}
