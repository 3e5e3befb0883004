use super::{escape, number};
use crate::interview::{DynamicQuestion, InterviewState, Progress, QuestionKind, StructuredQuestion};

pub fn panel(state: &InterviewState, progress: Progress) -> String {
    match state {
        InterviewState::NotStarted => {
            r#"<div class="question-loading">Preparing follow-up questions...</div>"#.to_string()
        }
        InterviewState::Structured { questions, .. } => structured_table(questions),
        InterviewState::Dynamic { question } => {
            format!("{}{}", progress_bar(progress), dynamic_question(question))
        }
        InterviewState::Legacy { question } => legacy_question(question),
        InterviewState::LegacyRetry { .. } => legacy_retry(),
        InterviewState::LegacyComplete => legacy_complete(),
        InterviewState::Completed => {
            r#"<div class="completion-message"><h3>Interview complete</h3><p>Preparing your analysis...</p></div>"#
                .to_string()
        }
    }
}

pub fn progress_bar(progress: Progress) -> String {
    format!(
        r#"<div class="interview-progress" id="interviewProgress">
    <span class="progress-label">Question <span id="currentQuestion">{current}</span></span>
    <span class="progress-percentage">{pct}%</span>
    <div class="progress-bar"><div class="progress-fill" id="progressFill" style="width: {pct}%"></div></div>
</div>"#,
        current = progress.current_question,
        pct = progress.percentage,
    )
}

pub fn structured_table(questions: &[StructuredQuestion]) -> String {
    let mut html = String::from(
        r#"<div class="structured-questions-header">
    <h3>Symptom / Question Assessment</h3>
    <p class="subtitle">Please answer these questions based on the information collected (Case Type, Patient, Symptoms).
       The aim is to gather additional information that will help in diagnosis and recommend appropriate diagnostic tests.</p>
</div>
<div class="structured-questions-table">
<table class="symptom-questions-table">
    <thead>
        <tr>
            <th class="symptom-col">Symptom / Question</th>
            <th class="yes-col">Yes</th>
            <th class="no-col">No</th>
            <th class="notes-col">Notes / Description</th>
        </tr>
    </thead>
    <tbody>
"#,
    );

    for (index, question) in questions.iter().enumerate() {
        let symptom = escape(&question.symptom);
        let hint = if question.notes_hint.is_empty() {
            "Enter notes...".to_string()
        } else {
            escape(&question.notes_hint)
        };
        html.push_str(&format!(
            r#"        <tr class="symptom-question-row" data-symptom="{symptom}" data-category="{category}">
            <td class="symptom-cell">{symptom}</td>
            <td class="yes-cell"><input type="checkbox" class="yes-checkbox" id="yes-{index}" name="symptom-{index}" value="yes"></td>
            <td class="no-cell"><input type="checkbox" class="no-checkbox" id="no-{index}" name="symptom-{index}" value="no"></td>
            <td class="notes-cell"><input type="text" class="notes-input" id="notes-{index}" placeholder="{hint}"></td>
        </tr>
"#,
            category = escape(&question.category),
        ));
    }

    html.push_str(
        r#"    </tbody>
</table>
</div>
<div class="structured-questions-submit"><button class="btn btn-primary submit-structured-btn">Submit Answers</button></div>
<div class="completion-note"><p><strong>Note:</strong> You can leave questions blank if not applicable.
   Focus on symptoms and factors relevant to your condition.</p></div>"#,
    );
    html
}

fn answer_input(question: &DynamicQuestion) -> String {
    match question.kind {
        QuestionKind::Slider => {
            let min = question.min.unwrap_or(1.0);
            let max = question.max.unwrap_or(10.0);
            let mid = ((min + max) / 2.0).round();
            format!(
                r#"<div class="slider-container"><input type="range" id="current-question" class="form-range" min="{}" max="{}" step="{}" value="{}"><div class="slider-value">{}</div></div>"#,
                number(min),
                number(max),
                number(question.step.unwrap_or(1.0)),
                number(mid),
                number(mid),
            )
        }
        QuestionKind::Checkbox => question
            .options
            .iter()
            .map(|option| {
                let option = escape(option);
                format!(
                    r#"<div class="checkbox-option"><input type="checkbox" id="option-{option}" value="{option}"><label for="option-{option}">{option}</label></div>"#
                )
            })
            .collect::<Vec<_>>()
            .join("\n"),
        QuestionKind::Radio => {
            let options = question
                .options
                .iter()
                .enumerate()
                .map(|(index, option)| {
                    let option = escape(option);
                    format!(
                        r#"<div class="radio-option-interview"><input type="radio" id="interview-option-{index}" name="interview-radio" value="{option}" class="radio-input-interview"><label for="interview-option-{index}" class="radio-label-interview">{option}</label></div>"#
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!(r#"<div class="radio-options-interview">{options}</div>"#)
        }
        QuestionKind::MultipleChoice => {
            let buttons = question
                .options
                .iter()
                .enumerate()
                .map(|(index, option)| {
                    let option = escape(option);
                    format!(
                        r#"<button type="button" class="multiple-choice-btn" id="choice-{index}" value="{option}">{option}</button>"#
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!(r#"<div class="multiple-choice-options">{buttons}</div>"#)
        }
        QuestionKind::Textarea => format!(
            r#"<textarea id="current-question" class="form-control" rows="4" placeholder="{}"></textarea>"#,
            escape(
                question
                    .placeholder
                    .as_deref()
                    .unwrap_or("Please provide any additional information that might be helpful...")
            )
        ),
        QuestionKind::Text => {
            r#"<input type="text" id="current-question" class="form-control">"#.to_string()
        }
    }
}

pub fn dynamic_question(question: &DynamicQuestion) -> String {
    let help = question
        .help_text
        .as_deref()
        .map(|h| format!(r#"<p class="help-text">{}</p>"#, escape(h)))
        .unwrap_or_default();
    format!(
        r#"<div class="question-container">
    <h3>{}</h3>
    {help}
    {}
    <button class="btn btn-primary">Submit Answer</button>
</div>"#,
        escape(&question.question),
        answer_input(question),
    )
}

fn legacy_question(question: &DynamicQuestion) -> String {
    format!(
        r#"<div class="question-item">
    <h3>{}</h3>
    {}
    <div class="question-actions"><button type="button" class="submit-btn">Submit Answer</button></div>
</div>"#,
        escape(&question.question),
        answer_input(question),
    )
}

fn legacy_retry() -> String {
    r#"<div class="error-message">
    <p>Error getting next question. Please try again.</p>
    <button class="retry-btn">Retry</button>
</div>"#
        .to_string()
}

fn legacy_complete() -> String {
    r#"<div class="completion-message">
    <h3>✓ OPQRST Assessment Complete</h3>
    <p>All symptoms have been analyzed using the comprehensive OPQRST framework:</p>
    <ul>
        <li><strong>O</strong>nset - When symptoms started</li>
        <li><strong>P</strong>rovocation/Palliation - What makes it better/worse</li>
        <li><strong>Q</strong>uality - How symptoms feel</li>
        <li><strong>R</strong>egion/Radiation - Where symptoms are located</li>
        <li><strong>S</strong>everity - Intensity level</li>
        <li><strong>T</strong>iming - Duration and patterns</li>
    </ul>
    <button class="analysis-btn">Get Medical Analysis</button>
</div>"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::fallback_structured_questions;
    use std::collections::BTreeMap;

    fn question(kind: QuestionKind, options: &[&str]) -> DynamicQuestion {
        DynamicQuestion {
            question: "Where is the <pain>?".to_string(),
            kind,
            options: options.iter().map(|o| o.to_string()).collect(),
            help_text: None,
            placeholder: None,
            min: None,
            max: None,
            step: None,
            labels: BTreeMap::new(),
        }
    }

    #[test]
    fn structured_table_has_a_row_per_question() {
        let html = structured_table(&fallback_structured_questions());
        assert_eq!(html.matches("symptom-question-row").count(), 18);
        assert!(html.contains(r#"placeholder="Mention time of spikes""#));
        assert!(html.contains(r#"placeholder="Enter notes...""#));
        assert!(html.contains("Submit Answers"));
    }

    #[test]
    fn dynamic_question_inputs() {
        let radio = dynamic_question(&question(QuestionKind::Radio, &["Left", "Right"]));
        assert!(radio.contains("Where is the &lt;pain&gt;?"));
        assert_eq!(radio.matches(r#"type="radio""#).count(), 2);

        let slider = dynamic_question(&question(QuestionKind::Slider, &[]));
        assert!(slider.contains(r#"min="1" max="10""#));
        assert!(slider.contains(r#"value="6""#));

        let text = dynamic_question(&question(QuestionKind::Text, &[]));
        assert!(text.contains(r#"type="text""#));
    }

    #[test]
    fn dynamic_panel_shows_progress() {
        let state = InterviewState::Dynamic {
            question: question(QuestionKind::Textarea, &[]),
        };
        let html = panel(
            &state,
            Progress {
                current_question: 3,
                percentage: 30,
            },
        );
        assert!(html.contains(r#"<span id="currentQuestion">3</span>"#));
        assert!(html.contains("width: 30%"));
    }
}
