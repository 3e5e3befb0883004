//! Patient-history questionnaire shown before symptom entry.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::models::{FollowupAnswer, FormState, HistoryQuestion};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("Please generate the follow-up questions first")]
    NotStarted,
    #[error("Please answer the current question before proceeding.")]
    Unanswered,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPhase {
    #[default]
    Asking,
    Summary,
}

/// Questions, answers so far and the question being shown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryQuestionnaire {
    pub questions: Vec<HistoryQuestion>,
    pub index: usize,
    pub answers: Vec<Option<FollowupAnswer>>,
    pub phase: HistoryPhase,
    pub fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryProgress {
    pub current: usize,
    pub total: usize,
    pub percentage: u32,
}

impl HistoryQuestionnaire {
    pub fn new(questions: Vec<HistoryQuestion>, fallback: bool) -> Self {
        let answers = vec![None; questions.len()];
        Self {
            questions,
            index: 0,
            answers,
            phase: HistoryPhase::Asking,
            fallback,
        }
    }

    /// Questions from `/generate_followup_questions`, if it returned any
    pub fn from_response(value: &Value) -> Option<Self> {
        let questions: Vec<HistoryQuestion> = value
            .get("questions")
            .cloned()
            .and_then(|q| serde_json::from_value(q).ok())?;
        (!questions.is_empty()).then(|| Self::new(questions, false))
    }

    pub fn current(&self) -> Option<&HistoryQuestion> {
        self.questions.get(self.index)
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.questions.len()
    }

    pub fn progress(&self) -> HistoryProgress {
        let total = self.questions.len();
        let current = (self.index + 1).min(total.max(1));
        let percentage = if total == 0 {
            0
        } else {
            ((current as f64 / total as f64) * 100.0).round() as u32
        };
        HistoryProgress {
            current,
            total,
            percentage,
        }
    }

    fn save_answer(&mut self, answer: &str) -> Result<(), HistoryError> {
        let answer = answer.trim();
        let question = self.current().ok_or(HistoryError::NotStarted)?.clone();
        if answer.is_empty() {
            return Err(HistoryError::Unanswered);
        }
        self.answers[self.index] = Some(FollowupAnswer {
            question_id: question.id.clone(),
            question: question.question.clone(),
            answer: answer.to_string(),
            category: question.category.clone(),
        });
        Ok(())
    }

    /// Record the answer to the current question and show the next one. Answering the
    /// last question completes the questionnaire.
    pub fn answer_and_next(&mut self, form: &mut FormState, answer: &str) -> Result<(), HistoryError> {
        if self.is_last() {
            return self.complete(form, answer);
        }
        self.save_answer(answer)?;
        self.index += 1;
        Ok(())
    }

    pub fn previous(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    /// Record the final answer, copy every answer into the form and show the summary
    pub fn complete(&mut self, form: &mut FormState, answer: &str) -> Result<(), HistoryError> {
        self.save_answer(answer)?;
        form.followup_answers = self.answered().cloned().collect();
        form.patient_history_followup_complete = true;
        self.phase = HistoryPhase::Summary;
        Ok(())
    }

    /// Back to the first question with the earlier answers kept
    pub fn review(&mut self) {
        self.index = 0;
        self.phase = HistoryPhase::Asking;
    }

    pub fn answered(&self) -> impl Iterator<Item = &FollowupAnswer> {
        self.answers.iter().flatten()
    }
}

fn choice_question(id: u32, category: &str, question: &str, options: &[&str], relevance: &str) -> HistoryQuestion {
    HistoryQuestion {
        id: json!(id),
        category: category.to_string(),
        question: question.to_string(),
        kind: "multiple_choice".to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        relevance: relevance.to_string(),
        placeholder: None,
        min: None,
        max: None,
        min_label: None,
        max_label: None,
    }
}

/// Questions derived from what is already known about the patient, used when the
/// backend cannot generate any
pub fn fallback_questions(form: &FormState) -> Vec<HistoryQuestion> {
    let mut questions = Vec::new();

    match form.demographics.age {
        Some(age) if age > 65 => questions.push(choice_question(
            1,
            "age_related",
            "As a senior patient, do you experience any memory issues or confusion?",
            &[
                "No memory issues",
                "Occasional forgetfulness",
                "Frequent confusion",
                "Significant memory problems",
            ],
            "Age-related cognitive assessment for patients over 65",
        )),
        Some(age) if age < 18 => questions.push(choice_question(
            1,
            "pediatric",
            "For pediatric patients, are there any developmental concerns?",
            &["Normal development", "Some delays", "Significant concerns", "Not sure"],
            "Developmental assessment for pediatric patients",
        )),
        _ => {}
    }

    let vitals = form.vitals.clone().unwrap_or_default();
    if vitals.temperature.is_some_and(|t| t > 100.4) {
        questions.push(choice_question(
            2,
            "fever_assessment",
            "You have an elevated temperature. How long have you had this fever?",
            &["Less than 24 hours", "1-3 days", "4-7 days", "More than a week"],
            "Duration assessment for fever management",
        ));
    }

    if vitals.systolic.is_some_and(|s| s > 140) {
        questions.push(choice_question(
            3,
            "hypertension_assessment",
            "Your blood pressure is elevated. Do you take blood pressure medications?",
            &["Yes, regularly", "Yes, but irregularly", "No, not prescribed", "No, but should be"],
            "Medication compliance assessment for hypertension",
        ));
    }

    if form.demographics.gender.as_deref() == Some("female") {
        questions.push(choice_question(
            4,
            "female_health",
            "Are you currently menstruating regularly?",
            &["Yes, regularly", "Irregular periods", "Menopause", "Not applicable"],
            "Female reproductive health assessment",
        ));
    }

    let diabetic = form
        .medical_conditions
        .as_ref()
        .and_then(|c| c.diabetic.as_deref())
        == Some("yes");
    if diabetic {
        questions.push(choice_question(
            5,
            "diabetes_management",
            "How well controlled is your diabetes currently?",
            &["Well controlled", "Moderately controlled", "Poorly controlled", "Not sure"],
            "Diabetes management assessment",
        ));
    }

    if questions.is_empty() {
        questions = vec![
            choice_question(
                1,
                "general_health",
                "How would you describe your overall health in the past month?",
                &["Excellent", "Good", "Fair", "Poor"],
                "General health status assessment",
            ),
            choice_question(
                2,
                "symptom_duration",
                "How long have you been experiencing your current symptoms?",
                &["Less than 24 hours", "1-3 days", "1 week", "More than a week"],
                "Symptom timeline for diagnostic assessment",
            ),
            choice_question(
                3,
                "functional_impact",
                "How much do your current symptoms affect your daily activities?",
                &["Not at all", "Slightly", "Moderately", "Severely"],
                "Functional impact assessment",
            ),
        ];
    }

    questions
}
