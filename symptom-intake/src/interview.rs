//! The follow-up interview: what the backend asked for, what the user answered.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::models::{DetailedAnswer, FormState, RecordedAnswer};

/// Progress is reported against this many questions
pub const EXPECTED_QUESTIONS: usize = 10;

/// One row of the Yes/No/Notes questionnaire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuestion {
    pub symptom: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub notes_hint: String,
}

impl StructuredQuestion {
    fn new(symptom: &str, category: &str, notes_hint: &str) -> Self {
        Self {
            symptom: symptom.to_string(),
            category: category.to_string(),
            notes_hint: notes_hint.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    Slider,
    Textarea,
    Checkbox,
    Radio,
    #[default]
    #[serde(other)]
    Text,
}

/// A single question asked one at a time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicQuestion {
    pub question: String,
    #[serde(rename = "type", default)]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// What `/submit_symptoms` asked the wizard to do next
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionPayload {
    Completed,
    StructuredForm(Vec<StructuredQuestion>),
    SingleQuestion(DynamicQuestion),
    Malformed,
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

impl QuestionPayload {
    pub fn classify(value: &Value) -> Self {
        if truthy(value.get("completed")) {
            return QuestionPayload::Completed;
        }

        if value.get("question_type").and_then(Value::as_str) == Some("structured_form") {
            let questions = value
                .get("structured_questions")
                .cloned()
                .and_then(|v| serde_json::from_value::<Vec<StructuredQuestion>>(v).ok())
                .filter(|q| !q.is_empty());
            if let Some(questions) = questions {
                return QuestionPayload::StructuredForm(questions);
            }
        }

        if let Some(question) = value
            .get("question")
            .cloned()
            .and_then(|v| serde_json::from_value::<DynamicQuestion>(v).ok())
        {
            return QuestionPayload::SingleQuestion(question);
        }

        QuestionPayload::Malformed
    }
}

/// What the legacy `/followup` loop answered
#[derive(Debug, Clone, PartialEq)]
pub enum FollowupReply {
    Next(DynamicQuestion),
    Complete,
    Unusable,
}

impl FollowupReply {
    pub fn classify(value: &Value) -> Self {
        let completed = truthy(value.get("completed"));
        let question = value
            .get("question")
            .cloned()
            .and_then(|v| serde_json::from_value::<DynamicQuestion>(v).ok());

        match question {
            Some(_) if completed => FollowupReply::Complete,
            Some(_) if truthy(value.get("final_question")) => FollowupReply::Complete,
            Some(question) => FollowupReply::Next(question),
            None if completed => FollowupReply::Complete,
            None => FollowupReply::Unusable,
        }
    }
}

/// Where the interview panel currently is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InterviewState {
    #[default]
    NotStarted,
    Structured {
        questions: Vec<StructuredQuestion>,
        fallback: bool,
    },
    Dynamic {
        question: DynamicQuestion,
    },
    Legacy {
        question: DynamicQuestion,
    },
    LegacyRetry {
        question: DynamicQuestion,
    },
    LegacyComplete,
    Completed,
}

impl InterviewState {
    pub fn from_payload(payload: QuestionPayload) -> Self {
        match payload {
            QuestionPayload::Completed => InterviewState::Completed,
            QuestionPayload::StructuredForm(questions) => InterviewState::Structured {
                questions,
                fallback: false,
            },
            QuestionPayload::SingleQuestion(question) => InterviewState::Dynamic { question },
            QuestionPayload::Malformed => InterviewState::Structured {
                questions: fallback_structured_questions(),
                fallback: true,
            },
        }
    }

    pub fn structured_questions(&self) -> Option<&[StructuredQuestion]> {
        match self {
            InterviewState::Structured { questions, .. } => Some(questions),
            _ => None,
        }
    }
}

/// Used whenever the backend cannot say what to ask
pub fn fallback_structured_questions() -> Vec<StructuredQuestion> {
    [
        ("Fever is continuous (no breaks)", "general", "e.g., constant vs up/down"),
        ("Fever spikes at certain times daily", "general", "Mention time of spikes"),
        ("Chills or shivering present", "general", ""),
        ("Vomiting even without eating", "gastrointestinal", ""),
        ("Vomiting only after food", "gastrointestinal", ""),
        ("Stool watery", "gastrointestinal", ""),
        ("Stool with mucus", "gastrointestinal", ""),
        ("Stool with blood", "gastrointestinal", ""),
        ("Abdominal pain constant", "gastrointestinal", ""),
        ("Abdominal pain comes in waves (cramps)", "gastrointestinal", ""),
        ("Pain spreads to back/shoulder", "pain", ""),
        ("Rash on skin", "dermatological", ""),
        ("Yellowing of eyes/skin", "general", ""),
        ("Severe headache", "neurological", ""),
        ("Joint or muscle pain", "musculoskeletal", ""),
        ("Recent outside food / street food", "risk_factors", "Give date/place"),
        ("Recent travel", "risk_factors", "Where/when"),
        ("Contact with someone sick", "risk_factors", "Who/when"),
    ]
    .into_iter()
    .map(|(symptom, category, hint)| StructuredQuestion::new(symptom, category, hint))
    .collect()
}

/// One row of a submitted Yes/No/Notes table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuredRow {
    pub symptom: String,
    pub yes: bool,
    pub no: bool,
    pub notes: Option<String>,
}

impl StructuredRow {
    /// `Yes`, `No` or `Not specified`, followed by ` - notes` when notes were given.
    /// `None` for a row left completely blank.
    pub fn answer_text(&self) -> Option<String> {
        let notes = self.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
        if !self.yes && !self.no && notes.is_none() {
            return None;
        }

        let mut answer = if self.yes {
            "Yes".to_string()
        } else if self.no {
            "No".to_string()
        } else {
            "Not specified".to_string()
        };
        if let Some(notes) = notes {
            answer.push_str(" - ");
            answer.push_str(notes);
        }
        Some(answer)
    }
}

/// Record answered rows under their question text. Rows for questions that are not on
/// the table are ignored. Returns how many rows were recorded.
pub fn apply_structured_answers(
    form: &mut FormState,
    questions: &[StructuredQuestion],
    rows: &[StructuredRow],
) -> usize {
    let mut recorded = 0;
    for row in rows {
        if !questions.iter().any(|q| q.symptom == row.symptom) {
            continue;
        }
        if let Some(answer) = row.answer_text() {
            form.detailed_symptoms
                .insert(row.symptom.clone(), DetailedAnswer::Text(answer));
            recorded += 1;
        }
    }
    recorded
}

/// An answer to a single dynamic question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DynamicAnswer {
    Text(String),
    Choices(Vec<String>),
}

impl DynamicAnswer {
    /// Blank text and empty selections are not answers
    pub fn into_detailed(self) -> Option<DetailedAnswer> {
        match self {
            DynamicAnswer::Text(text) if text.trim().is_empty() => None,
            DynamicAnswer::Text(text) => Some(DetailedAnswer::Text(text.trim().to_string())),
            DynamicAnswer::Choices(choices) if choices.is_empty() => None,
            DynamicAnswer::Choices(choices) => Some(DetailedAnswer::Choices(choices)),
        }
    }
}

/// Store an answer from the legacy loop under a key of its own
pub fn record_legacy_answer(form: &mut FormState, question: &str, answer: &str) -> String {
    let now = Utc::now();
    let key = format!(
        "question_{}_{}",
        now.timestamp_millis(),
        &uuid::Uuid::new_v4().simple().to_string()[..9]
    );
    form.detailed_symptoms.insert(
        key.clone(),
        DetailedAnswer::Record(RecordedAnswer {
            question: question.to_string(),
            answer: answer.to_string(),
            timestamp: now,
        }),
    );
    key
}

/// Question number currently being asked and the completion percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current_question: usize,
    pub percentage: u32,
}

pub fn progress(form: &FormState) -> Progress {
    let current_question = form.detailed_symptoms.len() + 1;
    let percentage = ((current_question as f64 / EXPECTED_QUESTIONS as f64) * 100.0).min(100.0);
    Progress {
        current_question,
        percentage: percentage.round() as u32,
    }
}
