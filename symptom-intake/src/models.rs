use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::bmi::{BmiCategory, HeightUnit, TemperatureUnit, WeightUnit};

/// Everything the user has entered across all wizard steps.
///
/// A field that is `None` has not been provided. "Never set" and "cleared" are the same
/// thing here; nothing distinguishes an explicitly empty answer from a missing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_type: Option<String>,
    #[serde(default)]
    pub demographics: Demographics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_conditions: Option<MedicalConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<MedicalHistory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifestyle: Option<Lifestyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_records: Option<MedicalRecords>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vitals: Option<Vitals>,
    /// Selected symptoms, unique, in the order they were picked
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_text_symptoms: Option<String>,
    #[serde(rename = "detailed_symptoms", default)]
    pub detailed_symptoms: BTreeMap<String, DetailedAnswer>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub uploaded_files: BTreeMap<String, UploadedFile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub followup_answers: Vec<FollowupAnswer>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub patient_history_followup_complete: bool,
}

impl FormState {
    /// Add a symptom unless it is already selected. Returns whether it was added.
    pub fn add_symptom(&mut self, symptom: &str) -> bool {
        if self.symptoms.iter().any(|s| s == symptom) {
            return false;
        }
        self.symptoms.push(symptom.to_string());
        true
    }

    /// Remove a symptom; a symptom that is not selected is ignored.
    pub fn remove_symptom(&mut self, symptom: &str) -> bool {
        let before = self.symptoms.len();
        self.symptoms.retain(|s| s != symptom);
        before != self.symptoms.len()
    }

    pub fn vitals_mut(&mut self) -> &mut Vitals {
        self.vitals.get_or_insert_with(Vitals::default)
    }

    /// The patient sub-objects sent when asking for history follow-up questions
    pub fn patient_profile(&self) -> PatientProfile {
        PatientProfile {
            demographics: self.demographics.clone(),
            medical_conditions: self.medical_conditions.clone().unwrap_or_default(),
            medical_history: self.medical_history.clone().unwrap_or_default(),
            lifestyle: self.lifestyle.clone().unwrap_or_default(),
            medical_records: self.medical_records.clone().unwrap_or_default(),
            vitals: self.vitals.clone().unwrap_or_default(),
            case_type: self.case_type.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diabetic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hypertension: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaccine_history: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lifestyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pregnant: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecords {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emr_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taking_medications: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_medications: Option<String>,
}

/// Clinical measurements. Each one is present only if the user supplied it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_rate: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systolic: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diastolic: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_sugar: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_unit: Option<TemperatureUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rhythm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_lung_sounds: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecg_available: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecg_findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_expiratory_flow: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forced_expiratory_volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respiratory_observations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tongue_throat_findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infection_rash_findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_unit: Option<WeightUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_unit: Option<HeightUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waist_circumference: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muscle_mass: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat_mass: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_water: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi_category: Option<BmiCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain_scale: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Vitals {
    pub fn is_empty(&self) -> bool {
        *self == Vitals::default()
    }
}

/// An interview answer: free text, a set of checked options, or a record from the
/// one-question-at-a-time follow-up loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DetailedAnswer {
    Text(String),
    Choices(Vec<String>),
    Record(RecordedAnswer),
}

impl DetailedAnswer {
    pub fn as_display(&self) -> String {
        match self {
            DetailedAnswer::Text(text) => text.clone(),
            DetailedAnswer::Choices(choices) => choices.join(", "),
            DetailedAnswer::Record(record) => record.answer.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedAnswer {
    pub question: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// Metadata of an uploaded document; the bytes are never kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub content_type: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowupAnswer {
    pub question_id: Value,
    pub question: String,
    pub answer: String,
    pub category: String,
}

/// Patient sub-objects plus case type, as sent to `/generate_followup_questions`
/// and `/generate_patient_summary`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub demographics: Demographics,
    pub medical_conditions: MedicalConditions,
    pub medical_history: MedicalHistory,
    pub lifestyle: Lifestyle,
    pub medical_records: MedicalRecords,
    pub vitals: Vitals,
    pub case_type: String,
}

// ---------------------------------------------------------------------------
// Raw step input, as typed by the user
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseTypeSelection {
    pub case_type: String,
}

/// Patient demographics form. Values are kept exactly as entered until the step is committed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientInput {
    pub gender: Option<String>,
    pub age: Option<String>,
    pub date_of_birth: Option<String>,
    pub current_location: Option<String>,
    pub ethnicity: Option<String>,
    pub diabetic: Option<String>,
    pub hypertension: Option<String>,
    pub vaccine_history: Option<String>,
    pub blood_group: Option<String>,
    pub family_history: Option<String>,
    pub travel_history: Option<String>,
    pub occupation: Option<String>,
    pub children: Option<String>,
    pub pregnant: Option<String>,
    pub emr_id: Option<String>,
    pub taking_medications: Option<String>,
    pub current_medications: Option<String>,
}

fn overlay(target: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *target = value;
    }
}

impl PatientInput {
    /// Overlay the fields present in `update` onto this draft
    pub fn merge(&mut self, update: PatientInput) {
        overlay(&mut self.gender, update.gender);
        overlay(&mut self.age, update.age);
        overlay(&mut self.date_of_birth, update.date_of_birth);
        overlay(&mut self.current_location, update.current_location);
        overlay(&mut self.ethnicity, update.ethnicity);
        overlay(&mut self.diabetic, update.diabetic);
        overlay(&mut self.hypertension, update.hypertension);
        overlay(&mut self.vaccine_history, update.vaccine_history);
        overlay(&mut self.blood_group, update.blood_group);
        overlay(&mut self.family_history, update.family_history);
        overlay(&mut self.travel_history, update.travel_history);
        overlay(&mut self.occupation, update.occupation);
        overlay(&mut self.children, update.children);
        overlay(&mut self.pregnant, update.pregnant);
        overlay(&mut self.emr_id, update.emr_id);
        overlay(&mut self.taking_medications, update.taking_medications);
        overlay(&mut self.current_medications, update.current_medications);
    }
}

/// Clinical vitals form, values as entered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsInput {
    pub pulse_rate: Option<String>,
    pub systolic: Option<String>,
    pub diastolic: Option<String>,
    pub oxygen_saturation: Option<String>,
    pub blood_sugar: Option<String>,
    pub temperature: Option<String>,
    pub temperature_unit: Option<String>,
    pub respiratory_rate: Option<String>,
    pub heart_rhythm: Option<String>,
    pub heart_murmur: Option<String>,
    pub ecg_available: Option<String>,
    pub ecg_findings: Option<String>,
    pub peak_flow: Option<String>,
    pub fev1: Option<String>,
    pub respiratory_notes: Option<String>,
    pub tongue_throat_comments: Option<String>,
    pub infection_comments: Option<String>,
    pub weight: Option<String>,
    pub weight_unit: Option<String>,
    pub height: Option<String>,
    pub height_unit: Option<String>,
    pub waist_circumference: Option<String>,
    pub muscle_mass: Option<String>,
    pub fat_mass: Option<String>,
    pub body_water: Option<String>,
    pub pain_scale: Option<String>,
    pub notes: Option<String>,
}

impl VitalsInput {
    pub fn merge(&mut self, update: VitalsInput) {
        overlay(&mut self.pulse_rate, update.pulse_rate);
        overlay(&mut self.systolic, update.systolic);
        overlay(&mut self.diastolic, update.diastolic);
        overlay(&mut self.oxygen_saturation, update.oxygen_saturation);
        overlay(&mut self.blood_sugar, update.blood_sugar);
        overlay(&mut self.temperature, update.temperature);
        overlay(&mut self.temperature_unit, update.temperature_unit);
        overlay(&mut self.respiratory_rate, update.respiratory_rate);
        overlay(&mut self.heart_rhythm, update.heart_rhythm);
        overlay(&mut self.heart_murmur, update.heart_murmur);
        overlay(&mut self.ecg_available, update.ecg_available);
        overlay(&mut self.ecg_findings, update.ecg_findings);
        overlay(&mut self.peak_flow, update.peak_flow);
        overlay(&mut self.fev1, update.fev1);
        overlay(&mut self.respiratory_notes, update.respiratory_notes);
        overlay(&mut self.tongue_throat_comments, update.tongue_throat_comments);
        overlay(&mut self.infection_comments, update.infection_comments);
        overlay(&mut self.weight, update.weight);
        overlay(&mut self.weight_unit, update.weight_unit);
        overlay(&mut self.height, update.height);
        overlay(&mut self.height_unit, update.height_unit);
        overlay(&mut self.waist_circumference, update.waist_circumference);
        overlay(&mut self.muscle_mass, update.muscle_mass);
        overlay(&mut self.fat_mass, update.fat_mass);
        overlay(&mut self.body_water, update.body_water);
        overlay(&mut self.pain_scale, update.pain_scale);
        overlay(&mut self.notes, update.notes);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileUploadRequest {
    pub field_id: String,
    pub name: String,
    pub size: u64,
    #[serde(rename = "type", default)]
    pub content_type: String,
}

#[derive(Debug, Deserialize)]
pub struct SymptomRequest {
    pub symptom: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct FreeTextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryAnswerRequest {
    #[serde(default)]
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct InterviewAnswerRequest {
    pub answer: crate::interview::DynamicAnswer,
}

#[derive(Debug, Deserialize)]
pub struct StructuredAnswersRequest {
    #[serde(default)]
    pub answers: Vec<crate::interview::StructuredRow>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LegacyAnswerRequest {
    #[serde(default)]
    pub answer: Option<String>,
}

// ---------------------------------------------------------------------------
// Collaborator payloads
// ---------------------------------------------------------------------------

/// Final analysis returned by `/analyze`. Missing fields fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisReport {
    pub analysis: Option<String>,
    pub possible_conditions: Vec<PossibleCondition>,
    pub diagnostic_tests: Vec<DiagnosticTest>,
    pub recommendations: Option<Recommendations>,
}

impl AnalysisReport {
    /// Read a report out of an arbitrary JSON body; unusable bodies yield an empty report
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PossibleCondition {
    pub condition: Option<String>,
    pub name: Option<String>,
    pub confidence_score: Option<Value>,
    pub probability: Option<Value>,
    pub likelihood: Option<Value>,
    pub icd11_code: Option<String>,
    pub icd11_title: Option<String>,
    pub explanation: Option<String>,
    pub description: Option<String>,
    pub details: Option<String>,
}

impl PossibleCondition {
    pub fn display_name(&self, index: usize) -> String {
        self.condition
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| format!("Condition {}", index + 1))
    }

    pub fn confidence(&self) -> String {
        [&self.confidence_score, &self.probability, &self.likelihood]
            .into_iter()
            .flatten()
            .find(|v| !v.is_null())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "Not specified".to_string())
    }

    /// ICD-11 code, unless the collaborator left it out or marked it unspecified
    pub fn icd11(&self) -> Option<&str> {
        self.icd11_code
            .as_deref()
            .filter(|code| !code.is_empty() && *code != "Not specified")
    }

    pub fn summary(&self) -> String {
        self.explanation
            .clone()
            .or_else(|| self.description.clone())
            .or_else(|| self.details.clone())
            .unwrap_or_else(|| "No description available".to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticTest {
    pub test: Option<String>,
    pub name: Option<String>,
    pub priority: Option<String>,
    pub urgency: Option<String>,
    pub explanation: Option<String>,
    pub reason: Option<String>,
    pub description: Option<String>,
    pub purpose: Option<String>,
}

impl DiagnosticTest {
    pub fn display_name(&self, index: usize) -> String {
        self.test
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| format!("Test {}", index + 1))
    }

    pub fn display_priority(&self) -> String {
        self.priority
            .clone()
            .or_else(|| self.urgency.clone())
            .unwrap_or_else(|| "Standard".to_string())
    }

    pub fn display_reason(&self) -> String {
        self.explanation
            .clone()
            .or_else(|| self.reason.clone())
            .or_else(|| self.description.clone())
            .or_else(|| self.purpose.clone())
            .unwrap_or_else(|| "Diagnostic evaluation".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recommendations {
    Html(String),
    List(Vec<String>),
}

/// Result of `/extract_labels`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelExtraction {
    pub extracted_labels: BTreeMap<String, LabelDetail>,
    pub label_count: u32,
    pub correlation_matrix: BTreeMap<String, Value>,
    pub feature_questions: Vec<Value>,
}

impl LabelExtraction {
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Correlation entries per label; malformed entries are skipped
    pub fn correlations(&self) -> Vec<(String, Correlation)> {
        self.correlation_matrix
            .iter()
            .filter_map(|(label, entries)| entries.as_array().map(|list| (label, list)))
            .flat_map(|(label, list)| {
                list.iter().filter_map(move |entry| {
                    serde_json::from_value::<Correlation>(entry.clone())
                        .ok()
                        .map(|c| (label.clone(), c))
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelDetail {
    pub confidence: Option<String>,
    pub relevance: Option<String>,
    pub description: Option<String>,
    pub medical_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub label: String,
    #[serde(default)]
    pub strength: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub questions: Vec<String>,
}

/// One question of the patient-history questionnaire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryQuestion {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub category: String,
    pub question: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub relevance: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub min: Option<i64>,
    #[serde(default)]
    pub max: Option<i64>,
    #[serde(default)]
    pub min_label: Option<String>,
    #[serde(default)]
    pub max_label: Option<String>,
}

/// AI-generated patient history summary shown after leaving the history step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientSummary {
    pub patient_summary: SummarySections,
    pub vitals_abnormalities: VitalsAbnormalities,
    pub medical_significance: MedicalSignificance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySections {
    pub demographics_summary: String,
    pub medical_history_summary: String,
    pub risk_factors_summary: String,
    pub clinical_relevance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsAbnormalities {
    pub critical_abnormalities: Vec<String>,
    pub moderate_abnormalities: Vec<String>,
    pub mild_abnormalities: Vec<String>,
    pub normal_findings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicalSignificance {
    pub diagnostic_indicators: String,
    pub objective_findings: String,
    pub clinical_correlations: String,
    pub next_steps: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_symptom_keeps_one_occurrence() {
        let mut form = FormState::default();
        assert!(form.add_symptom("Headache"));
        assert!(!form.add_symptom("Headache"));
        assert_eq!(form.symptoms, vec!["Headache".to_string()]);
    }

    #[test]
    fn remove_missing_symptom_is_noop() {
        let mut form = FormState::default();
        form.add_symptom("Cough");
        assert!(!form.remove_symptom("Fever"));
        assert_eq!(form.symptoms, vec!["Cough".to_string()]);
        assert!(form.remove_symptom("Cough"));
        assert!(form.symptoms.is_empty());
    }

    #[test]
    fn form_state_serializes_with_wire_names_and_omits_absent_fields() {
        let mut form = FormState {
            case_type: Some("fever".to_string()),
            ..Default::default()
        };
        form.demographics.age = Some(34);
        form.detailed_symptoms.insert(
            "Rash on skin".to_string(),
            DetailedAnswer::Text("Yes".to_string()),
        );

        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["caseType"], "fever");
        assert_eq!(value["demographics"], json!({ "age": 34 }));
        assert_eq!(value["detailed_symptoms"]["Rash on skin"], "Yes");
        assert!(value.get("vitals").is_none());
        assert!(value.get("freeTextSymptoms").is_none());
        assert!(value.get("patientHistoryFollowupComplete").is_none());
    }

    #[test]
    fn detailed_answer_shapes() {
        let text: DetailedAnswer = serde_json::from_value(json!("Yes - mornings")).unwrap();
        assert_eq!(text.as_display(), "Yes - mornings");

        let choices: DetailedAnswer = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(choices.as_display(), "a, b");

        let record: DetailedAnswer = serde_json::from_value(json!({
            "question": "Where?",
            "answer": "Left side",
            "timestamp": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(record.as_display(), "Left side");
    }

    #[test]
    fn analysis_report_tolerates_missing_and_odd_fields() {
        let report = AnalysisReport::from_value(json!({
            "possible_conditions": [
                { "name": "Influenza", "probability": 0.7 },
                { "icd11_code": "Not specified" }
            ],
            "recommendations": ["Rest", "Fluids"]
        }));

        assert!(report.analysis.is_none());
        assert_eq!(report.possible_conditions[0].display_name(0), "Influenza");
        assert_eq!(report.possible_conditions[0].confidence(), "0.7");
        assert_eq!(report.possible_conditions[1].display_name(1), "Condition 2");
        assert_eq!(report.possible_conditions[1].confidence(), "Not specified");
        assert!(report.possible_conditions[1].icd11().is_none());
        assert_eq!(
            report.recommendations,
            Some(Recommendations::List(vec!["Rest".into(), "Fluids".into()]))
        );

        assert_eq!(AnalysisReport::from_value(json!("oops")), AnalysisReport::default());
    }

    #[test]
    fn correlations_skip_malformed_entries() {
        let labels = LabelExtraction::from_value(json!({
            "label_count": 2,
            "correlation_matrix": {
                "fever": [{ "label": "chills", "strength": "High" }, { "nope": 1 }],
                "cough": "not a list"
            }
        }));

        let correlations = labels.correlations();
        assert_eq!(correlations.len(), 1);
        assert_eq!(correlations[0].0, "fever");
        assert_eq!(correlations[0].1.label, "chills");
    }
}
