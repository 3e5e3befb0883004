//! Patient summary shown after the history step, with a rule-based stand-in for when
//! the backend cannot produce one.

use serde_json::Value;

use crate::bmi::TemperatureUnit;
use crate::models::{
    FormState, MedicalSignificance, PatientSummary, SummarySections, Vitals, VitalsAbnormalities,
};
use crate::render::title_case;

/// Read a summary out of a backend response. Responses without any section yield `None`.
pub fn from_response(value: &Value) -> Option<PatientSummary> {
    value.get("patient_summary")?;
    serde_json::from_value(value.clone()).ok()
}

pub fn fallback(form: &FormState) -> PatientSummary {
    PatientSummary {
        patient_summary: fallback_sections(form),
        vitals_abnormalities: vitals_abnormalities(&form.vitals.clone().unwrap_or_default()),
        medical_significance: medical_significance(),
    }
}

fn fallback_sections(form: &FormState) -> SummarySections {
    let mut demographics = String::from("<p><strong>Patient Demographics:</strong></p><ul>");
    if let Some(age) = form.demographics.age.filter(|a| *a != 0) {
        let note = if age > 65 {
            "Geriatric patient, increased complication risk"
        } else if age < 18 {
            "Pediatric patient, specialized care considerations"
        } else {
            "Adult patient"
        };
        demographics.push_str(&format!(
            "<li><strong>Age (O):</strong> {age} years - <em>{note}</em></li>"
        ));
    }
    if let Some(gender) = form.demographics.gender.as_deref() {
        demographics.push_str(&format!(
            "<li><strong>Gender (O):</strong> {}</li>",
            crate::render::escape(&title_case(gender))
        ));
    }
    demographics.push_str("</ul>");

    let conditions = form.medical_conditions.clone().unwrap_or_default();
    let mut history = String::from("<p><strong>Medical Conditions:</strong></p><ul>");
    if conditions.diabetic.as_deref() == Some("yes") {
        history.push_str(
            "<li><strong>Diabetes (D):</strong> Present - Increased infection risk, wound healing complications</li>",
        );
    }
    if conditions.hypertension.as_deref() == Some("yes") {
        history.push_str("<li><strong>Hypertension (D):</strong> Present - Cardiovascular risk factor</li>");
    }
    history.push_str("</ul>");

    SummarySections {
        demographics_summary: demographics,
        medical_history_summary: history,
        risk_factors_summary: "<p>Basic risk assessment - comprehensive analysis requires AI processing</p>"
            .to_string(),
        clinical_relevance:
            "<p>Clinical significance analysis requires AI processing for comprehensive assessment</p>"
                .to_string(),
    }
}

/// Sort the recorded vitals into critical, moderate and mild findings
pub fn vitals_abnormalities(vitals: &Vitals) -> VitalsAbnormalities {
    let mut out = VitalsAbnormalities::default();

    if let (Some(systolic), Some(diastolic)) = (vitals.systolic, vitals.diastolic) {
        let bp = format!("{systolic}/{diastolic} mmHg");
        if systolic >= 180 || diastolic >= 120 {
            out.critical_abnormalities
                .push(format!("Hypertensive Crisis: BP {bp} - Immediate medical attention required"));
        } else if systolic >= 140 || diastolic >= 90 {
            out.moderate_abnormalities.push(format!(
                "Hypertension: BP {bp} - Cardiovascular risk, medication review needed"
            ));
        } else if systolic < 90 || diastolic < 60 {
            out.moderate_abnormalities
                .push(format!("Hypotension: BP {bp} - Risk of organ hypoperfusion"));
        } else {
            out.normal_findings.push(format!("Blood Pressure: {bp} - Normal range"));
        }
    }

    if let Some(temp) = vitals.temperature {
        if vitals.temperature_unit.unwrap_or_default() == TemperatureUnit::F {
            if temp >= 103.0 {
                out.critical_abnormalities
                    .push(format!("High Fever: {temp}°F - Risk of febrile seizures, dehydration"));
            } else if temp >= 100.4 {
                out.mild_abnormalities
                    .push(format!("Fever: {temp}°F - Indicates infection or inflammatory process"));
            } else if temp < 96.0 {
                out.moderate_abnormalities
                    .push(format!("Hypothermia: {temp}°F - May indicate sepsis or exposure"));
            } else {
                out.normal_findings.push(format!("Temperature: {temp}°F - Normal range"));
            }
        }
    }

    if let Some(spo2) = vitals.oxygen_saturation {
        if spo2 < 90 {
            out.critical_abnormalities.push(format!(
                "Severe Hypoxemia: SpO2 {spo2}% - Respiratory failure, requires immediate oxygen"
            ));
        } else if spo2 < 95 {
            out.moderate_abnormalities
                .push(format!("Mild Hypoxemia: SpO2 {spo2}% - Monitor respiratory status"));
        } else {
            out.normal_findings
                .push(format!("Oxygen Saturation: {spo2}% - Normal oxygenation"));
        }
    }

    if let Some(pulse) = vitals.pulse_rate {
        if pulse < 50 {
            out.moderate_abnormalities.push(format!(
                "Bradycardia: {pulse} BPM - Consider cardiac conditions, medications"
            ));
        } else if pulse > 120 {
            out.moderate_abnormalities.push(format!(
                "Tachycardia: {pulse} BPM - May indicate fever, dehydration, cardiac issues"
            ));
        } else {
            out.normal_findings.push(format!("Pulse Rate: {pulse} BPM - Normal range"));
        }
    }

    if let Some(glucose) = vitals.blood_sugar {
        if glucose >= 300 {
            out.critical_abnormalities.push(format!(
                "Severe Hyperglycemia: {glucose} mg/dL - Diabetic emergency risk"
            ));
        } else if glucose >= 200 {
            out.moderate_abnormalities
                .push(format!("Hyperglycemia: {glucose} mg/dL - Diabetic crisis risk"));
        } else if glucose < 70 {
            out.moderate_abnormalities
                .push(format!("Hypoglycemia: {glucose} mg/dL - Risk of altered mental status"));
        } else {
            out.normal_findings
                .push(format!("Blood Sugar: {glucose} mg/dL - Normal range"));
        }
    }

    out
}

fn medical_significance() -> MedicalSignificance {
    MedicalSignificance {
        diagnostic_indicators: "<p><strong>Diagnostic Indicators (D):</strong> Patient demographics, medical history, and presenting symptoms provide diagnostic context for clinical evaluation.</p>".to_string(),
        objective_findings: "<p><strong>Objective Findings (O):</strong> Vital signs, physical measurements, and documented medical conditions represent measurable clinical data.</p>".to_string(),
        clinical_correlations: "<p><strong>Clinical Correlations:</strong> Integration of patient history, risk factors, and current clinical status guides differential diagnosis.</p>".to_string(),
        next_steps: "<p><strong>Recommended Next Steps:</strong> Continue with symptom assessment and clinical evaluation based on collected patient information.</p>".to_string(),
    }
}
