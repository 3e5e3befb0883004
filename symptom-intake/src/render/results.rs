//! Results panel: a summary of everything gathered followed by the analysis report.

use super::{capitalize, escape, number, title_case};
use crate::bmi::TemperatureUnit;
use crate::models::{AnalysisReport, FormState, Recommendations, Vitals};

const DISCLAIMER: &str = r#"<div class="disclaimer-section">
    <div class="disclaimer-content">
        <h4>⚠️ Important Medical Disclaimer</h4>
        <p><strong>This is an AI-powered medical assessment tool for informational purposes only.</strong></p>
        <ul>
            <li>This analysis is not a substitute for professional medical diagnosis</li>
            <li>Always consult with a qualified healthcare provider for proper medical evaluation</li>
            <li>In case of emergency, contact your local emergency services immediately</li>
            <li>Do not make medical decisions based solely on this analysis</li>
        </ul>
    </div>
</div>"#;

fn insight(text: &str) -> String {
    format!(" <em>({text})</em>")
}

fn summary_item(title: &str, content: &str) -> String {
    format!(
        r#"<div class="summary-item"><h4 class="summary-item-title">{title}</h4><div class="summary-content">{content}</div></div>"#
    )
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn patient_information(form: &FormState) -> Option<String> {
    let demographics = &form.demographics;
    let has_demographics = demographics.gender.is_some()
        || demographics.age.is_some()
        || demographics.ethnicity.is_some()
        || demographics.current_location.is_some()
        || demographics.date_of_birth.is_some();
    let has_history = form.medical_conditions.is_some() || form.medical_history.is_some();
    if !has_demographics && !has_history && form.lifestyle.is_none() && form.medical_records.is_none() {
        return None;
    }

    let mut html = String::new();
    if has_demographics {
        html.push_str(r#"<div class="info-subsection"><h5>Basic Demographics</h5>"#);
        if let Some(gender) = filled(&demographics.gender) {
            html.push_str(&format!("<p><strong>Gender:</strong> {}</p>", escape(&capitalize(gender))));
        }
        if let Some(age) = demographics.age.filter(|a| *a != 0) {
            let note = if age < 18 {
                insight("Pediatric patient - requires specialized considerations")
            } else if age > 65 {
                insight("Geriatric patient - higher risk for complications, polypharmacy concerns")
            } else {
                String::new()
            };
            html.push_str(&format!("<p><strong>Age:</strong> {age} years{note}</p>"));
        }
        if let Some(ethnicity) = filled(&demographics.ethnicity) {
            html.push_str(&format!(
                "<p><strong>Ethnicity:</strong> {}</p>",
                escape(&title_case(&ethnicity.replace('-', " ")))
            ));
        }
        if let Some(location) = filled(&demographics.current_location) {
            html.push_str(&format!("<p><strong>Current Location:</strong> {}</p>", escape(location)));
        }
        html.push_str("</div>");
    }

    if has_history {
        html.push_str(r#"<div class="info-subsection"><h5>Medical History &amp; Conditions</h5>"#);
        if let Some(conditions) = &form.medical_conditions {
            if let Some(diabetic) = filled(&conditions.diabetic).filter(|d| *d != "no") {
                let note = if diabetic == "yes" {
                    insight("⚠️ Increases infection risk, affects wound healing, may complicate treatment")
                } else {
                    insight("Unknown status requires investigation")
                };
                html.push_str(&format!("<p><strong>Diabetes:</strong> {}{note}</p>", escape(diabetic)));
            }
            if let Some(hypertension) = filled(&conditions.hypertension).filter(|h| *h != "no") {
                let note = if hypertension == "yes" {
                    insight("⚠️ Cardiovascular risk factor, may affect anesthesia/surgery planning")
                } else {
                    insight("Unknown status requires investigation")
                };
                html.push_str(&format!(
                    "<p><strong>Hypertension:</strong> {}{note}</p>",
                    escape(hypertension)
                ));
            }
        }
        if let Some(history) = &form.medical_history {
            if let Some(group) = filled(&history.blood_group).filter(|g| *g != "unknown") {
                html.push_str(&format!(
                    "<p><strong>Blood Group:</strong> {}{}</p>",
                    escape(group),
                    insight("Important for emergency transfusions")
                ));
            }
            if let Some(family) = filled(&history.family_history) {
                html.push_str(&format!(
                    "<p><strong>Family History:</strong> {}{}</p>",
                    escape(family),
                    insight("⚠️ Genetic predisposition factors to consider")
                ));
            }
            if let Some(vaccines) = filled(&history.vaccine_history) {
                html.push_str(&format!(
                    "<p><strong>Vaccination History:</strong> {}</p>",
                    escape(vaccines)
                ));
            }
        }
        if let Some(records) = &form.medical_records {
            if records.taking_medications.as_deref() == Some("yes") {
                if let Some(medications) = filled(&records.current_medications) {
                    html.push_str(&format!(
                        "<p><strong>Current Medications:</strong> {}{}</p>",
                        escape(medications),
                        insight("⚠️ Drug interactions and contraindications must be evaluated")
                    ));
                }
            }
            if let Some(emr) = filled(&records.emr_id) {
                html.push_str(&format!(
                    "<p><strong>EMR/EHR ID:</strong> {}{}</p>",
                    escape(emr),
                    insight("Previous medical records available for review")
                ));
            }
        }
        if let Some(lifestyle) = &form.lifestyle {
            if let Some(travel) = filled(&lifestyle.travel_history) {
                html.push_str(&format!(
                    "<p><strong>Recent Travel:</strong> {}{}</p>",
                    escape(travel),
                    insight("⚠️ Consider endemic diseases and travel-related infections")
                ));
            }
            if let Some(occupation) = filled(&lifestyle.occupation) {
                html.push_str(&format!(
                    "<p><strong>Occupation:</strong> {}{}</p>",
                    escape(occupation),
                    insight("Consider occupational exposures and hazards")
                ));
            }
        }
        html.push_str("</div>");
    }

    Some(summary_item("Patient Information", &html))
}

fn temperature_note(temp: f64, unit: TemperatureUnit) -> String {
    let (high, fever, low) = match unit {
        TemperatureUnit::F => (103.0, 100.4, 96.0),
        TemperatureUnit::C => (39.4, 38.0, 35.5),
    };
    if temp >= high {
        insight("🚨 HIGH FEVER - Risk of febrile seizures, dehydration")
    } else if temp >= fever {
        insight("⚠️ FEVER - Indicates infection or inflammatory process")
    } else if temp < low {
        insight("⚠️ HYPOTHERMIA - May indicate sepsis, exposure, or metabolic issues")
    } else {
        insight("✓ Normal temperature")
    }
}

fn clinical_vitals(vitals: &Vitals) -> Option<String> {
    if vitals.is_empty() {
        return None;
    }

    let mut html = String::from(r#"<div class="info-subsection"><h5>Vital Signs</h5>"#);

    if let Some(pulse) = vitals.pulse_rate.filter(|p| *p != 0) {
        let note = if pulse < 60 {
            insight("⚠️ BRADYCARDIA - Consider cardiac conditions, medications, hypothermia")
        } else if pulse > 100 {
            insight("⚠️ TACHYCARDIA - May indicate fever, dehydration, anxiety, sepsis, or cardiac issues")
        } else {
            insight("✓ Normal range")
        };
        html.push_str(&format!("<p><strong>Pulse Rate:</strong> {pulse} BPM{note}</p>"));
    }

    if let (Some(systolic), Some(diastolic)) = (
        vitals.systolic.filter(|s| *s != 0),
        vitals.diastolic.filter(|d| *d != 0),
    ) {
        let note = if systolic >= 180 || diastolic >= 120 {
            insight("🚨 HYPERTENSIVE CRISIS - Immediate medical attention required")
        } else if systolic >= 140 || diastolic >= 90 {
            insight("⚠️ HYPERTENSION - Cardiovascular risk, medication review needed")
        } else if systolic < 90 || diastolic < 60 {
            insight("⚠️ HYPOTENSION - Risk of organ hypoperfusion, check for shock")
        } else {
            insight("✓ Normal range")
        };
        html.push_str(&format!(
            "<p><strong>Blood Pressure:</strong> {systolic}/{diastolic} mmHg{note}</p>"
        ));
    }

    if let Some(spo2) = vitals.oxygen_saturation.filter(|s| *s != 0) {
        let note = if spo2 < 90 {
            insight("🚨 SEVERE HYPOXEMIA - Respiratory failure, requires immediate oxygen therapy")
        } else if spo2 < 95 {
            insight("⚠️ MILD HYPOXEMIA - Monitor respiratory status, consider supplemental oxygen")
        } else {
            insight("✓ Normal oxygenation")
        };
        html.push_str(&format!("<p><strong>Oxygen Saturation:</strong> {spo2}%{note}</p>"));
    }

    if let Some(temp) = vitals.temperature.filter(|t| *t != 0.0) {
        let unit = vitals.temperature_unit.unwrap_or_default();
        html.push_str(&format!(
            "<p><strong>Temperature:</strong> {}°{}{}</p>",
            number(temp),
            unit.as_str(),
            temperature_note(temp, unit)
        ));
    }

    if let Some(glucose) = vitals.blood_sugar.filter(|g| *g != 0) {
        let note = if glucose >= 200 {
            insight("⚠️ HYPERGLYCEMIA - Diabetic crisis risk, ketoacidosis concern")
        } else if glucose < 70 {
            insight("⚠️ HYPOGLYCEMIA - Risk of altered mental status, seizures")
        } else {
            insight("✓ Normal glucose level")
        };
        html.push_str(&format!("<p><strong>Blood Sugar:</strong> {glucose} mg/dL{note}</p>"));
    }
    html.push_str("</div>");

    let weight = vitals.weight.filter(|w| *w != 0.0);
    let height = vitals.height.filter(|h| *h != 0.0);
    let bmi = vitals.bmi.filter(|b| *b != 0.0);
    if weight.is_some() || height.is_some() || bmi.is_some() {
        html.push_str(r#"<div class="info-subsection"><h5>Physical Measurements</h5>"#);
        if let Some(weight) = weight {
            html.push_str(&format!(
                "<p><strong>Weight:</strong> {} {}</p>",
                number(weight),
                vitals.weight_unit.unwrap_or_default().as_str()
            ));
        }
        if let Some(height) = height {
            html.push_str(&format!(
                "<p><strong>Height:</strong> {} {}</p>",
                number(height),
                vitals.height_unit.unwrap_or_default().as_str()
            ));
        }
        if let Some(bmi) = bmi {
            let note = if bmi < 18.5 {
                insight("⚠️ UNDERWEIGHT - Nutritional assessment needed, increased infection risk")
            } else if bmi >= 30.0 {
                insight("⚠️ OBESITY - Increased surgical risk, comorbidity potential")
            } else if bmi >= 25.0 {
                insight("⚠️ OVERWEIGHT - Monitor for metabolic complications")
            } else {
                insight("✓ Normal weight")
            };
            let category = vitals
                .bmi_category
                .map(|c| c.as_str().to_string())
                .unwrap_or_default();
            html.push_str(&format!(
                "<p><strong>BMI:</strong> {} ({category}){note}</p>",
                number(bmi)
            ));
        }
        html.push_str("</div>");
    }

    if let Some(pain) = vitals.pain_scale {
        let note = if pain >= 7 {
            insight("⚠️ SEVERE PAIN - Requires immediate pain management, functional impairment")
        } else if pain >= 4 {
            insight("⚠️ MODERATE PAIN - May interfere with daily activities, requires treatment")
        } else if pain >= 1 {
            insight("MILD PAIN - Monitor and provide comfort measures")
        } else {
            insight("✓ No pain reported")
        };
        html.push_str(&format!(
            r#"<div class="info-subsection"><h5>Pain Assessment</h5><p><strong>Pain Level:</strong> {pain}/10{note}</p></div>"#
        ));
    }

    let rate = vitals.respiratory_rate.filter(|r| *r != 0);
    let rhythm = filled(&vitals.heart_rhythm);
    if rate.is_some() || rhythm.is_some() {
        html.push_str(r#"<div class="info-subsection"><h5>Additional Measurements</h5>"#);
        if let Some(rate) = rate {
            let note = if rate > 24 {
                insight("⚠️ TACHYPNEA - Respiratory distress, metabolic acidosis")
            } else if rate < 12 {
                insight("⚠️ BRADYPNEA - CNS depression, drug effect")
            } else {
                insight("✓ Normal respiratory rate")
            };
            html.push_str(&format!("<p><strong>Respiratory Rate:</strong> {rate}/min{note}</p>"));
        }
        if let Some(rhythm) = rhythm.filter(|r| *r != "unknown") {
            let note = if rhythm == "irregular" {
                insight("⚠️ IRREGULAR RHYTHM - Requires ECG evaluation, arrhythmia workup")
            } else {
                insight("✓ Regular heart rhythm")
            };
            html.push_str(&format!(
                "<p><strong>Heart Rhythm:</strong> {}{note}</p>",
                escape(rhythm)
            ));
        }
        html.push_str("</div>");
    }

    Some(summary_item("Clinical Vitals &amp; Measurements", &html))
}

fn symptom_flag(symptom: &str) -> Option<&'static str> {
    let lower = symptom.to_lowercase();
    if lower.contains("chest pain") {
        Some("⚠️ RED FLAG - Cardiac evaluation required")
    } else if lower.contains("shortness of breath") || lower.contains("dyspnea") {
        Some("⚠️ Respiratory or cardiac concern")
    } else if lower.contains("severe headache") {
        Some("⚠️ Neurological evaluation needed")
    } else if lower.contains("abdominal pain") {
        Some("⚠️ Surgical evaluation may be required")
    } else if lower.contains("fever") {
        Some("⚠️ Infectious process likely")
    } else {
        None
    }
}

fn primary_symptoms(form: &FormState) -> Option<String> {
    if form.symptoms.is_empty() {
        return None;
    }
    let mut html = String::from(r#"<div class="info-subsection"><h5>Reported Symptoms</h5><ul>"#);
    for symptom in &form.symptoms {
        let note = symptom_flag(symptom).map(insight).unwrap_or_default();
        html.push_str(&format!("<li>{}{note}</li>", escape(symptom)));
    }
    html.push_str("</ul>");
    if let Some(text) = filled(&form.free_text_symptoms) {
        html.push_str(&format!(
            "<p><strong>Additional Description:</strong> {}</p>",
            escape(text)
        ));
    }
    html.push_str("</div>");
    Some(summary_item("Primary Symptoms", &html))
}

fn answer_flag(question: &str, answer: &str) -> Option<&'static str> {
    let answer = answer.to_lowercase();
    if !answer.contains("yes") && !answer.contains("positive") {
        return None;
    }
    let q = question.to_lowercase();
    let has = |a: &str, b: &str| q.contains(a) && q.contains(b);
    if has("fever", "continuous") {
        Some("⚠️ Continuous fever suggests bacterial infection")
    } else if has("blood", "stool") {
        Some("⚠️ GI bleeding - requires urgent evaluation")
    } else if has("vomiting", "eating") {
        Some("⚠️ Suggests gastric outlet obstruction or severe gastroparesis")
    } else if has("pain", "spreads") {
        Some("⚠️ Radiating pain may indicate organ involvement")
    } else if has("recent", "travel") {
        Some("⚠️ Travel history relevant for endemic diseases")
    } else if has("contact", "sick") {
        Some("⚠️ Exposure history important for contagious diseases")
    } else {
        None
    }
}

fn interview_responses(form: &FormState) -> Option<String> {
    if form.detailed_symptoms.is_empty() {
        return None;
    }
    let mut html =
        String::from(r#"<div class="info-subsection"><h5>Structured Assessment Responses</h5><ul>"#);
    for (question, answer) in &form.detailed_symptoms {
        let answer = answer.as_display();
        let note = answer_flag(question, &answer).map(insight).unwrap_or_default();
        html.push_str(&format!(
            "<li><strong>{}:</strong> {}{note}</li>",
            escape(question),
            escape(&answer)
        ));
    }
    html.push_str("</ul></div>");
    Some(summary_item("Additional Information (Interview Responses)", &html))
}

fn report_sections(report: &AnalysisReport) -> String {
    let mut html = String::new();

    if let Some(analysis) = report.analysis.as_deref().filter(|a| !a.is_empty()) {
        html.push_str(&format!(
            r#"<div class="medical-analysis-section"><h3 class="analysis-section-header">Medical Analysis</h3><div class="analysis-content">{analysis}</div></div>"#
        ));
    }

    if !report.possible_conditions.is_empty() {
        html.push_str(r#"<div class="conditions-section"><h3 class="analysis-section-header">Possible Conditions</h3><div class="conditions-list">"#);
        for (index, condition) in report.possible_conditions.iter().enumerate() {
            let icd = match condition.icd11() {
                Some(code) => {
                    let title = condition
                        .icd11_title
                        .as_deref()
                        .filter(|t| !t.is_empty())
                        .map(|t| format!(r#"<div class="icd-code-title">{}</div>"#, escape(t)))
                        .unwrap_or_default();
                    format!(
                        r#"<span class="icd-code-label">ICD-11:</span><span class="icd-code-value">{}</span>{title}"#,
                        escape(code)
                    )
                }
                None => r#"<span class="icd-code-label">ICD-11:</span><span class="icd-code-pending">Classification pending</span>"#.to_string(),
            };
            html.push_str(&format!(
                r#"<div class="condition-card"><h4 class="condition-title">{}</h4><div class="condition-probability">Confidence: {}</div><div class="condition-icd-code"><div class="icd-code-container">{icd}</div></div><p class="condition-description">{}</p></div>"#,
                escape(&condition.display_name(index)),
                escape(&condition.confidence()),
                escape(&condition.summary()),
            ));
        }
        html.push_str("</div></div>");
    }

    if !report.diagnostic_tests.is_empty() {
        html.push_str(r#"<div class="tests-section"><h3 class="analysis-section-header">Recommended Diagnostic Tests</h3><div class="tests-list">"#);
        for (index, test) in report.diagnostic_tests.iter().enumerate() {
            html.push_str(&format!(
                r#"<div class="test-card"><h4 class="test-title">{}</h4><div class="test-priority">Priority: {}</div><p class="test-reason">{}</p></div>"#,
                escape(&test.display_name(index)),
                escape(&test.display_priority()),
                escape(&test.display_reason()),
            ));
        }
        html.push_str("</div></div>");
    }

    let recommendations = match &report.recommendations {
        Some(Recommendations::Html(html)) if !html.is_empty() => Some(html.clone()),
        Some(Recommendations::List(items)) => Some(format!(
            "<ul>{}</ul>",
            items
                .iter()
                .map(|item| format!("<li>{}</li>", escape(item)))
                .collect::<String>()
        )),
        _ => None,
    };
    if let Some(content) = recommendations {
        html.push_str(&format!(
            r#"<div class="recommendations-section"><h3 class="analysis-section-header">Medical Recommendations</h3><div class="recommendations-content">{content}</div></div>"#
        ));
    }

    html
}

/// The full results panel for a finished analysis
pub fn analysis_panel(form: &FormState, report: &AnalysisReport) -> String {
    let items: String = [
        patient_information(form),
        form.vitals.as_ref().and_then(clinical_vitals),
        primary_symptoms(form),
        interview_responses(form),
    ]
    .into_iter()
    .flatten()
    .collect();

    format!(
        r#"<div class="analysis-container"><div class="summary-section"><h3 class="analysis-section-header">Summary of Information Gathered</h3>{items}</div>{}{DISCLAIMER}</div>"#,
        report_sections(report)
    )
}

/// Shown in place of the results when the analysis request fails
pub fn error_panel(message: &str) -> String {
    format!(
        r#"<div class="error-message">
    <h4>Unable to Analyze Symptoms</h4>
    <p>Error: {}</p>
    <div class="error-actions">
        <button class="btn btn-primary retry-analysis-btn">Try Again</button>
        <button class="btn btn-secondary check-server-btn">Check Server Status</button>
    </div>
</div>"#,
        escape(message)
    )
}
