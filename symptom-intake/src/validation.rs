//! Per-step input checks. Every validator reports all problems it finds at once.

use intake_flow::Validation;

use crate::bmi::TemperatureUnit;
use crate::models::{PatientInput, VitalsInput};

/// Trimmed, non-empty text
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A whole number as typed into a numeric field. Fractions are truncated.
pub fn parse_whole(raw: &str) -> Option<i64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then(|| value.trunc() as i64)
}

pub fn parse_decimal(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn case_type(selected: Option<&str>) -> Validation {
    match selected.map(str::trim) {
        Some(value) if !value.is_empty() => Validation::ok(),
        _ => Validation::fail("Please select a medical case type to continue"),
    }
}

pub fn patient(input: &PatientInput) -> Validation {
    let mut validation = Validation::ok();

    if present(&input.gender).is_none() {
        validation.push("Please select your gender");
    }

    let age_valid = present(&input.age)
        .and_then(parse_whole)
        .is_some_and(|age| (0..=120).contains(&age));
    if !age_valid {
        validation.push("Please enter a valid age (0-120 years)");
    }

    let has_context = [
        &input.current_location,
        &input.ethnicity,
        &input.diabetic,
        &input.hypertension,
    ]
    .into_iter()
    .any(|field| present(field).is_some());
    if !has_context {
        validation.push(
            "Please provide at least one of: current location, ethnicity, diabetes status or hypertension status",
        );
    }

    if let Some(emr_id) = present(&input.emr_id) {
        if emr_id.chars().count() < 3 {
            validation.push("EMR/EHR ID must be at least 3 characters long");
        }
    }

    if let Some(children) = present(&input.children) {
        if !parse_whole(children).is_some_and(|count| count >= 0) {
            validation.push("Number of children must be a valid number");
        }
    }

    if present(&input.taking_medications) == Some("yes") && present(&input.current_medications).is_none() {
        validation.push(
            "Please list your current medications or select \"No\" if you are not taking any",
        );
    }

    validation
}

struct Range {
    min: i64,
    max: i64,
    message: &'static str,
}

const PULSE: Range = Range {
    min: 40,
    max: 200,
    message: "Pulse rate must be between 40 and 200 BPM",
};
const SYSTOLIC: Range = Range {
    min: 70,
    max: 250,
    message: "Systolic blood pressure must be between 70 and 250 mmHg",
};
const DIASTOLIC: Range = Range {
    min: 40,
    max: 150,
    message: "Diastolic blood pressure must be between 40 and 150 mmHg",
};
const OXYGEN: Range = Range {
    min: 70,
    max: 100,
    message: "Oxygen saturation must be between 70 and 100%",
};
const BLOOD_SUGAR: Range = Range {
    min: 30,
    max: 800,
    message: "Random blood sugar must be between 30 and 800 mg/dL",
};

fn check_range(validation: &mut Validation, value: &Option<String>, range: &Range) {
    if let Some(raw) = present(value) {
        let in_range = parse_whole(raw).is_some_and(|v| v >= range.min && v <= range.max);
        if !in_range {
            validation.push(range.message);
        }
    }
}

/// Vitals are optional; only supplied values are range-checked.
pub fn vitals(input: &VitalsInput) -> Validation {
    let mut validation = Validation::ok();

    check_range(&mut validation, &input.pulse_rate, &PULSE);
    check_range(&mut validation, &input.systolic, &SYSTOLIC);
    check_range(&mut validation, &input.diastolic, &DIASTOLIC);
    check_range(&mut validation, &input.oxygen_saturation, &OXYGEN);
    check_range(&mut validation, &input.blood_sugar, &BLOOD_SUGAR);

    if let Some(raw) = present(&input.temperature) {
        let unit = input
            .temperature_unit
            .as_deref()
            .map(TemperatureUnit::parse)
            .unwrap_or_default();
        match (parse_decimal(raw), unit) {
            (None, _) => validation.push("Temperature must be a valid number"),
            (Some(t), TemperatureUnit::F) if !(90.0..=110.0).contains(&t) => {
                validation.push("Temperature in Fahrenheit must be between 90 and 110°F")
            }
            (Some(t), TemperatureUnit::C) if !(32.0..=43.0).contains(&t) => {
                validation.push("Temperature in Celsius must be between 32 and 43°C")
            }
            _ => {}
        }
    }

    validation
}

pub fn symptoms(selected: &[String], free_text: Option<&str>) -> Validation {
    let has_text = free_text.map(str::trim).is_some_and(|t| !t.is_empty());
    if selected.is_empty() && !has_text {
        Validation::fail("Please select at least one symptom or describe your symptoms in the text area")
    } else {
        Validation::ok()
    }
}
