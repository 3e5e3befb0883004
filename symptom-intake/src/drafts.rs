//! Moving raw form input into [`FormState`].

use chrono::NaiveDate;

use crate::bmi::{self, Bmi, HeightUnit, TemperatureUnit, WeightUnit};
use crate::models::{
    FormState, Lifestyle, MedicalConditions, MedicalHistory, MedicalRecords, PatientInput, Vitals, VitalsInput,
};
use crate::validation::{parse_decimal, parse_whole, present};

const DAYS_PER_YEAR: f64 = 365.25;

/// Age in whole years on `today`, or `None` for an unparseable date
pub fn age_from_date_of_birth(date_of_birth: &str, today: NaiveDate) -> Option<i64> {
    let dob = NaiveDate::parse_from_str(date_of_birth.trim(), "%Y-%m-%d").ok()?;
    let days = (today - dob).num_days() as f64;
    Some((days / DAYS_PER_YEAR).floor() as i64)
}

/// Live handling of the age and date-of-birth inputs while the patient form is edited.
///
/// A parseable age is stored immediately and anything else removes it. A date of birth
/// that yields an age within 0..=120 overwrites both the age input and the stored age.
pub fn apply_patient_update(form: &mut FormState, draft: &mut PatientInput, update: PatientInput, today: NaiveDate) {
    let age_touched = update.age.is_some();
    let dob = update.date_of_birth.clone();
    draft.merge(update);

    if age_touched {
        form.demographics.age = draft.age.as_deref().and_then(parse_whole).and_then(|a| i32::try_from(a).ok());
    }

    if let Some(dob) = dob {
        if let Some(age) = age_from_date_of_birth(&dob, today).filter(|a| (0..=120).contains(a)) {
            draft.age = Some(age.to_string());
            form.demographics.age = i32::try_from(age).ok();
            form.demographics.date_of_birth = Some(dob.trim().to_string());
        }
    }

    if let Some(gender) = present(&draft.gender) {
        form.demographics.gender = Some(gender.to_string());
    }
    if let Some(ethnicity) = present(&draft.ethnicity) {
        form.demographics.ethnicity = Some(ethnicity.to_string());
    }
    if let Some(blood_group) = present(&draft.blood_group) {
        form.medical_history.get_or_insert_with(MedicalHistory::default).blood_group = Some(blood_group.to_string());
    }
}

fn set_text(target: &mut Option<String>, value: &Option<String>) {
    if let Some(v) = present(value) {
        *target = Some(v.to_string());
    }
}

/// Copy a validated patient draft into the form. Empty values leave existing data alone.
pub fn commit_patient(form: &mut FormState, draft: &PatientInput) {
    set_text(&mut form.demographics.gender, &draft.gender);
    if let Some(age) = present(&draft.age).and_then(parse_whole) {
        form.demographics.age = i32::try_from(age).ok();
    }
    set_text(&mut form.demographics.current_location, &draft.current_location);
    set_text(&mut form.demographics.ethnicity, &draft.ethnicity);

    if present(&draft.diabetic).is_some() || present(&draft.hypertension).is_some() {
        let conditions = form.medical_conditions.get_or_insert_with(MedicalConditions::default);
        set_text(&mut conditions.diabetic, &draft.diabetic);
        set_text(&mut conditions.hypertension, &draft.hypertension);
    }

    if [&draft.vaccine_history, &draft.blood_group, &draft.family_history]
        .into_iter()
        .any(|f| present(f).is_some())
    {
        let history = form.medical_history.get_or_insert_with(MedicalHistory::default);
        set_text(&mut history.vaccine_history, &draft.vaccine_history);
        set_text(&mut history.blood_group, &draft.blood_group);
        set_text(&mut history.family_history, &draft.family_history);
    }

    if [&draft.travel_history, &draft.occupation, &draft.children, &draft.pregnant]
        .into_iter()
        .any(|f| present(f).is_some())
    {
        let lifestyle = form.lifestyle.get_or_insert_with(Lifestyle::default);
        set_text(&mut lifestyle.travel_history, &draft.travel_history);
        set_text(&mut lifestyle.occupation, &draft.occupation);
        set_text(&mut lifestyle.children, &draft.children);
        set_text(&mut lifestyle.pregnant, &draft.pregnant);
    }

    if [&draft.emr_id, &draft.taking_medications, &draft.current_medications]
        .into_iter()
        .any(|f| present(f).is_some())
    {
        let records = form.medical_records.get_or_insert_with(MedicalRecords::default);
        set_text(&mut records.emr_id, &draft.emr_id);
        set_text(&mut records.taking_medications, &draft.taking_medications);
        set_text(&mut records.current_medications, &draft.current_medications);
    }
}

/// BMI for the weight/height currently typed into the vitals form
pub fn draft_bmi(draft: &VitalsInput) -> Option<Bmi> {
    let weight = present(&draft.weight).and_then(parse_decimal)?;
    let height = present(&draft.height).and_then(parse_decimal)?;
    bmi::calculate(
        weight,
        draft.weight_unit.as_deref().map(WeightUnit::parse).unwrap_or_default(),
        height,
        draft.height_unit.as_deref().map(HeightUnit::parse).unwrap_or_default(),
    )
}

/// Recompute BMI after weight, height, or either unit changed.
///
/// A valid pair overwrites the stored BMI. An incomplete or invalid pair only blanks the
/// displayed value; the last good BMI stays in the form.
pub fn refresh_bmi(form: &mut FormState, draft: &VitalsInput) -> Option<Bmi> {
    let bmi = draft_bmi(draft)?;
    let vitals = form.vitals_mut();
    vitals.bmi = Some(bmi.value);
    vitals.bmi_category = Some(bmi.category);
    Some(bmi)
}

fn whole(value: &Option<String>) -> Option<i32> {
    present(value).and_then(parse_whole).and_then(|v| i32::try_from(v).ok())
}

fn decimal(value: &Option<String>) -> Option<f64> {
    present(value).and_then(parse_decimal)
}

fn text(value: &Option<String>) -> Option<String> {
    present(value).map(str::to_string)
}

/// Copy a validated vitals draft into the form and recompute BMI
pub fn commit_vitals(form: &mut FormState, draft: &VitalsInput) {
    let vitals: &mut Vitals = form.vitals_mut();

    macro_rules! keep {
        ($target:ident, $value:expr) => {
            if let Some(v) = $value {
                vitals.$target = Some(v);
            }
        };
    }

    keep!(pulse_rate, whole(&draft.pulse_rate));
    keep!(systolic, whole(&draft.systolic));
    keep!(diastolic, whole(&draft.diastolic));
    keep!(oxygen_saturation, whole(&draft.oxygen_saturation));
    keep!(blood_sugar, whole(&draft.blood_sugar));
    keep!(respiratory_rate, whole(&draft.respiratory_rate));
    if let Some(temperature) = decimal(&draft.temperature) {
        vitals.temperature = Some(temperature);
        vitals.temperature_unit = Some(
            draft
                .temperature_unit
                .as_deref()
                .map(TemperatureUnit::parse)
                .unwrap_or_default(),
        );
    }

    keep!(heart_rhythm, text(&draft.heart_rhythm));
    keep!(heart_lung_sounds, text(&draft.heart_murmur));
    keep!(ecg_available, text(&draft.ecg_available));
    keep!(ecg_findings, text(&draft.ecg_findings));

    keep!(peak_expiratory_flow, whole(&draft.peak_flow));
    keep!(forced_expiratory_volume, decimal(&draft.fev1));
    keep!(respiratory_observations, text(&draft.respiratory_notes));
    keep!(tongue_throat_findings, text(&draft.tongue_throat_comments));
    keep!(infection_rash_findings, text(&draft.infection_comments));

    if let Some(weight) = decimal(&draft.weight) {
        vitals.weight = Some(weight);
        vitals.weight_unit = Some(draft.weight_unit.as_deref().map(WeightUnit::parse).unwrap_or_default());
    }
    if let Some(height) = decimal(&draft.height) {
        vitals.height = Some(height);
        vitals.height_unit = Some(draft.height_unit.as_deref().map(HeightUnit::parse).unwrap_or_default());
    }
    keep!(waist_circumference, whole(&draft.waist_circumference));
    keep!(muscle_mass, decimal(&draft.muscle_mass));
    keep!(fat_mass, decimal(&draft.fat_mass));
    keep!(body_water, decimal(&draft.body_water));
    keep!(pain_scale, whole(&draft.pain_scale));
    keep!(notes, text(&draft.notes));

    refresh_bmi(form, draft);
}
