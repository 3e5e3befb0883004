use serde::{Deserialize, Serialize};
use std::fmt;

const POUNDS_TO_KG: f64 = 0.453592;
const FEET_TO_M: f64 = 0.3048;
const INCHES_TO_M: f64 = 0.0254;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightUnit {
    #[default]
    #[serde(rename = "kg")]
    Kilograms,
    #[serde(rename = "lbs")]
    Pounds,
}

impl WeightUnit {
    /// Anything other than `lbs` is taken as kilograms
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "lbs" => WeightUnit::Pounds,
            _ => WeightUnit::Kilograms,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kilograms => "kg",
            WeightUnit::Pounds => "lbs",
        }
    }

    pub fn to_kg(&self, value: f64) -> f64 {
        match self {
            WeightUnit::Kilograms => value,
            WeightUnit::Pounds => value * POUNDS_TO_KG,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightUnit {
    #[default]
    #[serde(rename = "cm")]
    Centimeters,
    #[serde(rename = "ft")]
    Feet,
    #[serde(rename = "in")]
    Inches,
    #[serde(rename = "m")]
    Meters,
}

impl HeightUnit {
    /// Unknown units are assumed to already be meters
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "cm" => HeightUnit::Centimeters,
            "ft" => HeightUnit::Feet,
            "in" => HeightUnit::Inches,
            _ => HeightUnit::Meters,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeightUnit::Centimeters => "cm",
            HeightUnit::Feet => "ft",
            HeightUnit::Inches => "in",
            HeightUnit::Meters => "m",
        }
    }

    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            HeightUnit::Centimeters => value / 100.0,
            HeightUnit::Feet => value * FEET_TO_M,
            HeightUnit::Inches => value * INCHES_TO_M,
            HeightUnit::Meters => value,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    F,
    C,
}

impl TemperatureUnit {
    /// Only `C` selects Celsius
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "C" => TemperatureUnit::C,
            _ => TemperatureUnit::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::F => "F",
            TemperatureUnit::C => "C",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// 18.5, 25 and 30 are inclusive lower bounds
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bmi {
    /// Rounded to one decimal
    pub value: f64,
    pub category: BmiCategory,
}

impl Bmi {
    /// Text shown in the BMI field, e.g. `22.9 (Normal)`
    pub fn display(&self) -> String {
        format!("{:.1} ({})", self.value, self.category)
    }
}

/// Body-mass index for a weight/height pair, or `None` unless both are positive numbers.
///
/// The category is decided on the unrounded value.
pub fn calculate(weight: f64, weight_unit: WeightUnit, height: f64, height_unit: HeightUnit) -> Option<Bmi> {
    if !(weight.is_finite() && height.is_finite()) || weight <= 0.0 || height <= 0.0 {
        return None;
    }

    let kg = weight_unit.to_kg(weight);
    let meters = height_unit.to_meters(height);
    let bmi = kg / (meters * meters);

    Some(Bmi {
        value: round_one_decimal(bmi),
        category: BmiCategory::from_bmi(bmi),
    })
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_bmi() {
        let bmi = calculate(70.0, WeightUnit::Kilograms, 175.0, HeightUnit::Centimeters).unwrap();
        assert_eq!(bmi.value, 22.9);
        assert_eq!(bmi.category, BmiCategory::Normal);
        assert_eq!(bmi.display(), "22.9 (Normal)");
    }

    #[test]
    fn imperial_bmi() {
        let bmi = calculate(154.0, WeightUnit::Pounds, 68.0, HeightUnit::Inches).unwrap();
        assert_eq!(bmi.value, 23.4);
        assert_eq!(bmi.category, BmiCategory::Normal);
    }

    #[test]
    fn feet_and_meters() {
        let feet = calculate(80.0, WeightUnit::Kilograms, 6.0, HeightUnit::Feet).unwrap();
        assert_eq!(feet.value, 23.9);

        let meters = calculate(80.0, WeightUnit::Kilograms, 1.8, HeightUnit::parse("furlongs")).unwrap();
        assert_eq!(meters.value, 24.7);
    }

    #[test]
    fn category_boundaries_are_inclusive_lower_bounds() {
        assert_eq!(BmiCategory::from_bmi(18.49), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(24.99), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(29.99), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn non_positive_input_has_no_bmi() {
        assert!(calculate(0.0, WeightUnit::Kilograms, 175.0, HeightUnit::Centimeters).is_none());
        assert!(calculate(70.0, WeightUnit::Kilograms, -1.0, HeightUnit::Centimeters).is_none());
        assert!(calculate(f64::NAN, WeightUnit::Kilograms, 175.0, HeightUnit::Centimeters).is_none());
    }

    #[test]
    fn unit_parsing_defaults() {
        assert_eq!(WeightUnit::parse("stone"), WeightUnit::Kilograms);
        assert_eq!(TemperatureUnit::parse("K"), TemperatureUnit::F);
        assert_eq!(TemperatureUnit::parse("C"), TemperatureUnit::C);
        assert_eq!(HeightUnit::parse("in"), HeightUnit::Inches);
    }
}
