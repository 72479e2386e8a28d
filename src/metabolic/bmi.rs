//! Body Mass Index
//!
//! BMI = weight_kg / height_m²

use serde::Serialize;

use super::units::{round_to_tenth, CM_PER_M};
use super::validation::{CalcError, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BmiCategory {
    Underweight,
    #[serde(rename = "Normal weight")]
    NormalWeight,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Half-open bands: [.., 18.5), [18.5, 25), [25, 30), [30, ..)
    ///
    /// Always called with the unrounded BMI so that the category never changes
    /// because of display rounding.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::NormalWeight
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::NormalWeight => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BmiResult {
    /// Rounded to one decimal place
    pub bmi_value: f64,
    pub category: BmiCategory,
}

/// Raw BMI request
#[derive(Debug, Clone, Default)]
pub struct BmiInput<'a> {
    pub weight: Option<f64>,
    pub weight_unit: Option<&'a str>,
    pub height: Option<f64>,
    pub height_unit: Option<&'a str>,
    /// Extra inches when `height_unit` is feet
    pub height_inches: Option<f64>,
}

/// Unrounded BMI
pub fn raw_bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / CM_PER_M;
    weight_kg / (height_m * height_m)
}

/// BMI from metric measurements that are already validated
pub fn bmi_from_metric(weight_kg: f64, height_cm: f64) -> BmiResult {
    let bmi = raw_bmi(weight_kg, height_cm);
    BmiResult {
        bmi_value: round_to_tenth(bmi),
        category: BmiCategory::from_bmi(bmi),
    }
}

/// Validated BMI measurements in metric units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BmiMeasurements {
    pub weight_kg: f64,
    pub height_cm: f64,
}

impl BmiMeasurements {
    pub fn validate(input: &BmiInput<'_>) -> Result<Self, CalcError> {
        let mut errors = ValidationErrors::new();
        let weight_kg = errors.weight_kg("weight", input.weight, "weight_unit", input.weight_unit);
        let height_cm = errors.height_cm(
            "height",
            input.height,
            "height_unit",
            input.height_unit,
            "height_inches",
            input.height_inches,
        );

        match (weight_kg, height_cm) {
            (Some(weight_kg), Some(height_cm)) => {
                let body = Self { weight_kg, height_cm };
                body.check_bmi(&mut errors);
                errors.finish(|| body)
            }
            _ => Err(CalcError::Validation(errors)),
        }
    }

    /// Flag weight and height when their BMI is not a usable number
    pub fn check_bmi(&self, errors: &mut ValidationErrors) {
        errors.derived(raw_bmi(self.weight_kg, self.height_cm), &["weight", "height"]);
    }
}

pub fn compute_bmi(input: &BmiInput<'_>) -> Result<BmiResult, CalcError> {
    let body = BmiMeasurements::validate(input)?;
    let result = bmi_from_metric(body.weight_kg, body.height_cm);
    tracing::debug!(bmi = result.bmi_value, category = result.category.as_str(), "Computed BMI");
    Ok(result)
}
