//! Daily calorie needs
//!
//! BMR = 66 + 13.7 × weight_kg + 5 × height_cm − 6.8 × age
//! Daily calories = round(BMR × activity multiplier)
//!
//! The same BMR formula is used for both genders.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::units::round_to_tenth;
use super::validation::{CalcError, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const NAMES: &'static [&'static str] = &["male", "female"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Habitual daily activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub const NAMES: &'static [&'static str] =
        &["sedentary", "light", "moderate", "active", "veryActive"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "veryActive",
        }
    }

    /// Strict parse; `veryActive`, `very-active` and `very_active` are accepted
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" => Some(ActivityLevel::Sedentary),
            "light" => Some(ActivityLevel::Light),
            "moderate" => Some(ActivityLevel::Moderate),
            "active" => Some(ActivityLevel::Active),
            "veryactive" | "very-active" | "very_active" | "very active" => {
                Some(ActivityLevel::VeryActive)
            }
            _ => None,
        }
    }

    /// Permissive parse used by the calorie calculator: anything unrecognised
    /// is treated as sedentary instead of being rejected.
    pub fn from_str_or_sedentary(s: &str) -> Self {
        Self::from_str(s).unwrap_or_else(|| {
            tracing::warn!(activity_level = s, "Unrecognised activity level, using sedentary");
            ActivityLevel::Sedentary
        })
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw daily-calorie request
#[derive(Debug, Clone, Default)]
pub struct DailyCaloriesInput<'a> {
    pub age: Option<i64>,
    pub weight: Option<f64>,
    pub weight_unit: Option<&'a str>,
    pub height: Option<f64>,
    pub height_unit: Option<&'a str>,
    pub height_inches: Option<f64>,
    pub gender: Option<&'a str>,
    pub activity_level: Option<&'a str>,
}

/// Validated anthropometric input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anthropometrics {
    pub age: u32,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
}

impl Anthropometrics {
    pub fn validate(input: &DailyCaloriesInput<'_>) -> Result<Self, CalcError> {
        let mut errors = ValidationErrors::new();

        let age = errors.age("age", input.age);
        let weight_kg = errors.weight_kg("weight", input.weight, "weight_unit", input.weight_unit);
        let height_cm = errors.height_cm(
            "height",
            input.height,
            "height_unit",
            input.height_unit,
            "height_inches",
            input.height_inches,
        );
        let gender = errors.choice("gender", input.gender, Gender::NAMES, Gender::from_str);
        let activity_level = errors
            .require_text("activity_level", input.activity_level)
            .map(ActivityLevel::from_str_or_sedentary);

        match (age, weight_kg, height_cm, gender, activity_level) {
            (Some(age), Some(weight_kg), Some(height_cm), Some(gender), Some(activity_level)) => {
                let body = Self { age, weight_kg, height_cm, gender, activity_level };
                body.check_energy(&mut errors);
                errors.finish(|| body)
            }
            _ => Err(CalcError::Validation(errors)),
        }
    }

    /// BMR × activity multiplier, before rounding
    fn daily_energy(&self) -> f64 {
        basal_metabolic_rate(self.weight_kg, self.height_cm, self.age)
            * self.activity_level.multiplier()
    }

    /// Flag weight and height when they produce no usable calorie target
    ///
    /// Very small bodies at high ages drive the formula to zero or below, and
    /// huge measurements push the rounded target past what an integer holds.
    pub fn check_energy(&self, errors: &mut ValidationErrors) {
        let energy = self.daily_energy();
        let energy = if energy < MAX_DAILY_ENERGY { energy } else { f64::INFINITY };
        errors.derived(energy, &["weight", "height"]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalorieTarget {
    /// Rounded to one decimal place
    pub bmr: f64,
    pub activity_level: ActivityLevel,
    pub activity_multiplier: f64,
    /// kcal/day
    pub daily_calories: i64,
}

/// Largest kcal/day figure kept exact by the integer target
const MAX_DAILY_ENERGY: f64 = 9.0e15;

pub fn basal_metabolic_rate(weight_kg: f64, height_cm: f64, age: u32) -> f64 {
    66.0 + 13.7 * weight_kg + 5.0 * height_cm - 6.8 * f64::from(age)
}

/// Calorie target for already validated input
///
/// A body whose BMR is not positive is reported as an invalid measurement
/// instead of a negative target.
pub fn calorie_target(body: &Anthropometrics) -> Result<CalorieTarget, CalcError> {
    let mut errors = ValidationErrors::new();
    body.check_energy(&mut errors);
    if !errors.is_empty() {
        return Err(CalcError::Validation(errors));
    }

    let bmr = basal_metabolic_rate(body.weight_kg, body.height_cm, body.age);

    let multiplier = body.activity_level.multiplier();
    Ok(CalorieTarget {
        bmr: round_to_tenth(bmr),
        activity_level: body.activity_level,
        activity_multiplier: multiplier,
        daily_calories: (bmr * multiplier).round() as i64,
    })
}

pub fn compute_daily_calories(input: &DailyCaloriesInput<'_>) -> Result<CalorieTarget, CalcError> {
    let body = Anthropometrics::validate(input)?;
    let target = calorie_target(&body)?;
    tracing::debug!(
        bmr = target.bmr,
        activity_level = %target.activity_level,
        daily_calories = target.daily_calories,
        "Computed daily calories"
    );
    Ok(target)
}
