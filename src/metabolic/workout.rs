//! Workout calorie-burn estimation
//!
//! Uses the MET (Metabolic Equivalent of Task) formula:
//! Calories = MET × weight_kg × duration_hours

use std::fmt;

use serde::{Deserialize, Serialize};

use super::units::round_to_tenth;
use super::validation::{CalcError, ValidationErrors};

/// Workout intensity. Not the same scale as the daily activity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intensity {
    Light,
    Moderate,
    Heavy,
}

impl Intensity {
    pub const ALL: [Intensity; 3] = [Intensity::Light, Intensity::Moderate, Intensity::Heavy];
    pub const NAMES: &'static [&'static str] = &["Light", "Moderate", "Heavy"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Light => "Light",
            Intensity::Moderate => "Moderate",
            Intensity::Heavy => "Heavy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Some(Intensity::Light),
            "moderate" => Some(Intensity::Moderate),
            "heavy" => Some(Intensity::Heavy),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Intensity::Light => 0,
            Intensity::Moderate => 1,
            Intensity::Heavy => 2,
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkoutCategory {
    StrengthTraining,
    Cardio,
    Yoga,
    #[serde(rename = "HIIT")]
    Hiit,
}

impl WorkoutCategory {
    pub const ALL: [WorkoutCategory; 4] = [
        WorkoutCategory::StrengthTraining,
        WorkoutCategory::Cardio,
        WorkoutCategory::Yoga,
        WorkoutCategory::Hiit,
    ];
    pub const NAMES: &'static [&'static str] = &["StrengthTraining", "Cardio", "Yoga", "HIIT"];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutCategory::StrengthTraining => "StrengthTraining",
            WorkoutCategory::Cardio => "Cardio",
            WorkoutCategory::Yoga => "Yoga",
            WorkoutCategory::Hiit => "HIIT",
        }
    }

    /// Accepts "StrengthTraining", "Strength Training", "strength_training", "strength", ...
    pub fn from_str(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "strengthtraining" | "strength" => Some(WorkoutCategory::StrengthTraining),
            "cardio" => Some(WorkoutCategory::Cardio),
            "yoga" => Some(WorkoutCategory::Yoga),
            "hiit" => Some(WorkoutCategory::Hiit),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            WorkoutCategory::StrengthTraining => 0,
            WorkoutCategory::Cardio => 1,
            WorkoutCategory::Yoga => 2,
            WorkoutCategory::Hiit => 3,
        }
    }
}

impl fmt::Display for WorkoutCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Built-in MET values (Compendium of Physical Activities approximations)
pub fn standard_met(intensity: Intensity, category: WorkoutCategory) -> f64 {
    use Intensity::*;
    use WorkoutCategory::*;

    match (intensity, category) {
        (Light, StrengthTraining) => 3.5,
        (Light, Cardio) => 3.0,
        (Light, Yoga) => 2.5,
        (Light, Hiit) => 5.0,
        (Moderate, StrengthTraining) => 6.0,
        (Moderate, Cardio) => 6.0,
        (Moderate, Yoga) => 3.0,
        (Moderate, Hiit) => 8.0,
        (Heavy, StrengthTraining) => 8.0,
        (Heavy, Cardio) => 10.0,
        (Heavy, Yoga) => 4.0,
        (Heavy, Hiit) => 12.0,
    }
}

/// One cell of a MET table as loaded from configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetEntry {
    pub intensity: Intensity,
    pub category: WorkoutCategory,
    pub met: f64,
}

/// A complete intensity × category MET table
///
/// Every cell is filled at construction, so lookups cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub struct MetTable {
    values: [[f64; 4]; 3],
}

impl MetTable {
    pub fn standard() -> Self {
        let mut values = [[0.0; 4]; 3];
        for intensity in Intensity::ALL {
            for category in WorkoutCategory::ALL {
                values[intensity.index()][category.index()] = standard_met(intensity, category);
            }
        }
        Self { values }
    }

    /// Build a table from explicit entries. Later entries override earlier ones.
    pub fn from_entries<I>(entries: I) -> Result<Self, CalcError>
    where
        I: IntoIterator<Item = MetEntry>,
    {
        let mut cells: [[Option<f64>; 4]; 3] = [[None; 4]; 3];

        for entry in entries {
            if !entry.met.is_finite() || entry.met <= 0.0 {
                return Err(CalcError::InvalidMetValue {
                    intensity: entry.intensity,
                    category: entry.category,
                    met: entry.met,
                });
            }
            cells[entry.intensity.index()][entry.category.index()] = Some(entry.met);
        }

        let mut values = [[0.0; 4]; 3];
        for intensity in Intensity::ALL {
            for category in WorkoutCategory::ALL {
                values[intensity.index()][category.index()] = cells[intensity.index()]
                    [category.index()]
                .ok_or(CalcError::UnknownActivityCombination { intensity, category })?;
            }
        }

        Ok(Self { values })
    }

    pub fn met(&self, intensity: Intensity, category: WorkoutCategory) -> f64 {
        self.values[intensity.index()][category.index()]
    }

    pub fn entries(&self) -> Vec<MetEntry> {
        Intensity::ALL
            .iter()
            .flat_map(|&intensity| {
                WorkoutCategory::ALL.iter().map(move |&category| MetEntry {
                    intensity,
                    category,
                    met: self.met(intensity, category),
                })
            })
            .collect()
    }
}

impl Default for MetTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Raw workout request as submitted by a caller
#[derive(Debug, Clone, Default)]
pub struct WorkoutInput<'a> {
    pub category: Option<&'a str>,
    pub intensity: Option<&'a str>,
    pub weight: Option<f64>,
    pub weight_unit: Option<&'a str>,
    pub duration_minutes: Option<f64>,
}

/// A validated workout session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutSession {
    pub category: WorkoutCategory,
    pub intensity: Intensity,
    pub weight_kg: f64,
    pub duration_minutes: f64,
}

impl WorkoutSession {
    pub fn validate(input: &WorkoutInput<'_>) -> Result<Self, CalcError> {
        let mut errors = ValidationErrors::new();

        let category = errors.choice(
            "category",
            input.category,
            WorkoutCategory::NAMES,
            WorkoutCategory::from_str,
        );
        let intensity = errors.choice(
            "intensity",
            input.intensity,
            Intensity::NAMES,
            Intensity::from_str,
        );
        let weight_kg = errors.weight_kg("weight", input.weight, "weight_unit", input.weight_unit);
        let duration_minutes = errors.positive("duration_minutes", input.duration_minutes);

        match (category, intensity, weight_kg, duration_minutes) {
            (Some(category), Some(intensity), Some(weight_kg), Some(duration_minutes)) => {
                errors.finish(|| Self { category, intensity, weight_kg, duration_minutes })
            }
            _ => Err(CalcError::Validation(errors)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkoutResult {
    pub category: WorkoutCategory,
    pub intensity: Intensity,
    pub met_value: f64,
    pub weight_kg: f64,
    pub duration_minutes: f64,
    pub calories_burned: f64,
}

fn unrounded_burn(met: f64, weight_kg: f64, duration_minutes: f64) -> f64 {
    let duration_hours = duration_minutes / 60.0;
    met * weight_kg * duration_hours
}

/// Calories burned for a validated session, rounded to one decimal
pub fn calories_burned(met: f64, weight_kg: f64, duration_minutes: f64) -> f64 {
    round_to_tenth(unrounded_burn(met, weight_kg, duration_minutes))
}

pub fn compute_workout_calories(
    table: &MetTable,
    input: &WorkoutInput<'_>,
) -> Result<WorkoutResult, CalcError> {
    let session = WorkoutSession::validate(input)?;
    let met_value = table.met(session.intensity, session.category);

    let mut errors = ValidationErrors::new();
    errors.derived(
        unrounded_burn(met_value, session.weight_kg, session.duration_minutes),
        &["weight", "duration_minutes"],
    );
    if !errors.is_empty() {
        return Err(CalcError::Validation(errors));
    }

    let result = WorkoutResult {
        category: session.category,
        intensity: session.intensity,
        met_value,
        weight_kg: session.weight_kg,
        duration_minutes: session.duration_minutes,
        calories_burned: calories_burned(met_value, session.weight_kg, session.duration_minutes),
    };
    tracing::debug!(
        category = %result.category,
        intensity = %result.intensity,
        calories = result.calories_burned,
        "Computed workout calories"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic::validation::FieldError;

    fn cardio_moderate(weight: f64, minutes: f64) -> WorkoutInput<'static> {
        WorkoutInput {
            category: Some("Cardio"),
            intensity: Some("Moderate"),
            weight: Some(weight),
            weight_unit: Some("kg"),
            duration_minutes: Some(minutes),
        }
    }

    #[test]
    fn test_moderate_cardio() {
        let result = compute_workout_calories(&MetTable::standard(), &cardio_moderate(80.0, 30.0))
            .unwrap();
        assert_eq!(result.met_value, 6.0);
        assert!((result.calories_burned - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_met_values() {
        let table = MetTable::standard();
        assert_eq!(table.met(Intensity::Light, WorkoutCategory::StrengthTraining), 3.5);
        assert_eq!(table.met(Intensity::Moderate, WorkoutCategory::Cardio), 6.0);
        assert_eq!(table.met(Intensity::Heavy, WorkoutCategory::Hiit), 12.0);
        assert_eq!(table.entries().len(), 12);
    }

    #[test]
    fn test_pounds_and_rounding() {
        // 176.37 lb ≈ 80 kg; light yoga for 45 minutes
        let input = WorkoutInput {
            category: Some("yoga"),
            intensity: Some("light"),
            weight: Some(176.37),
            weight_unit: Some("lb"),
            duration_minutes: Some(45.0),
        };
        let result = compute_workout_calories(&MetTable::standard(), &input).unwrap();
        let expected = 2.5 * 176.37 * 0.453592 * 0.75;
        assert!((result.calories_burned - round_to_tenth(expected)).abs() < 1e-9);
        assert_eq!(result.calories_burned, round_to_tenth(result.calories_burned));
    }

    #[test]
    fn test_idempotent() {
        let table = MetTable::standard();
        let input = cardio_moderate(72.5, 41.0);
        assert_eq!(
            compute_workout_calories(&table, &input),
            compute_workout_calories(&table, &input)
        );
    }

    #[test]
    fn test_overflowing_burn_rejected() {
        let err = compute_workout_calories(&MetTable::standard(), &cardio_moderate(1e300, 1e300))
            .unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.get("weight"), Some(&FieldError::InvalidMeasurement));
        assert_eq!(errors.get("duration_minutes"), Some(&FieldError::InvalidMeasurement));
    }

    #[test]
    fn test_invalid_input_reports_all_fields() {
        let input = WorkoutInput {
            category: Some("pilates"),
            intensity: None,
            weight: Some(0.0),
            weight_unit: None,
            duration_minutes: Some(-5.0),
        };
        let err = compute_workout_calories(&MetTable::standard(), &input).unwrap_err();
        let errors = err.validation_errors().unwrap();
        assert!(matches!(errors.get("category"), Some(FieldError::InvalidChoice { .. })));
        assert_eq!(errors.get("intensity"), Some(&FieldError::MissingField));
        assert_eq!(errors.get("weight"), Some(&FieldError::InvalidMeasurement));
        assert_eq!(errors.get("duration_minutes"), Some(&FieldError::InvalidMeasurement));
    }

    #[test]
    fn test_category_aliases() {
        assert_eq!(
            WorkoutCategory::from_str("Strength Training"),
            Some(WorkoutCategory::StrengthTraining)
        );
        assert_eq!(WorkoutCategory::from_str("hiit"), Some(WorkoutCategory::Hiit));
        assert_eq!(WorkoutCategory::from_str("swimming"), None);
    }

    #[test]
    fn test_table_from_complete_entries() {
        let mut entries = MetTable::standard().entries();
        entries.push(MetEntry {
            intensity: Intensity::Light,
            category: WorkoutCategory::Cardio,
            met: 3.3,
        });
        let table = MetTable::from_entries(entries).unwrap();
        assert_eq!(table.met(Intensity::Light, WorkoutCategory::Cardio), 3.3);
    }

    #[test]
    fn test_table_missing_cell_is_rejected() {
        let entries = MetTable::standard()
            .entries()
            .into_iter()
            .filter(|e| !(e.intensity == Intensity::Heavy && e.category == WorkoutCategory::Yoga));

        let err = MetTable::from_entries(entries).unwrap_err();
        assert_eq!(
            err,
            CalcError::UnknownActivityCombination {
                intensity: Intensity::Heavy,
                category: WorkoutCategory::Yoga,
            }
        );
        assert!(err.validation_errors().is_none());
    }

    #[test]
    fn test_table_rejects_non_positive_met() {
        let entries = vec![MetEntry {
            intensity: Intensity::Light,
            category: WorkoutCategory::Yoga,
            met: 0.0,
        }];
        assert!(matches!(
            MetTable::from_entries(entries),
            Err(CalcError::InvalidMetValue { .. })
        ));
    }

    #[test]
    fn test_met_entry_json() {
        let entry: MetEntry =
            serde_json::from_str(r#"{"intensity":"Heavy","category":"HIIT","met":11.0}"#).unwrap();
        assert_eq!(entry.category, WorkoutCategory::Hiit);
        assert_eq!(entry.intensity, Intensity::Heavy);
    }
}
