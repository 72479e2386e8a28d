//! Calculator Tools
//!
//! BMI, daily calorie target and workout burn. Nothing here touches the
//! database; a request is validated and computed in one step.

use serde::Serialize;

use crate::metabolic::{
    bmi_from_metric, centimeters_to_feet_inches, compute_daily_calories, compute_workout_calories,
    kilograms_to_pounds, round_to_tenth, BmiInput, BmiMeasurements, BmiResult, CalorieTarget,
    DailyCaloriesInput, Intensity, MetEntry, MetTable, WorkoutCategory, WorkoutInput,
    WorkoutResult,
};

use super::ToolResult;

/// Response for compute_bmi
#[derive(Debug, Serialize)]
pub struct BmiResponse {
    #[serde(flatten)]
    pub result: BmiResult,
    pub weight_kg: f64,
    pub weight_lb: f64,
    pub height_cm: f64,
    /// e.g. "5 ft 9.0 in"
    pub height_imperial: String,
}

pub fn bmi(input: &BmiInput<'_>) -> ToolResult<BmiResponse> {
    let BmiMeasurements { weight_kg, height_cm } = BmiMeasurements::validate(input)?;
    let result = bmi_from_metric(weight_kg, height_cm);
    let (feet, inches) = centimeters_to_feet_inches(height_cm);

    Ok(BmiResponse {
        result,
        weight_kg: round_to_tenth(weight_kg),
        weight_lb: round_to_tenth(kilograms_to_pounds(weight_kg)),
        height_cm: round_to_tenth(height_cm),
        height_imperial: format!("{} ft {:.1} in", feet, inches),
    })
}

pub fn daily_calories(input: &DailyCaloriesInput<'_>) -> ToolResult<CalorieTarget> {
    Ok(compute_daily_calories(input)?)
}

pub fn workout_calories(table: &MetTable, input: &WorkoutInput<'_>) -> ToolResult<WorkoutResult> {
    Ok(compute_workout_calories(table, input)?)
}

/// Response for list_met_values
#[derive(Debug, Serialize)]
pub struct MetTableResponse {
    pub intensities: &'static [&'static str],
    pub categories: &'static [&'static str],
    pub entries: Vec<MetEntry>,
}

pub fn met_table(table: &MetTable) -> MetTableResponse {
    MetTableResponse {
        intensities: Intensity::NAMES,
        categories: WorkoutCategory::NAMES,
        entries: table.entries(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic::BmiCategory;
    use crate::tools::ToolError;

    #[test]
    fn test_bmi_response_includes_conversions() {
        let input = BmiInput {
            weight: Some(160.0),
            weight_unit: Some("lb"),
            height: Some(5.0),
            height_unit: Some("ft"),
            height_inches: Some(9.0),
        };
        let response = bmi(&input).unwrap();
        assert_eq!(response.result.bmi_value, 23.6);
        assert_eq!(response.result.category, BmiCategory::NormalWeight);
        assert_eq!(response.weight_lb, 160.0);
        assert_eq!(response.height_cm, 175.3);
        assert_eq!(response.height_imperial, "5 ft 9.0 in");
    }

    #[test]
    fn test_bmi_validation_rejected() {
        let err = bmi(&BmiInput::default()).unwrap_err();
        match err {
            ToolError::Rejected(body) => {
                assert_eq!(body["fields"]["weight"]["kind"], "missing_field");
                assert_eq!(body["fields"]["height"]["kind"], "missing_field");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_daily_calories_reference() {
        let input = DailyCaloriesInput {
            age: Some(30),
            weight: Some(70.0),
            height: Some(175.0),
            gender: Some("male"),
            activity_level: Some("sedentary"),
            ..Default::default()
        };
        let target = daily_calories(&input).unwrap();
        assert_eq!(target.daily_calories, 2035);
    }

    #[test]
    fn test_workout_and_table() {
        let table = MetTable::standard();
        let input = WorkoutInput {
            category: Some("Cardio"),
            intensity: Some("Moderate"),
            weight: Some(80.0),
            weight_unit: Some("kg"),
            duration_minutes: Some(30.0),
        };
        assert_eq!(workout_calories(&table, &input).unwrap().calories_burned, 240.0);

        let listing = met_table(&table);
        assert_eq!(listing.entries.len(), 12);
        assert_eq!(listing.categories.len(), 4);
    }
}
