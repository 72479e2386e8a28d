//! Metabolic estimator
//!
//! Pure calculators for BMI, daily calorie needs and workout calorie burn,
//! plus the unit conversion and validation they share.

pub mod bmi;
pub mod daily;
pub mod units;
pub mod validation;
pub mod workout;

pub use bmi::{bmi_from_metric, compute_bmi, BmiCategory, BmiInput, BmiMeasurements, BmiResult};
pub use daily::{
    basal_metabolic_rate, calorie_target, compute_daily_calories, ActivityLevel, Anthropometrics,
    CalorieTarget, DailyCaloriesInput, Gender,
};
pub use units::{
    centimeters_to_feet_inches, kilograms_to_pounds, round_to_tenth, to_centimeters,
    to_kilograms, Height, HeightUnit, MeasurementError, WeightUnit,
};
pub use validation::{CalcError, FieldError, ValidationErrors, MAX_AGE, MIN_AGE};
pub use workout::{
    calories_burned, compute_workout_calories, standard_met, Intensity, MetEntry, MetTable,
    WorkoutCategory, WorkoutInput, WorkoutResult, WorkoutSession,
};
