//! Unit types and conversion constants
//!
//! Body measurements arrive in either metric or imperial units and are
//! normalised to kilograms and centimeters before any formula runs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Conversion Constants
// ============================================================================

/// Kilograms per pound
pub const KG_PER_LB: f64 = 0.453592;
/// Centimeters per inch
pub const CM_PER_IN: f64 = 2.54;
/// Centimeters per foot
pub const CM_PER_FT: f64 = 30.48;
/// Centimeters per meter
pub const CM_PER_M: f64 = 100.0;

/// A measurement that cannot be converted
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MeasurementError {
    #[error("measurement must be positive, got {0}")]
    NonPositive(f64),

    #[error("measurement must be a finite number")]
    NotFinite,
}

/// Unit tag for a body weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

impl WeightUnit {
    pub const NAMES: &'static [&'static str] = &["kg", "lb"];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" | "kilogram" | "kilograms" => Some(WeightUnit::Kg),
            "lb" | "lbs" | "pound" | "pounds" => Some(WeightUnit::Lb),
            _ => None,
        }
    }
}

/// Unit tag for a body height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightUnit {
    #[default]
    Cm,
    /// Total inches
    In,
    /// Feet, with an optional separate inches component
    Ft,
}

impl HeightUnit {
    pub const NAMES: &'static [&'static str] = &["cm", "in", "ft"];

    pub fn as_str(&self) -> &'static str {
        match self {
            HeightUnit::Cm => "cm",
            HeightUnit::In => "in",
            HeightUnit::Ft => "ft",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => {
                Some(HeightUnit::Cm)
            }
            "in" | "inch" | "inches" => Some(HeightUnit::In),
            "ft" | "feet" | "foot" | "ft/in" | "ftin" => Some(HeightUnit::Ft),
            _ => None,
        }
    }
}

/// A height in one of the accepted unit systems
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Height {
    Centimeters(f64),
    Inches(f64),
    FeetInches { feet: f64, inches: f64 },
}

impl Height {
    /// Build a height from a value, its unit and the extra inches used with feet
    pub fn new(value: f64, unit: HeightUnit, extra_inches: Option<f64>) -> Self {
        match unit {
            HeightUnit::Cm => Height::Centimeters(value),
            HeightUnit::In => Height::Inches(value),
            HeightUnit::Ft => Height::FeetInches {
                feet: value,
                inches: extra_inches.unwrap_or(0.0),
            },
        }
    }
}

fn check_positive(value: f64) -> Result<f64, MeasurementError> {
    if !value.is_finite() {
        return Err(MeasurementError::NotFinite);
    }
    if value <= 0.0 {
        return Err(MeasurementError::NonPositive(value));
    }
    Ok(value)
}

fn check_non_negative(value: f64) -> Result<f64, MeasurementError> {
    if !value.is_finite() {
        return Err(MeasurementError::NotFinite);
    }
    if value < 0.0 {
        return Err(MeasurementError::NonPositive(value));
    }
    Ok(value)
}

/// Convert a weight to kilograms
pub fn to_kilograms(value: f64, unit: WeightUnit) -> Result<f64, MeasurementError> {
    let value = check_positive(value)?;
    let kg = match unit {
        WeightUnit::Kg => value,
        WeightUnit::Lb => value * KG_PER_LB,
    };
    check_positive(kg)
}

/// Convert a height to centimeters
///
/// For feet+inches either component may be zero, but the total must be positive.
pub fn to_centimeters(height: Height) -> Result<f64, MeasurementError> {
    let cm = match height {
        Height::Centimeters(cm) => check_positive(cm)?,
        Height::Inches(inches) => check_positive(inches)? * CM_PER_IN,
        Height::FeetInches { feet, inches } => {
            check_non_negative(feet)? * CM_PER_FT + check_non_negative(inches)? * CM_PER_IN
        }
    };
    check_positive(cm)
}

/// Convert kilograms back to pounds for display
pub fn kilograms_to_pounds(kg: f64) -> f64 {
    kg / KG_PER_LB
}

/// Split centimeters into whole feet and remaining inches for display
pub fn centimeters_to_feet_inches(cm: f64) -> (u32, f64) {
    let total_inches = cm / CM_PER_IN;
    let feet = (total_inches / 12.0).floor();
    let inches = total_inches - feet * 12.0;
    (feet as u32, inches)
}

/// Round to one decimal place
pub fn round_to_tenth(value: f64) -> f64 {
    // Past 2^52 there is no fractional part left, and scaling could overflow
    if value.abs() >= 4.5e15 {
        return value;
    }
    (value * 10.0).round() / 10.0
}
