//! Input validation and calculator errors
//!
//! Validation never stops at the first problem: every field is checked and the
//! failures are collected into one [`ValidationErrors`] map.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::units::{to_centimeters, to_kilograms, Height, HeightUnit, MeasurementError, WeightUnit};
use super::workout::{Intensity, WorkoutCategory};

/// Inclusive age bounds in years
pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 110;

/// Why a single field was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    #[error("is required")]
    MissingField,

    #[error("must be a positive, finite measurement")]
    InvalidMeasurement,

    #[error("must be between {min} and {max}")]
    OutOfRange { min: i64, max: i64 },

    #[error("must be one of: {}", .allowed.join(", "))]
    InvalidChoice { allowed: &'static [&'static str] },

    #[error("only applies when {unit_field} is {unit}")]
    NotApplicable {
        unit_field: &'static str,
        unit: &'static str,
    },
}

impl From<MeasurementError> for FieldError {
    fn from(_: MeasurementError) -> Self {
        FieldError::InvalidMeasurement
    }
}

/// All field failures for one request, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationErrors {
    pub fields: BTreeMap<String, FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, error: FieldError) {
        // Keep the first failure reported for a field
        self.fields.entry(field.to_string()).or_insert(error);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&FieldError> {
        self.fields.get(field)
    }

    /// `Ok(value)` when nothing was collected
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, CalcError> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(CalcError::Validation(self))
        }
    }

    // ------------------------------------------------------------------------
    // Field checks. Each returns the checked value, or records the failure and
    // returns None so the caller can keep checking the remaining fields.
    // ------------------------------------------------------------------------

    pub fn require<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.add(field, FieldError::MissingField);
        }
        value
    }

    /// Required text field; blank strings count as missing
    pub fn require_text<'a>(&mut self, field: &str, value: Option<&'a str>) -> Option<&'a str> {
        let value = value.map(str::trim).filter(|s| !s.is_empty());
        self.require(field, value)
    }

    pub fn age(&mut self, field: &str, value: Option<i64>) -> Option<u32> {
        let age = self.require(field, value)?;
        if !(MIN_AGE..=MAX_AGE).contains(&age) {
            self.add(field, FieldError::OutOfRange { min: MIN_AGE, max: MAX_AGE });
            return None;
        }
        Some(age as u32)
    }

    pub fn positive(&mut self, field: &str, value: Option<f64>) -> Option<f64> {
        let value = self.require(field, value)?;
        if !value.is_finite() || value <= 0.0 {
            self.add(field, FieldError::InvalidMeasurement);
            return None;
        }
        Some(value)
    }

    /// Parse an enumerated value; an absent value is reported as missing
    pub fn choice<T>(
        &mut self,
        field: &str,
        value: Option<&str>,
        allowed: &'static [&'static str],
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Option<T> {
        let raw = self.require_text(field, value)?;
        let parsed = parse(raw);
        if parsed.is_none() {
            self.add(field, FieldError::InvalidChoice { allowed });
        }
        parsed
    }

    /// Parse an optional unit tag, falling back to the default unit when absent
    pub fn unit<T: Default>(
        &mut self,
        field: &str,
        value: Option<&str>,
        allowed: &'static [&'static str],
        parse: impl FnOnce(&str) -> Option<T>,
    ) -> Option<T> {
        match value.map(str::trim).filter(|s| !s.is_empty()) {
            None => Some(T::default()),
            Some(raw) => {
                let parsed = parse(raw);
                if parsed.is_none() {
                    self.add(field, FieldError::InvalidChoice { allowed });
                }
                parsed
            }
        }
    }

    /// Weight in kilograms from a value and an optional unit tag (default kg)
    pub fn weight_kg(
        &mut self,
        field: &str,
        value: Option<f64>,
        unit_field: &str,
        unit: Option<&str>,
    ) -> Option<f64> {
        let unit = self.unit(unit_field, unit, WeightUnit::NAMES, WeightUnit::from_str);
        let value = self.require(field, value)?;
        let unit = unit?;
        match to_kilograms(value, unit) {
            Ok(kg) => Some(kg),
            Err(e) => {
                self.add(field, e.into());
                None
            }
        }
    }

    /// Height in centimeters from a value, an optional unit tag (default cm)
    /// and the extra inches that accompany a feet value
    ///
    /// Extra inches with any other unit are rejected; a zero is tolerated.
    pub fn height_cm(
        &mut self,
        field: &str,
        value: Option<f64>,
        unit_field: &'static str,
        unit: Option<&str>,
        inches_field: &str,
        extra_inches: Option<f64>,
    ) -> Option<f64> {
        let unit = self.unit(unit_field, unit, HeightUnit::NAMES, HeightUnit::from_str);
        let stray_inches = matches!(
            (unit, extra_inches),
            (Some(parsed), Some(inches)) if parsed != HeightUnit::Ft && inches != 0.0
        );
        if stray_inches {
            self.add(
                inches_field,
                FieldError::NotApplicable {
                    unit_field,
                    unit: HeightUnit::Ft.as_str(),
                },
            );
        }
        let value = self.require(field, value)?;
        let unit = unit?;
        if stray_inches {
            return None;
        }
        match to_centimeters(Height::new(value, unit, extra_inches)) {
            Ok(cm) => Some(cm),
            Err(e) => {
                self.add(field, e.into());
                None
            }
        }
    }

    /// Check a figure derived from already accepted measurements
    ///
    /// Positive finite inputs can still overflow (or underflow to zero) once
    /// multiplied together. When that happens every source field is flagged.
    pub fn derived(&mut self, value: f64, fields: &[&str]) -> Option<f64> {
        if value.is_finite() && value > 0.0 {
            return Some(value);
        }
        for field in fields {
            self.add(field, FieldError::InvalidMeasurement);
        }
        None
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid input: ")?;
        let mut first = true;
        for (field, error) in &self.fields {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{} {}", field, error)?;
            first = false;
        }
        Ok(())
    }
}

/// Calculator failure
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// User input rejected; every failing field is listed
    #[error("{0}")]
    Validation(ValidationErrors),

    /// A MET table is missing a cell. Raised only while building a table.
    #[error("no MET value for {intensity} {category}")]
    UnknownActivityCombination {
        intensity: Intensity,
        category: WorkoutCategory,
    },

    #[error("invalid MET value {met} for {intensity} {category}")]
    InvalidMetValue {
        intensity: Intensity,
        category: WorkoutCategory,
        met: f64,
    },
}

impl CalcError {
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            CalcError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_every_failure() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.age("age", None), None);
        assert_eq!(errors.require_text("gender", Some("  ")), None);
        assert_eq!(errors.positive("weight", Some(-1.0)), None);

        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("age"), Some(&FieldError::MissingField));
        assert_eq!(errors.get("gender"), Some(&FieldError::MissingField));
        assert_eq!(errors.get("weight"), Some(&FieldError::InvalidMeasurement));
    }

    #[test]
    fn test_age_bounds() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.age("a", Some(1)), Some(1));
        assert_eq!(errors.age("b", Some(110)), Some(110));
        assert!(errors.is_empty());

        assert_eq!(errors.age("c", Some(0)), None);
        assert_eq!(errors.age("d", Some(111)), None);
        assert_eq!(errors.get("c"), Some(&FieldError::OutOfRange { min: 1, max: 110 }));
        assert_eq!(errors.get("d"), Some(&FieldError::OutOfRange { min: 1, max: 110 }));
    }

    #[test]
    fn test_weight_with_unknown_unit() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.weight_kg("weight", Some(70.0), "weight_unit", Some("stone")), None);
        assert!(matches!(
            errors.get("weight_unit"),
            Some(FieldError::InvalidChoice { .. })
        ));
        assert!(errors.get("weight").is_none());
    }

    #[test]
    fn test_unit_defaults_when_absent() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.weight_kg("weight", Some(70.0), "weight_unit", None), Some(70.0));
        assert_eq!(
            errors.height_cm("height", Some(175.0), "height_unit", Some(""), "height_inches", None),
            Some(175.0)
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_inches_only_with_feet() {
        let mut errors = ValidationErrors::new();
        assert_eq!(
            errors.height_cm("height", Some(170.0), "height_unit", Some("cm"), "height_inches", Some(-5.0)),
            None
        );
        assert_eq!(
            errors.get("height_inches"),
            Some(&FieldError::NotApplicable { unit_field: "height_unit", unit: "ft" })
        );
        assert!(errors.get("height").is_none());

        // A zero is harmless and feet still take their inches
        let mut errors = ValidationErrors::new();
        assert_eq!(
            errors.height_cm("height", Some(170.0), "height_unit", None, "height_inches", Some(0.0)),
            Some(170.0)
        );
        let cm = errors
            .height_cm("height", Some(5.0), "height_unit", Some("ft"), "height_inches", Some(10.0))
            .unwrap();
        assert!((cm - 177.8).abs() < 1e-9);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_derived_flags_source_fields() {
        let mut errors = ValidationErrors::new();
        assert_eq!(errors.derived(22.9, &["weight", "height"]), Some(22.9));
        assert!(errors.is_empty());

        assert_eq!(errors.derived(f64::INFINITY, &["weight", "height"]), None);
        assert_eq!(errors.derived(0.0, &["duration_minutes"]), None);
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get("height"), Some(&FieldError::InvalidMeasurement));
        assert_eq!(errors.get("duration_minutes"), Some(&FieldError::InvalidMeasurement));
    }

    #[test]
    fn test_display_lists_fields() {
        let mut errors = ValidationErrors::new();
        errors.add("gender", FieldError::MissingField);
        errors.add("age", FieldError::OutOfRange { min: 1, max: 110 });
        assert_eq!(
            errors.to_string(),
            "invalid input: age must be between 1 and 110; gender is required"
        );
    }

    #[test]
    fn test_finish() {
        let errors = ValidationErrors::new();
        assert_eq!(errors.finish(|| 5), Ok(5));

        let mut errors = ValidationErrors::new();
        errors.add("age", FieldError::MissingField);
        let err = errors.finish(|| 5).unwrap_err();
        assert!(err.validation_errors().is_some());
        assert_eq!(err.validation_errors().map(|e| e.len()), Some(1));
    }
}
