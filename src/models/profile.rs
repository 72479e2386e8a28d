//! Profile model
//!
//! One row per user. Every submission replaces the whole record (upsert), so
//! concurrent writers simply resolve to last-write-wins.

use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::metabolic::{
    ActivityLevel, Anthropometrics, BmiMeasurements, CalcError, Gender, ValidationErrors,
};

pub const DEFAULT_PROFILE_NAME: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub target_weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub avatar_url: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Profile fields as submitted, before validation
#[derive(Debug, Clone, Default)]
pub struct ProfileSubmission<'a> {
    pub name: Option<&'a str>,
    pub age: Option<i64>,
    pub gender: Option<&'a str>,
    pub height: Option<f64>,
    pub height_unit: Option<&'a str>,
    pub height_inches: Option<f64>,
    /// Unit shared by `weight` and `target_weight`
    pub weight_unit: Option<&'a str>,
    pub weight: Option<f64>,
    pub target_weight: Option<f64>,
    pub activity_level: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

/// Validated profile data ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileInput {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub target_weight_kg: f64,
    pub activity_level: ActivityLevel,
    pub avatar_url: String,
}

impl ProfileInput {
    /// Strict validation: unlike the calorie calculator, an unknown activity
    /// level is rejected rather than defaulted.
    pub fn validate(raw: &ProfileSubmission<'_>) -> Result<Self, CalcError> {
        let mut errors = ValidationErrors::new();

        let age = errors.age("age", raw.age);
        let gender = errors.choice("gender", raw.gender, Gender::NAMES, Gender::from_str);
        let height_cm = errors.height_cm(
            "height",
            raw.height,
            "height_unit",
            raw.height_unit,
            "height_inches",
            raw.height_inches,
        );
        let weight_kg = errors.weight_kg("weight", raw.weight, "weight_unit", raw.weight_unit);
        let target_weight_kg =
            errors.weight_kg("target_weight", raw.target_weight, "weight_unit", raw.weight_unit);
        let activity_level = errors.choice(
            "activity_level",
            raw.activity_level,
            ActivityLevel::NAMES,
            ActivityLevel::from_str,
        );

        let name = raw
            .name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_PROFILE_NAME)
            .to_string();
        let avatar_url = raw.avatar_url.map(str::trim).unwrap_or_default().to_string();

        match (age, gender, height_cm, weight_kg, target_weight_kg, activity_level) {
            (
                Some(age),
                Some(gender),
                Some(height_cm),
                Some(weight_kg),
                Some(target_weight_kg),
                Some(activity_level),
            ) => {
                // Reject bodies that the summary and history views could not
                // turn into figures later
                BmiMeasurements { weight_kg, height_cm }.check_bmi(&mut errors);
                Anthropometrics { age, weight_kg, height_cm, gender, activity_level }
                    .check_energy(&mut errors);

                errors.finish(|| Self {
                    name,
                    age,
                    gender,
                    height_cm,
                    weight_kg,
                    target_weight_kg,
                    activity_level,
                    avatar_url,
                })
            }
            _ => Err(CalcError::Validation(errors)),
        }
    }
}

/// Read a text column and parse it into an enum
fn parse_column<T>(
    row: &Row,
    column: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let index = row.as_ref().column_index(column)?;
    let raw: String = row.get(index)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            format!("unexpected {} '{}'", column, raw).into(),
        )
    })
}

impl Profile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            age: row.get("age")?,
            gender: parse_column(row, "gender", Gender::from_str)?,
            height_cm: row.get("height_cm")?,
            weight_kg: row.get("weight_kg")?,
            target_weight_kg: row.get("target_weight_kg")?,
            activity_level: parse_column(row, "activity_level", ActivityLevel::from_str)?,
            avatar_url: row.get("avatar_url")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn find_by_user_id(conn: &Connection, user_id: &str) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM profiles WHERE user_id = ?1")?;

        match stmt.query_row([user_id], Self::from_row) {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create the profile on first submission, replace it on every later one
    pub fn upsert(conn: &Connection, user_id: &str, data: &ProfileInput) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO profiles
                (user_id, name, age, gender, height_cm, weight_kg, target_weight_kg,
                 activity_level, avatar_url)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(user_id) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                gender = excluded.gender,
                height_cm = excluded.height_cm,
                weight_kg = excluded.weight_kg,
                target_weight_kg = excluded.target_weight_kg,
                activity_level = excluded.activity_level,
                avatar_url = excluded.avatar_url,
                updated_at = datetime('now')
            "#,
            params![
                user_id,
                data.name,
                data.age,
                data.gender.as_str(),
                data.height_cm,
                data.weight_kg,
                data.target_weight_kg,
                data.activity_level.as_str(),
                data.avatar_url,
            ],
        )?;

        Self::find_by_user_id(conn, user_id)?.ok_or(DbError::MissingRow)
    }

    /// Inputs for the daily calorie calculator
    pub fn anthropometrics(&self) -> Anthropometrics {
        Anthropometrics {
            age: self.age,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            gender: self.gender,
            activity_level: self.activity_level,
        }
    }

    /// Signed kilograms still to go; negative means the target is below the
    /// current weight
    pub fn kg_to_target(&self) -> f64 {
        self.target_weight_kg - self.weight_kg
    }
}
