//! Profile MCP Tools
//!
//! Tools for reading and saving user profiles.

use serde::Serialize;

use crate::db::Database;
use crate::metabolic::{
    bmi_from_metric, calorie_target, round_to_tenth, BmiMeasurements, BmiResult, CalorieTarget,
    ValidationErrors,
};
use crate::models::{Profile, ProfileInput, ProfileSubmission};

use super::{require_user_id, ToolResult};

/// Response for save_profile
#[derive(Debug, Serialize)]
pub struct SaveProfileResponse {
    pub profile: Profile,
    pub created: bool, // true on first submission
}

/// Response for get_profile_summary
#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    pub profile: Profile,
    pub bmi: Option<BmiResult>,
    pub calorie_target: Option<CalorieTarget>,
    /// Signed; negative when the target is below the current weight
    pub kg_to_target: f64,
}

pub fn get_profile(db: &Database, user_id: &str) -> ToolResult<Option<Profile>> {
    let user_id = require_user_id(user_id)?;
    Ok(db.with_conn(|conn| Profile::find_by_user_id(conn, user_id))?)
}

pub fn save_profile(
    db: &Database,
    user_id: &str,
    submission: &ProfileSubmission<'_>,
) -> ToolResult<SaveProfileResponse> {
    let user_id = require_user_id(user_id)?;
    let input = ProfileInput::validate(submission)?;

    let conn = db.get_conn()?;
    let existed = Profile::find_by_user_id(&conn, user_id)?.is_some();
    let profile = Profile::upsert(&conn, user_id, &input)?;

    tracing::info!(
        user_id = %user_id,
        created = !existed,
        activity_level = %profile.activity_level,
        "Saved profile"
    );
    Ok(SaveProfileResponse {
        profile,
        created: !existed,
    })
}

/// Summary figures for a stored profile
///
/// Rows written before the current validation rules may not yield every
/// figure; those are left out rather than failing the read.
pub fn summarize(profile: Profile) -> ProfileSummary {
    let body = BmiMeasurements {
        weight_kg: profile.weight_kg,
        height_cm: profile.height_cm,
    };
    let mut errors = ValidationErrors::new();
    body.check_bmi(&mut errors);
    let bmi = errors
        .is_empty()
        .then(|| bmi_from_metric(body.weight_kg, body.height_cm));

    let calorie_target = match calorie_target(&profile.anthropometrics()) {
        Ok(target) => Some(target),
        Err(err) => {
            tracing::warn!(user_id = %profile.user_id, error = %err, "No calorie target for profile");
            None
        }
    };
    let kg_to_target = round_to_tenth(profile.kg_to_target());

    ProfileSummary {
        profile,
        bmi,
        calorie_target,
        kg_to_target,
    }
}

pub fn get_profile_summary(db: &Database, user_id: &str) -> ToolResult<Option<ProfileSummary>> {
    Ok(get_profile(db, user_id)?.map(summarize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic::{ActivityLevel, BmiCategory};
    use crate::tools::ToolError;

    fn database() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(crate::db::migrations::run_migrations).unwrap();
        db
    }

    fn submission() -> ProfileSubmission<'static> {
        ProfileSubmission {
            name: Some("Sam"),
            age: Some(30),
            gender: Some("male"),
            height: Some(175.0),
            weight: Some(70.0),
            target_weight: Some(65.0),
            activity_level: Some("sedentary"),
            ..Default::default()
        }
    }

    #[test]
    fn test_save_then_get() {
        let db = database();
        assert!(get_profile(&db, "u1").unwrap().is_none());

        let first = save_profile(&db, "u1", &submission()).unwrap();
        assert!(first.created);

        let second = save_profile(
            &db,
            "u1",
            &ProfileSubmission {
                activity_level: Some("veryActive"),
                ..submission()
            },
        )
        .unwrap();
        assert!(!second.created);

        let stored = get_profile(&db, "u1").unwrap().unwrap();
        assert_eq!(stored.activity_level, ActivityLevel::VeryActive);
        assert_eq!(stored.name, "Sam");
    }

    #[test]
    fn test_summary() {
        let db = database();
        save_profile(&db, "u1", &submission()).unwrap();

        let summary = get_profile_summary(&db, "u1").unwrap().unwrap();
        let bmi = summary.bmi.unwrap();
        assert_eq!(bmi.bmi_value, 22.9);
        assert_eq!(bmi.category, BmiCategory::NormalWeight);
        assert_eq!(summary.calorie_target.map(|t| t.daily_calories), Some(2035));
        assert_eq!(summary.kg_to_target, -5.0);

        assert!(get_profile_summary(&db, "nobody").unwrap().is_none());
    }

    #[test]
    fn test_summary_of_body_without_target() {
        let db = database();
        let err = save_profile(
            &db,
            "u1",
            &ProfileSubmission {
                age: Some(110),
                height: Some(10.0),
                weight: Some(1.0),
                target_weight: Some(1.0),
                ..submission()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::Rejected(_)));
        assert!(get_profile(&db, "u1").unwrap().is_none());

        // A row that predates the check is still summarized
        let input = ProfileInput {
            age: 110,
            height_cm: 10.0,
            weight_kg: 1.0,
            target_weight_kg: 1.0,
            ..ProfileInput::validate(&submission()).unwrap()
        };
        db.with_conn(|conn| Profile::upsert(conn, "u1", &input)).unwrap();
        let summary = get_profile_summary(&db, "u1").unwrap().unwrap();
        assert!(summary.calorie_target.is_none());
        assert_eq!(summary.bmi.map(|b| b.bmi_value), Some(100.0));
        assert_eq!(summary.kg_to_target, 0.0);
    }

    #[test]
    fn test_invalid_submission_not_stored() {
        let db = database();
        let err = save_profile(
            &db,
            "u1",
            &ProfileSubmission {
                age: None,
                gender: None,
                ..submission()
            },
        )
        .unwrap_err();
        match err {
            ToolError::Rejected(body) => {
                assert_eq!(body["fields"]["age"]["kind"], "missing_field");
                assert_eq!(body["fields"]["gender"]["kind"], "missing_field");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert!(get_profile(&db, "u1").unwrap().is_none());
    }

    #[test]
    fn test_blank_user_id() {
        let db = database();
        assert!(matches!(get_profile(&db, "  "), Err(ToolError::Rejected(_))));
    }
}
