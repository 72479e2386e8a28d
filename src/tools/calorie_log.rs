//! Calorie Log MCP Tools
//!
//! Daily calorie totals and a history view compared against the profile's
//! target.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::metabolic::calorie_target;
use crate::models::{CalorieLogEntry, Profile, DEFAULT_HISTORY_DAYS};

use super::{require_user_id, ToolError, ToolResult};

/// One day in a calorie history
#[derive(Debug, Serialize)]
pub struct HistoryDay {
    pub date: String,
    pub calories: f64,
    /// Positive when over the target
    pub difference_from_target: Option<f64>,
}

/// Response for get_calorie_history
#[derive(Debug, Serialize)]
pub struct CalorieHistory {
    pub user_id: String,
    pub daily_target: Option<i64>,
    pub days: Vec<HistoryDay>,
    pub average_calories: Option<f64>,
}

fn parse_date(date: &str) -> ToolResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        ToolError::rejected(
            "invalid_input",
            format!("Invalid date '{}', expected YYYY-MM-DD", date),
        )
    })
}

pub fn log_daily_calories(
    db: &Database,
    user_id: &str,
    date: &str,
    calories: f64,
) -> ToolResult<CalorieLogEntry> {
    let user_id = require_user_id(user_id)?;
    let date = parse_date(date)?;
    if !calories.is_finite() || calories < 0.0 {
        return Err(ToolError::rejected(
            "invalid_input",
            "Calories must be zero or a positive number",
        ));
    }

    let entry = db.with_conn(|conn| CalorieLogEntry::record(conn, user_id, date, calories))?;
    tracing::info!(user_id = %user_id, date = %date, calories, "Logged daily calories");
    Ok(entry)
}

pub fn get_calorie_history(
    db: &Database,
    user_id: &str,
    limit: Option<i64>,
) -> ToolResult<CalorieHistory> {
    let user_id = require_user_id(user_id)?;
    let limit = limit.unwrap_or(DEFAULT_HISTORY_DAYS);

    let (entries, profile) = db.with_conn(|conn| {
        Ok((
            CalorieLogEntry::recent(conn, user_id, limit)?,
            Profile::find_by_user_id(conn, user_id)?,
        ))
    })?;

    // A stored body that yields no target still has a readable history
    let daily_target = profile.and_then(|profile| {
        match calorie_target(&profile.anthropometrics()) {
            Ok(target) => Some(target.daily_calories),
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "No calorie target for profile");
                None
            }
        }
    });

    let average_calories = if entries.is_empty() {
        None
    } else {
        let total: f64 = entries.iter().map(|e| e.calories).sum();
        Some((total / entries.len() as f64).round())
    };

    let days = entries
        .into_iter()
        .map(|entry| HistoryDay {
            difference_from_target: daily_target.map(|target| entry.calories - target as f64),
            date: entry.date,
            calories: entry.calories,
        })
        .collect();

    Ok(CalorieHistory {
        user_id: user_id.to_string(),
        daily_target,
        days,
        average_calories,
    })
}
