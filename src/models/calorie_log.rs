//! Calorie log model
//!
//! Total calories eaten per user per day. Recording a day again replaces the
//! previous total.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};

/// Days shown in a history view when no limit is given
pub const DEFAULT_HISTORY_DAYS: i64 = 7;
/// Upper bound for a single history request
pub const MAX_HISTORY_DAYS: i64 = 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalorieLogEntry {
    pub user_id: String,
    /// ISO date: "2025-01-09"
    pub date: String,
    pub calories: f64,
    pub updated_at: String,
}

impl CalorieLogEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get("user_id")?,
            date: row.get("date")?,
            calories: row.get("calories")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn get(conn: &Connection, user_id: &str, date: NaiveDate) -> DbResult<Option<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM calorie_log WHERE user_id = ?1 AND date = ?2")?;

        match stmt.query_row(params![user_id, date.to_string()], Self::from_row) {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set the total for one day (upsert)
    pub fn record(
        conn: &Connection,
        user_id: &str,
        date: NaiveDate,
        calories: f64,
    ) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO calorie_log (user_id, date, calories)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, date) DO UPDATE SET
                calories = excluded.calories,
                updated_at = datetime('now')
            "#,
            params![user_id, date.to_string(), calories],
        )?;

        Self::get(conn, user_id, date)?.ok_or(DbError::MissingRow)
    }

    /// Most recent days first
    pub fn recent(conn: &Connection, user_id: &str, limit: i64) -> DbResult<Vec<Self>> {
        let limit = limit.clamp(1, MAX_HISTORY_DAYS);
        let mut stmt = conn.prepare(
            "SELECT * FROM calorie_log WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2",
        )?;
        let entries = stmt
            .query_map(params![user_id, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_record_replaces_day_total() {
        let conn = conn();
        CalorieLogEntry::record(&conn, "u1", day(1), 1800.0).unwrap();
        let entry = CalorieLogEntry::record(&conn, "u1", day(1), 2100.0).unwrap();
        assert_eq!(entry.calories, 2100.0);
        assert_eq!(entry.date, "2025-03-01");
        assert_eq!(CalorieLogEntry::recent(&conn, "u1", 7).unwrap().len(), 1);
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let conn = conn();
        for d in 1..=10 {
            CalorieLogEntry::record(&conn, "u1", day(d), 1500.0 + d as f64).unwrap();
        }
        CalorieLogEntry::record(&conn, "u2", day(11), 999.0).unwrap();

        let entries = CalorieLogEntry::recent(&conn, "u1", DEFAULT_HISTORY_DAYS).unwrap();
        let dates: Vec<&str> = entries.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(
            dates,
            vec![
                "2025-03-10", "2025-03-09", "2025-03-08", "2025-03-07", "2025-03-06",
                "2025-03-05", "2025-03-04"
            ]
        );
    }

    #[test]
    fn test_negative_calories_rejected_by_schema() {
        let conn = conn();
        assert!(CalorieLogEntry::record(&conn, "u1", day(1), -10.0).is_err());
    }
}
