//! Database migrations

use rusqlite::Connection;

use super::connection::DbResult;

const SCHEMA_VERSION: i32 = 1;

/// Bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
        tracing::info!("Applied schema migration v1");
    }

    Ok(())
}

/// Migration v1: profiles and the daily calorie log
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- PROFILES
        -- One row per user, keyed by the identity provider's user id
        -- ============================================
        CREATE TABLE profiles (
            user_id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL DEFAULT 'Anonymous',
            age INTEGER NOT NULL CHECK(age BETWEEN 1 AND 110),
            gender TEXT NOT NULL CHECK(gender IN ('male', 'female')),
            height_cm REAL NOT NULL CHECK(height_cm > 0),
            weight_kg REAL NOT NULL CHECK(weight_kg > 0),
            target_weight_kg REAL NOT NULL CHECK(target_weight_kg > 0),
            activity_level TEXT NOT NULL CHECK(activity_level IN
                ('sedentary', 'light', 'moderate', 'active', 'veryActive')),
            avatar_url TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- ============================================
        -- CALORIE LOG
        -- Total calories per user per day
        -- ============================================
        CREATE TABLE calorie_log (
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,                  -- ISO date: "2025-01-09"
            calories REAL NOT NULL CHECK(calories >= 0),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (user_id, date)
        );

        CREATE INDEX idx_calorie_log_user_date ON calorie_log(user_id, date DESC);
        "#,
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let tracked: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations')",
        [],
        |row| row.get(0),
    )?;
    if !tracked {
        return Ok(true);
    }
    Ok(get_schema_version(conn)? < SCHEMA_VERSION)
}
