//! Utility to set a user's profile in the database
//!
//! Usage: set_profile <user_id> <age> <gender> <height_cm> <weight_kg> <target_weight_kg> <activity_level> [name]

use fitpal::config::Config;
use fitpal::metabolic::calorie_target;
use fitpal::models::{Profile, ProfileInput, ProfileSubmission};

const USAGE: &str = "Usage: set_profile <user_id> <age> <gender> <height_cm> <weight_kg> <target_weight_kg> <activity_level> [name]";

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, String> {
    raw.parse()
        .map_err(|_| format!("{} must be a number, got '{}'", name, raw))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 7 || args.len() > 8 {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    }

    let submission = ProfileSubmission {
        age: Some(parse_number("age", &args[1])?),
        gender: Some(args[2].as_str()),
        height: Some(parse_number("height_cm", &args[3])?),
        weight: Some(parse_number("weight_kg", &args[4])?),
        target_weight: Some(parse_number("target_weight_kg", &args[5])?),
        activity_level: Some(args[6].as_str()),
        name: args.get(7).map(String::as_str),
        ..Default::default()
    };
    let input = ProfileInput::validate(&submission)?;

    let config = Config::from_env()?;
    println!("Database path: {}", config.database_path.display());
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = fitpal::db::Database::new(&config.database_path)?;

    // Run migrations
    database.with_conn(|conn| {
        fitpal::db::migrations::run_migrations(conn)?;
        Ok(())
    })?;

    let profile = database.with_conn(|conn| Profile::upsert(conn, &args[0], &input))?;
    let target = calorie_target(&profile.anthropometrics())?;

    println!("Profile set:");
    println!("  User: {}", profile.user_id);
    println!("  Name: {}", profile.name);
    println!("  Age: {}", profile.age);
    println!("  Height: {} cm", profile.height_cm);
    println!("  Weight: {} kg (target {} kg)", profile.weight_kg, profile.target_weight_kg);
    println!("  Activity: {}", profile.activity_level);
    println!("  Daily calories: {}", target.daily_calories);
    println!("  Updated: {}", profile.updated_at);

    Ok(())
}
