//! Data models
//!
//! Rust structs representing database entities.

mod calorie_log;
mod profile;

pub use calorie_log::{CalorieLogEntry, DEFAULT_HISTORY_DAYS, MAX_HISTORY_DAYS};
pub use profile::{Profile, ProfileInput, ProfileSubmission, DEFAULT_PROFILE_NAME};
