//! FitPal Status Tool
//!
//! Provides runtime status information about the FitPal service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;

/// Usage guide for AI assistants
pub const INSTRUCTIONS: &str = r#"
# FitPal Instructions

FitPal estimates body metrics and energy needs, keeps a profile per user, and
looks up foods and groceries.

## Calculators

These never store anything.

| Tool | Required | Optional |
|------|----------|----------|
| `compute_bmi` | weight, height | weight_unit (kg/lb), height_unit (cm/in/ft), height_inches |
| `compute_daily_calories` | age, weight, height, gender, activity_level | weight_unit, height_unit, height_inches |
| `compute_workout_calories` | category, intensity, weight, duration_minutes | weight_unit |
| `list_met_values` | - | - |

- Heights in feet: pass `height: 5, height_unit: "ft", height_inches: 9` for 5'9".
- Activity levels: sedentary, light, moderate, active, veryActive. The calorie
  calculator treats an unknown level as sedentary; profiles reject it.
- Workout categories: StrengthTraining, Cardio, Yoga, HIIT.
- Intensities: Light, Moderate, Heavy.

All problems with a request are reported together in one `fields` map, e.g.

```json
{"error": "validation_failed", "fields": {"age": {"kind": "out_of_range", "min": 1, "max": 110}}}
```

## Profiles

- `save_profile` creates the profile on first call and replaces it afterwards.
  `weight_unit` applies to both `weight` and `target_weight`.
- `get_profile_summary` adds BMI, the daily calorie target, and the kilograms
  left to the target weight (negative when losing weight).

## Calorie Log

- `log_daily_calories` stores one total per day (YYYY-MM-DD). Logging the same
  day again replaces it.
- `get_calorie_history` lists the most recent days (default 7) and, when the
  user has a profile, how far each day was from the target.

## Food Lookup

- `classify_food_image` takes `image_base64` (plain or a data URL) or a
  `file_path` and returns the best label.
- `lookup_nutrition` takes a food name and grams (default 100).
- `analyze_food_image` does both in one call.
- `search_products` searches the grocery catalog (limit 1-25, default 5).

These depend on external services. Call `fitpal_status` to see which ones are
configured; an unavailable service returns a short error and is not retried.
"#;

/// Runtime status of the FitPal service
#[derive(Debug, Clone, Serialize)]
pub struct FitpalStatus {
    /// Build information
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,

    /// Upstream services with credentials
    pub configured_services: Vec<&'static str>,

    /// Process information
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
    configured_services: Vec<&'static str>,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf, configured_services: Vec<&'static str>) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
            configured_services,
        }
    }

    pub fn get_status(&self) -> FitpalStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        FitpalStatus {
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            configured_services: self.configured_services.clone(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}
