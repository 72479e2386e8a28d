//! Build script for FitPal
//!
//! Bumps a persistent build counter and embeds it, along with the build time,
//! into the binary.

use std::fs;
use std::path::Path;

const COUNTER_FILE: &str = "build_number.txt";

fn read_counter(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

fn main() {
    println!("cargo:rerun-if-changed=src");

    let counter_path = Path::new(COUNTER_FILE);
    let build_number = read_counter(counter_path) + 1;

    fs::write(counter_path, build_number.to_string())
        .expect("Failed to write build counter");

    let built_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=FITPAL_BUILD_NUMBER={}", build_number);
    println!("cargo:rustc-env=FITPAL_BUILD_TIMESTAMP={}", built_at);
    println!("cargo:warning=FitPal build #{} at {}", build_number, built_at);
}
