//! FitPal Library
//!
//! Fitness calculators, user profiles and food lookups served over MCP.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod metabolic;
pub mod models;
pub mod tools;
pub mod upstream;
