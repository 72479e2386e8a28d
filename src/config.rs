//! Runtime configuration
//!
//! Everything comes from environment variables. Upstream credentials are
//! optional: a service without credentials is reported as not configured when
//! one of its tools is called.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::metabolic::{CalcError, MetEntry, MetTable};

pub const DEFAULT_CLASSIFIER_URL: &str =
    "https://api-inference.huggingface.co/models/google/vit-base-patch16-224";
pub const DEFAULT_NUTRITION_URL: &str = "https://trackapi.nutritionix.com/v2/natural/nutrients";
pub const DEFAULT_CATALOG_URL: &str = "https://api.spoonacular.com/food/products/search";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },

    #[error("Could not read MET table {path}: {source}")]
    MetTableIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse MET table {path}: {source}")]
    MetTableParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Incomplete MET table: {0}")]
    MetTable(#[from] CalcError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub url: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NutritionConfig {
    pub url: String,
    pub app_id: Option<String>,
    pub app_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub classifier: ClassifierConfig,
    pub nutrition: NutritionConfig,
    pub catalog: CatalogConfig,
    pub http_timeout: Duration,
    pub met_table_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let http_timeout = match get("FITPAL_HTTP_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "FITPAL_HTTP_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
        };

        Ok(Self {
            database_path: get("FITPAL_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_database_path),
            classifier: ClassifierConfig {
                url: get("FITPAL_CLASSIFIER_URL")
                    .unwrap_or_else(|| DEFAULT_CLASSIFIER_URL.to_string()),
                token: get("HF_TOKEN"),
            },
            nutrition: NutritionConfig {
                url: get("FITPAL_NUTRITION_URL")
                    .unwrap_or_else(|| DEFAULT_NUTRITION_URL.to_string()),
                app_id: get("NUTRITIONIX_APP_ID"),
                app_key: get("NUTRITIONIX_APP_KEY"),
            },
            catalog: CatalogConfig {
                url: get("FITPAL_CATALOG_URL").unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
                api_key: get("SPOONACULAR_API_KEY"),
            },
            http_timeout,
            met_table_path: get("FITPAL_MET_TABLE").map(PathBuf::from),
        })
    }

    /// The configured MET table, or the built-in one
    pub fn load_met_table(&self) -> Result<MetTable, ConfigError> {
        match &self.met_table_path {
            None => Ok(MetTable::standard()),
            Some(path) => load_met_table_file(path),
        }
    }

    /// Names of upstream services that have credentials
    pub fn configured_services(&self) -> Vec<&'static str> {
        let mut services = Vec::new();
        if self.classifier.token.is_some() {
            services.push("image_classifier");
        }
        if self.nutrition.app_id.is_some() && self.nutrition.app_key.is_some() {
            services.push("nutrition");
        }
        if self.catalog.api_key.is_some() {
            services.push("catalog");
        }
        services
    }
}

fn load_met_table_file(path: &Path) -> Result<MetTable, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::MetTableIo {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<MetEntry> =
        serde_json::from_str(&text).map_err(|source| ConfigError::MetTableParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(MetTable::from_entries(entries)?)
}

/// `<project>/data/fitpal.db`, where the project root is found by walking up
/// out of `target/{debug,release}`
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(project_root) = path.parent().and_then(|p| p.parent()) {
            path = project_root.to_path_buf();
        }
    }

    path.push("data");
    path.push("fitpal.db");
    path
}
