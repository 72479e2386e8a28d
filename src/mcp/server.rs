//! FitPal MCP Server Implementation
//!
//! Implements the MCP server with all FitPal tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::Database;
use crate::metabolic::{BmiInput, DailyCaloriesInput, MetTable, WorkoutInput};
use crate::models::ProfileSubmission;
use crate::tools::status::StatusTracker;
use crate::tools::{calculators, calorie_log, lookup, profile, ToolError, ToolResult};
use crate::upstream::{
    CatalogClient, FoodRecognizer, ImageClassifier, NutritionClient, NutritionSource,
    ProductCatalog,
};

/// FitPal MCP Service
#[derive(Clone)]
pub struct FitpalService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    met_table: Arc<MetTable>,
    recognizer: Arc<dyn FoodRecognizer>,
    nutrition: Arc<dyn NutritionSource>,
    catalog: Arc<dyn ProductCatalog>,
    tool_router: ToolRouter<FitpalService>,
}

impl FitpalService {
    pub fn new(config: &Config, database: Database, met_table: MetTable) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(
                config.database_path.clone(),
                config.configured_services(),
            ))),
            database,
            met_table: Arc::new(met_table),
            recognizer: Arc::new(ImageClassifier::new(config.classifier.clone(), config.http_timeout)),
            nutrition: Arc::new(NutritionClient::new(config.nutrition.clone(), config.http_timeout)),
            catalog: Arc::new(CatalogClient::new(config.catalog.clone(), config.http_timeout)),
            tool_router: Self::tool_router(),
        }
    }

    /// Service with explicit upstream implementations
    pub fn with_upstreams(
        database_path: PathBuf,
        database: Database,
        met_table: MetTable,
        recognizer: Arc<dyn FoodRecognizer>,
        nutrition: Arc<dyn NutritionSource>,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path, Vec::new()))),
            database,
            met_table: Arc::new(met_table),
            recognizer,
            nutrition,
            catalog,
            tool_router: Self::tool_router(),
        }
    }
}

/// Turn a tool outcome into an MCP result. Rejected requests are tool errors
/// the caller can read; anything else is an internal error.
fn respond<T: Serialize>(result: ToolResult<T>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(value) => {
            let json = serde_json::to_string_pretty(&value)
                .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
            Ok(CallToolResult::success(vec![Content::text(json)]))
        }
        Err(ToolError::Rejected(body)) => {
            let json = serde_json::to_string_pretty(&body)
                .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
            Ok(CallToolResult::error(vec![Content::text(json)]))
        }
        Err(ToolError::Internal(message)) => Err(McpError::internal_error(message, None)),
    }
}

#[derive(Debug, Serialize)]
struct NotFound<'a> {
    error: String,
    user_id: &'a str,
}

fn respond_found<T: Serialize>(
    result: ToolResult<Option<T>>,
    what: &str,
    user_id: &str,
) -> Result<CallToolResult, McpError> {
    match result {
        Ok(Some(value)) => respond(Ok(value)),
        Ok(None) => respond(Ok(NotFound {
            error: format!("{} not found", what),
            user_id,
        })),
        Err(e) => respond::<()>(Err(e)),
    }
}

// ============================================================================
// Calculator Parameter Structs
// ============================================================================

// Measurements are optional at the schema level so that every missing field
// is reported together by validation.

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ComputeBmiParams {
    pub weight: Option<f64>,
    /// "kg" (default) or "lb"
    pub weight_unit: Option<String>,
    pub height: Option<f64>,
    /// "cm" (default), "in" or "ft"
    pub height_unit: Option<String>,
    /// Extra inches when height_unit is "ft"
    pub height_inches: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ComputeDailyCaloriesParams {
    pub age: Option<i64>,
    pub weight: Option<f64>,
    pub weight_unit: Option<String>,
    pub height: Option<f64>,
    pub height_unit: Option<String>,
    pub height_inches: Option<f64>,
    /// "male" or "female"
    pub gender: Option<String>,
    /// sedentary, light, moderate, active or veryActive
    pub activity_level: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ComputeWorkoutCaloriesParams {
    /// StrengthTraining, Cardio, Yoga or HIIT
    pub category: Option<String>,
    /// Light, Moderate or Heavy
    pub intensity: Option<String>,
    pub weight: Option<f64>,
    pub weight_unit: Option<String>,
    pub duration_minutes: Option<f64>,
}

// ============================================================================
// Profile and Calorie Log Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UserParams {
    pub user_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SaveProfileParams {
    pub user_id: String,
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub height: Option<f64>,
    pub height_unit: Option<String>,
    pub height_inches: Option<f64>,
    pub weight: Option<f64>,
    pub target_weight: Option<f64>,
    /// Unit for both weight and target_weight
    pub weight_unit: Option<String>,
    pub activity_level: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogDailyCaloriesParams {
    pub user_id: String,
    /// YYYY-MM-DD
    pub date: String,
    pub calories: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CalorieHistoryParams {
    pub user_id: String,
    /// Number of most recent days (default 7)
    pub limit: Option<i64>,
}

// ============================================================================
// Food Lookup Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ClassifyFoodImageParams {
    /// Base64 image data or a data URL
    pub image_base64: Option<String>,
    /// Path to an image file readable by the server
    pub file_path: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeFoodImageParams {
    pub image_base64: Option<String>,
    pub file_path: Option<String>,
    /// Portion size in grams (default 100)
    pub grams: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LookupNutritionParams {
    pub food_name: String,
    /// Portion size in grams (default 100)
    pub grams: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchProductsParams {
    pub query: String,
    /// 1-25, default 5
    pub limit: Option<u32>,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl FitpalService {
    // --- Status ---

    #[tool(description = "Get the current status of the FitPal service including build info, database status, configured upstream services, and process information")]
    async fn fitpal_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get instructions for using the FitPal tools. Call this when unsure which units, enums or parameters a tool accepts.")]
    fn fitpal_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(INSTRUCTIONS)]))
    }

    // --- Calculators ---

    #[tool(description = "Compute body mass index and its category from weight and height (metric or imperial)")]
    fn compute_bmi(&self, Parameters(p): Parameters<ComputeBmiParams>) -> Result<CallToolResult, McpError> {
        let input = BmiInput {
            weight: p.weight,
            weight_unit: p.weight_unit.as_deref(),
            height: p.height,
            height_unit: p.height_unit.as_deref(),
            height_inches: p.height_inches,
        };
        respond(calculators::bmi(&input))
    }

    #[tool(description = "Compute basal metabolic rate and the activity-adjusted daily calorie target")]
    fn compute_daily_calories(&self, Parameters(p): Parameters<ComputeDailyCaloriesParams>) -> Result<CallToolResult, McpError> {
        let input = DailyCaloriesInput {
            age: p.age,
            weight: p.weight,
            weight_unit: p.weight_unit.as_deref(),
            height: p.height,
            height_unit: p.height_unit.as_deref(),
            height_inches: p.height_inches,
            gender: p.gender.as_deref(),
            activity_level: p.activity_level.as_deref(),
        };
        respond(calculators::daily_calories(&input))
    }

    #[tool(description = "Estimate calories burned by a workout from its category, intensity, body weight and duration")]
    fn compute_workout_calories(&self, Parameters(p): Parameters<ComputeWorkoutCaloriesParams>) -> Result<CallToolResult, McpError> {
        let input = WorkoutInput {
            category: p.category.as_deref(),
            intensity: p.intensity.as_deref(),
            weight: p.weight,
            weight_unit: p.weight_unit.as_deref(),
            duration_minutes: p.duration_minutes,
        };
        respond(calculators::workout_calories(&self.met_table, &input))
    }

    #[tool(description = "List the MET values used for every workout intensity and category")]
    fn list_met_values(&self) -> Result<CallToolResult, McpError> {
        respond(Ok(calculators::met_table(&self.met_table)))
    }

    // --- Profiles ---

    #[tool(description = "Get a user's stored profile")]
    fn get_profile(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        respond_found(profile::get_profile(&self.database, &p.user_id), "Profile", &p.user_id)
    }

    #[tool(description = "Create or replace a user's profile. All fields are validated together; nothing is saved if any is invalid.")]
    fn save_profile(&self, Parameters(p): Parameters<SaveProfileParams>) -> Result<CallToolResult, McpError> {
        let submission = ProfileSubmission {
            name: p.name.as_deref(),
            age: p.age,
            gender: p.gender.as_deref(),
            height: p.height,
            height_unit: p.height_unit.as_deref(),
            height_inches: p.height_inches,
            weight_unit: p.weight_unit.as_deref(),
            weight: p.weight,
            target_weight: p.target_weight,
            activity_level: p.activity_level.as_deref(),
            avatar_url: p.avatar_url.as_deref(),
        };
        respond(profile::save_profile(&self.database, &p.user_id, &submission))
    }

    #[tool(description = "Get a user's profile with BMI, daily calorie target and kilograms remaining to the target weight")]
    fn get_profile_summary(&self, Parameters(p): Parameters<UserParams>) -> Result<CallToolResult, McpError> {
        respond_found(profile::get_profile_summary(&self.database, &p.user_id), "Profile", &p.user_id)
    }

    // --- Calorie Log ---

    #[tool(description = "Record the total calories eaten on a day (YYYY-MM-DD). Replaces any earlier total for that day.")]
    fn log_daily_calories(&self, Parameters(p): Parameters<LogDailyCaloriesParams>) -> Result<CallToolResult, McpError> {
        respond(calorie_log::log_daily_calories(&self.database, &p.user_id, &p.date, p.calories))
    }

    #[tool(description = "Get recent daily calorie totals, newest first, compared with the profile's daily target when one exists")]
    fn get_calorie_history(&self, Parameters(p): Parameters<CalorieHistoryParams>) -> Result<CallToolResult, McpError> {
        respond(calorie_log::get_calorie_history(&self.database, &p.user_id, p.limit))
    }

    // --- Food Lookup ---

    #[tool(description = "Identify the food in a photo. Pass image_base64 or file_path.")]
    async fn classify_food_image(&self, Parameters(p): Parameters<ClassifyFoodImageParams>) -> Result<CallToolResult, McpError> {
        let result: ToolResult<_> = async {
            let image = lookup::resolve_image(p.image_base64.as_deref(), p.file_path.as_deref())?;
            lookup::classify_food_image(self.recognizer.as_ref(), &image).await
        }
        .await;
        respond(result)
    }

    #[tool(description = "Look up calories and macronutrients for a portion of a food")]
    async fn lookup_nutrition(&self, Parameters(p): Parameters<LookupNutritionParams>) -> Result<CallToolResult, McpError> {
        respond(lookup::lookup_nutrition(self.nutrition.as_ref(), &p.food_name, p.grams).await)
    }

    #[tool(description = "Identify the food in a photo and look up its nutrition for the given grams")]
    async fn analyze_food_image(&self, Parameters(p): Parameters<AnalyzeFoodImageParams>) -> Result<CallToolResult, McpError> {
        let result: ToolResult<_> = async {
            let image = lookup::resolve_image(p.image_base64.as_deref(), p.file_path.as_deref())?;
            lookup::analyze_food_image(self.recognizer.as_ref(), self.nutrition.as_ref(), &image, p.grams).await
        }
        .await;
        respond(result)
    }

    #[tool(description = "Search the grocery product catalog")]
    async fn search_products(&self, Parameters(p): Parameters<SearchProductsParams>) -> Result<CallToolResult, McpError> {
        respond(lookup::search_products(self.catalog.as_ref(), &p.query, p.limit).await)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for FitpalService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "fitpal".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("FitPal".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "FitPal - fitness calculators, user profiles and food lookups. \
                 Call fitpal_instructions first if unsure about units or accepted values. \
                 Calculators: compute_bmi, compute_daily_calories, compute_workout_calories, list_met_values. \
                 Profiles: get_profile, save_profile, get_profile_summary. \
                 Calorie log: log_daily_calories, get_calorie_history. \
                 Food: classify_food_image, lookup_nutrition, analyze_food_image, search_products. \
                 Validation errors list every invalid field at once."
                    .into(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::upstream::{NutritionFacts, Product, UpstreamError, UpstreamResult};

    struct Unconfigured;

    #[async_trait]
    impl FoodRecognizer for Unconfigured {
        async fn classify(&self, _image_base64: &str) -> UpstreamResult<String> {
            Err(UpstreamError::NotConfigured(crate::upstream::CLASSIFIER_SERVICE))
        }
    }

    #[async_trait]
    impl NutritionSource for Unconfigured {
        async fn lookup(&self, _food_name: &str, _grams: f64) -> UpstreamResult<NutritionFacts> {
            Err(UpstreamError::NotConfigured(crate::upstream::NUTRITION_SERVICE))
        }
    }

    #[async_trait]
    impl ProductCatalog for Unconfigured {
        async fn search(&self, _query: &str, _limit: u32) -> UpstreamResult<Vec<Product>> {
            Err(UpstreamError::NotConfigured(crate::upstream::CATALOG_SERVICE))
        }
    }

    fn service() -> FitpalService {
        let database = Database::in_memory().unwrap();
        database.with_conn(crate::db::migrations::run_migrations).unwrap();
        FitpalService::with_upstreams(
            PathBuf::from(":memory:"),
            database,
            MetTable::standard(),
            Arc::new(Unconfigured),
            Arc::new(Unconfigured),
            Arc::new(Unconfigured),
        )
    }

    fn text(result: &CallToolResult) -> String {
        result.content[0]
            .as_text()
            .map(|t| t.text.clone())
            .unwrap_or_default()
    }

    #[test]
    fn test_validation_is_a_tool_error() {
        let result = service()
            .compute_daily_calories(Parameters(ComputeDailyCaloriesParams {
                age: None,
                weight: Some(70.0),
                weight_unit: None,
                height: Some(175.0),
                height_unit: None,
                height_inches: None,
                gender: None,
                activity_level: Some("moderate".to_string()),
            }))
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let body: serde_json::Value = serde_json::from_str(&text(&result)).unwrap();
        assert!(body["fields"]["age"].is_object());
        assert!(body["fields"]["gender"].is_object());
    }

    #[test]
    fn test_workout_success() {
        let result = service()
            .compute_workout_calories(Parameters(ComputeWorkoutCaloriesParams {
                category: Some("Cardio".to_string()),
                intensity: Some("Moderate".to_string()),
                weight: Some(80.0),
                weight_unit: None,
                duration_minutes: Some(30.0),
            }))
            .unwrap();
        assert_ne!(result.is_error, Some(true));
        let body: serde_json::Value = serde_json::from_str(&text(&result)).unwrap();
        assert_eq!(body["calories_burned"], 240.0);
    }

    #[test]
    fn test_missing_profile() {
        let result = service()
            .get_profile(Parameters(UserParams {
                user_id: "ghost".to_string(),
            }))
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&text(&result)).unwrap();
        assert_eq!(body["error"], "Profile not found");
    }

    #[tokio::test]
    async fn test_unconfigured_upstream() {
        let result = service()
            .search_products(Parameters(SearchProductsParams {
                query: "oats".to_string(),
                limit: None,
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result).contains("not available"));
    }
}
