//! Nutrition database client
//!
//! Natural-language nutrient lookup: the query "150 grams banana" returns the
//! macros for that serving.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{fetch_json, http_client, NutritionSource, UpstreamError, UpstreamResult, NUTRITION_SERVICE};
use crate::config::NutritionConfig;

/// Grams assumed when a lookup does not give a serving size
pub const DEFAULT_SERVING_GRAMS: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    pub food_name: String,
    pub serving_weight_grams: Option<f64>,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrate: f64,
}

pub struct NutritionClient {
    config: NutritionConfig,
    client: reqwest::Client,
}

impl NutritionClient {
    pub fn new(config: NutritionConfig, timeout: std::time::Duration) -> Self {
        Self {
            config,
            client: http_client(timeout),
        }
    }
}

/// The query string sent upstream, after checking the inputs
pub fn nutrition_query(food_name: &str, grams: f64) -> UpstreamResult<String> {
    let food_name = food_name.trim();
    if food_name.is_empty() {
        return Err(UpstreamError::InvalidInput("Food name is required".to_string()));
    }
    if !grams.is_finite() || grams <= 0.0 {
        return Err(UpstreamError::InvalidInput(
            "Grams must be a positive number".to_string(),
        ));
    }
    Ok(format!("{} grams {}", grams, food_name))
}

fn number(food: &Value, key: &str) -> f64 {
    food.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// First entry of a `{"foods": [...]}` response
pub fn parse_nutrition(body: &Value) -> Option<NutritionFacts> {
    let food = body.get("foods")?.get(0)?;
    Some(NutritionFacts {
        food_name: food.get("food_name")?.as_str()?.to_string(),
        serving_weight_grams: food.get("serving_weight_grams").and_then(Value::as_f64),
        calories: number(food, "nf_calories"),
        protein: number(food, "nf_protein"),
        fat: number(food, "nf_total_fat"),
        carbohydrate: number(food, "nf_total_carbohydrate"),
    })
}

#[async_trait]
impl NutritionSource for NutritionClient {
    async fn lookup(&self, food_name: &str, grams: f64) -> UpstreamResult<NutritionFacts> {
        let (app_id, app_key) = match (&self.config.app_id, &self.config.app_key) {
            (Some(id), Some(key)) => (id, key),
            _ => return Err(UpstreamError::NotConfigured(NUTRITION_SERVICE)),
        };
        let query = nutrition_query(food_name, grams)?;

        let request = self
            .client
            .post(&self.config.url)
            .header("x-app-id", app_id)
            .header("x-app-key", app_key)
            .json(&json!({ "query": query }));

        let body = fetch_json(NUTRITION_SERVICE, request).await?;
        let facts = parse_nutrition(&body).ok_or_else(|| {
            tracing::warn!(query = %query, "Nutrition lookup matched no food");
            UpstreamError::EmptyResult(NUTRITION_SERVICE)
        })?;

        tracing::info!(query = %query, calories = facts.calories, "Nutrition lookup");
        Ok(facts)
    }
}
