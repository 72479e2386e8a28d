//! Upstream HTTP services
//!
//! Thin pass-through clients for the food image classifier, the nutrition
//! database and the product catalog. Failures are logged in full and surfaced
//! to callers as a short generic message. Nothing is retried.

pub mod catalog;
pub mod classifier;
pub mod nutrition;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use catalog::{CatalogClient, Product, DEFAULT_PRODUCT_LIMIT, MAX_PRODUCT_LIMIT};
pub use classifier::{encode_image_file, normalize_image_payload, ImageClassifier};
pub use nutrition::{NutritionClient, NutritionFacts, DEFAULT_SERVING_GRAMS};

pub const CLASSIFIER_SERVICE: &str = "Image classifier";
pub const NUTRITION_SERVICE: &str = "Nutrition lookup";
pub const CATALOG_SERVICE: &str = "Product search";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("{service} request failed: {reason}")]
    Unavailable { service: &'static str, reason: String },

    #[error("{0} returned no result")]
    EmptyResult(&'static str),

    #[error("{0}")]
    InvalidInput(String),
}

impl UpstreamError {
    /// Message safe to show to an end user
    pub fn user_message(&self) -> String {
        match self {
            UpstreamError::NotConfigured(service) => {
                format!("{} is not available on this server", service)
            }
            UpstreamError::Unavailable { service, .. } => {
                format!("{} is currently unavailable, please try again later", service)
            }
            UpstreamError::EmptyResult(service) => format!("{} found no result", service),
            UpstreamError::InvalidInput(reason) => reason.clone(),
        }
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

#[async_trait]
pub trait FoodRecognizer: Send + Sync {
    /// Best label for a base64-encoded image
    async fn classify(&self, image_base64: &str) -> UpstreamResult<String>;
}

#[async_trait]
pub trait NutritionSource: Send + Sync {
    async fn lookup(&self, food_name: &str, grams: f64) -> UpstreamResult<NutritionFacts>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> UpstreamResult<Vec<Product>>;
}

/// Result of classifying a photo and looking up the recognised food
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodAnalysis {
    pub label: String,
    pub food_query: String,
    pub nutrition: NutritionFacts,
}

/// Labels such as "pizza, pizza pie" are reduced to their first name
pub fn food_query_from_label(label: &str) -> String {
    label.split(',').next().unwrap_or(label).trim().to_string()
}

/// Classify an image and look up nutrition for whatever it shows
pub async fn analyze_food_image<R, N>(
    recognizer: &R,
    nutrition: &N,
    image_base64: &str,
    grams: f64,
) -> UpstreamResult<FoodAnalysis>
where
    R: FoodRecognizer + ?Sized,
    N: NutritionSource + ?Sized,
{
    let label = recognizer.classify(image_base64).await?;
    let food_query = food_query_from_label(&label);
    let nutrition = nutrition.lookup(&food_query, grams).await?;
    Ok(FoodAnalysis { label, food_query, nutrition })
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not build HTTP client with timeout, using defaults");
            reqwest::Client::new()
        })
}

fn unavailable(service: &'static str, err: impl fmt::Display) -> UpstreamError {
    tracing::warn!(service, error = %err, "Upstream request failed");
    UpstreamError::Unavailable {
        service,
        reason: err.to_string(),
    }
}

/// Send a request and decode a JSON body from a successful response
pub(crate) async fn fetch_json(
    service: &'static str,
    request: reqwest::RequestBuilder,
) -> UpstreamResult<Value> {
    let response = request.send().await.map_err(|e| unavailable(service, e))?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(service, status = status.as_u16(), body = %body, "Upstream returned an error status");
        return Err(UpstreamError::Unavailable {
            service,
            reason: format!("HTTP {}", status),
        });
    }

    response.json::<Value>().await.map_err(|e| unavailable(service, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLabel(&'static str);

    #[async_trait]
    impl FoodRecognizer for FixedLabel {
        async fn classify(&self, _image_base64: &str) -> UpstreamResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct Offline;

    #[async_trait]
    impl FoodRecognizer for Offline {
        async fn classify(&self, _image_base64: &str) -> UpstreamResult<String> {
            Err(UpstreamError::Unavailable {
                service: CLASSIFIER_SERVICE,
                reason: "connection refused".to_string(),
            })
        }
    }

    /// Echoes the query back with 1 kcal per gram
    struct PerGram;

    #[async_trait]
    impl NutritionSource for PerGram {
        async fn lookup(&self, food_name: &str, grams: f64) -> UpstreamResult<NutritionFacts> {
            Ok(NutritionFacts {
                food_name: food_name.to_string(),
                serving_weight_grams: Some(grams),
                calories: grams,
                protein: 0.0,
                fat: 0.0,
                carbohydrate: 0.0,
            })
        }
    }

    #[test]
    fn test_food_query_from_label() {
        assert_eq!(food_query_from_label("pizza, pizza pie"), "pizza");
        assert_eq!(food_query_from_label("banana"), "banana");
        assert_eq!(food_query_from_label("  hotdog , hot dog"), "hotdog");
    }

    #[test]
    fn test_user_messages_hide_details() {
        let err = UpstreamError::Unavailable {
            service: NUTRITION_SERVICE,
            reason: "HTTP 401 Unauthorized".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "Nutrition lookup is currently unavailable, please try again later"
        );
        assert!(!err.user_message().contains("401"));
        assert_eq!(
            UpstreamError::NotConfigured(CATALOG_SERVICE).user_message(),
            "Product search is not available on this server"
        );
    }

    #[tokio::test]
    async fn test_analyze_food_image() {
        let analysis = analyze_food_image(&FixedLabel("pizza, pizza pie"), &PerGram, "aGk=", 150.0)
            .await
            .unwrap();
        assert_eq!(analysis.label, "pizza, pizza pie");
        assert_eq!(analysis.food_query, "pizza");
        assert_eq!(analysis.nutrition.calories, 150.0);
    }

    #[tokio::test]
    async fn test_analyze_food_image_propagates_failure() {
        let err = analyze_food_image(&Offline, &PerGram, "aGk=", 100.0).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Unavailable { .. }));
    }
}
