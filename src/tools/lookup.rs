//! Food Lookup MCP Tools
//!
//! Image classification, nutrition lookup and product search, all forwarded
//! to upstream services.

use std::path::Path;

use serde::Serialize;

use crate::upstream::catalog::clamp_limit;
use crate::upstream::{
    encode_image_file, food_query_from_label, normalize_image_payload, FoodAnalysis,
    FoodRecognizer, NutritionFacts, NutritionSource, Product, ProductCatalog,
    DEFAULT_SERVING_GRAMS,
};

use super::{ToolError, ToolResult};

/// Response for classify_food_image
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub label: String,
    /// Name to pass to lookup_nutrition
    pub food_query: String,
}

/// Response for search_products
#[derive(Debug, Serialize)]
pub struct ProductSearchResponse {
    pub query: String,
    pub count: usize,
    pub products: Vec<Product>,
}

/// Base64 image data from either inline data or a file on disk
pub fn resolve_image(image_base64: Option<&str>, file_path: Option<&str>) -> ToolResult<String> {
    let inline = image_base64.filter(|s| !s.trim().is_empty());
    let path = file_path.map(str::trim).filter(|s| !s.is_empty());

    match (inline, path) {
        (Some(data), None) => Ok(normalize_image_payload(data)?),
        (None, Some(path)) => Ok(encode_image_file(Path::new(path))?),
        (Some(_), Some(_)) => Err(ToolError::rejected(
            "invalid_input",
            "Provide either image_base64 or file_path, not both",
        )),
        (None, None) => Err(ToolError::rejected(
            "invalid_input",
            "An image is required: pass image_base64 or file_path",
        )),
    }
}

pub async fn classify_food_image(
    recognizer: &dyn FoodRecognizer,
    image_base64: &str,
) -> ToolResult<ClassifyResponse> {
    let label = recognizer.classify(image_base64).await?;
    Ok(ClassifyResponse {
        food_query: food_query_from_label(&label),
        label,
    })
}

pub async fn lookup_nutrition(
    source: &dyn NutritionSource,
    food_name: &str,
    grams: Option<f64>,
) -> ToolResult<NutritionFacts> {
    let grams = grams.unwrap_or(DEFAULT_SERVING_GRAMS);
    Ok(source.lookup(food_name, grams).await?)
}

pub async fn analyze_food_image(
    recognizer: &dyn FoodRecognizer,
    source: &dyn NutritionSource,
    image_base64: &str,
    grams: Option<f64>,
) -> ToolResult<FoodAnalysis> {
    let grams = grams.unwrap_or(DEFAULT_SERVING_GRAMS);
    Ok(crate::upstream::analyze_food_image(recognizer, source, image_base64, grams).await?)
}

pub async fn search_products(
    catalog: &dyn ProductCatalog,
    query: &str,
    limit: Option<u32>,
) -> ToolResult<ProductSearchResponse> {
    let products = catalog.search(query, clamp_limit(limit)).await?;
    Ok(ProductSearchResponse {
        query: query.trim().to_string(),
        count: products.len(),
        products,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    use crate::upstream::{UpstreamError, UpstreamResult, CATALOG_SERVICE};

    struct Hotdog;

    #[async_trait]
    impl FoodRecognizer for Hotdog {
        async fn classify(&self, _image_base64: &str) -> UpstreamResult<String> {
            Ok("hotdog, hot dog, red hot".to_string())
        }
    }

    struct Table;

    #[async_trait]
    impl NutritionSource for Table {
        async fn lookup(&self, food_name: &str, grams: f64) -> UpstreamResult<NutritionFacts> {
            Ok(NutritionFacts {
                food_name: food_name.to_string(),
                serving_weight_grams: Some(grams),
                calories: 2.9 * grams,
                protein: 0.1 * grams,
                fat: 0.26 * grams,
                carbohydrate: 0.02 * grams,
            })
        }
    }

    /// Returns as many products as asked for
    struct Shelf;

    #[async_trait]
    impl ProductCatalog for Shelf {
        async fn search(&self, query: &str, limit: u32) -> UpstreamResult<Vec<Product>> {
            Ok((0..limit)
                .map(|i| Product {
                    id: i64::from(i),
                    title: format!("{} {}", query, i),
                    image: None,
                    category: None,
                })
                .collect())
        }
    }

    struct Down;

    #[async_trait]
    impl ProductCatalog for Down {
        async fn search(&self, _query: &str, _limit: u32) -> UpstreamResult<Vec<Product>> {
            Err(UpstreamError::Unavailable {
                service: CATALOG_SERVICE,
                reason: "timed out".to_string(),
            })
        }
    }

    #[test]
    fn test_resolve_image() {
        let gif = STANDARD.encode(b"GIF89a\x01\x00\x01\x00");
        assert_eq!(resolve_image(Some(gif.as_str()), None).unwrap(), gif);
        assert!(matches!(resolve_image(None, None), Err(ToolError::Rejected(_))));
        assert!(matches!(
            resolve_image(Some(gif.as_str()), Some("/tmp/x.png")),
            Err(ToolError::Rejected(_))
        ));
        assert!(matches!(
            resolve_image(None, Some("/no/such/file.jpg")),
            Err(ToolError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_classify_and_lookup() {
        let classified = classify_food_image(&Hotdog, "aGk=").await.unwrap();
        assert_eq!(classified.food_query, "hotdog");

        let facts = lookup_nutrition(&Table, "hotdog", None).await.unwrap();
        assert_eq!(facts.serving_weight_grams, Some(DEFAULT_SERVING_GRAMS));
        assert!((facts.calories - 290.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_analyze() {
        let analysis = analyze_food_image(&Hotdog, &Table, "aGk=", Some(50.0)).await.unwrap();
        assert_eq!(analysis.food_query, "hotdog");
        assert!((analysis.nutrition.calories - 145.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_search_products_limits() {
        assert_eq!(search_products(&Shelf, "yogurt", None).await.unwrap().count, 5);
        assert_eq!(search_products(&Shelf, "yogurt", Some(100)).await.unwrap().count, 25);
        assert!(matches!(
            search_products(&Down, "yogurt", None).await,
            Err(ToolError::Rejected(_))
        ));
    }
}
