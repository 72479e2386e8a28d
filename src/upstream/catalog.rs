//! Grocery product catalog client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{fetch_json, http_client, ProductCatalog, UpstreamError, UpstreamResult, CATALOG_SERVICE};
use crate::config::CatalogConfig;

pub const DEFAULT_PRODUCT_LIMIT: u32 = 5;
pub const MAX_PRODUCT_LIMIT: u32 = 25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    /// Product type as reported by the catalog, when present
    pub category: Option<String>,
}

pub struct CatalogClient {
    config: CatalogConfig,
    client: reqwest::Client,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig, timeout: std::time::Duration) -> Self {
        Self {
            config,
            client: http_client(timeout),
        }
    }
}

pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(DEFAULT_PRODUCT_LIMIT)
        .clamp(1, MAX_PRODUCT_LIMIT)
}

fn parse_product(item: &Value) -> Option<Product> {
    let text = |key: &str| {
        item.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    Some(Product {
        id: item.get("id")?.as_i64()?,
        title: text("title")?,
        image: text("image"),
        category: text("aisle").or_else(|| text("type")),
    })
}

/// Products from a `{"products": [...]}` response; malformed items are skipped
pub fn parse_products(body: &Value) -> Vec<Product> {
    body.get("products")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_product).collect())
        .unwrap_or_default()
}

#[async_trait]
impl ProductCatalog for CatalogClient {
    async fn search(&self, query: &str, limit: u32) -> UpstreamResult<Vec<Product>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured(CATALOG_SERVICE))?;
        let query = query.trim();
        if query.is_empty() {
            return Err(UpstreamError::InvalidInput("Search query is required".to_string()));
        }
        let limit = clamp_limit(Some(limit));

        let request = self.client.get(&self.config.url).query(&[
            ("query", query.to_string()),
            ("number", limit.to_string()),
            ("apiKey", api_key.to_string()),
        ]);

        let body = fetch_json(CATALOG_SERVICE, request).await?;
        let products = parse_products(&body);
        tracing::info!(query = %query, count = products.len(), "Product search");
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_PRODUCT_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10)), 10);
        assert_eq!(clamp_limit(Some(500)), MAX_PRODUCT_LIMIT);
    }

    #[test]
    fn test_parse_products() {
        let body = json!({
            "type": "product",
            "products": [
                {"id": 192386, "title": "Pizza Buddy: Frozen Pizza Dough", "image": "https://img/192386.jpg", "aisle": "Frozen"},
                {"id": 27693, "title": "Greek Yogurt", "image": ""},
                {"title": "no id, skipped"}
            ],
            "totalProducts": 3
        });
        let products = parse_products(&body);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].id, 192386);
        assert_eq!(products[0].category.as_deref(), Some("Frozen"));
        assert_eq!(products[1].image, None);
        assert_eq!(products[1].category, None);
    }

    #[test]
    fn test_parse_products_empty() {
        assert!(parse_products(&json!({"products": []})).is_empty());
        assert!(parse_products(&json!({"status": "failure"})).is_empty());
    }

    #[tokio::test]
    async fn test_search_without_key() {
        let client = CatalogClient::new(
            CatalogConfig {
                url: "http://127.0.0.1:9/".to_string(),
                api_key: None,
            },
            std::time::Duration::from_secs(1),
        );
        let err = client.search("yogurt", 5).await.unwrap_err();
        assert!(matches!(err, UpstreamError::NotConfigured(_)));
    }
}
