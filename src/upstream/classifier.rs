//! Food image classifier client
//!
//! Sends `{"inputs": <base64 image>}` to an image-classification inference
//! endpoint and keeps the top label.

use std::path::Path;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};

use super::{fetch_json, http_client, FoodRecognizer, UpstreamError, UpstreamResult, CLASSIFIER_SERVICE};
use crate::config::ClassifierConfig;

/// Largest image accepted for classification (decoded bytes)
pub const MAX_IMAGE_BYTES: usize = 8 * 1024 * 1024;

pub struct ImageClassifier {
    config: ClassifierConfig,
    client: reqwest::Client,
}

impl ImageClassifier {
    pub fn new(config: ClassifierConfig, timeout: std::time::Duration) -> Self {
        Self {
            config,
            client: http_client(timeout),
        }
    }
}

#[async_trait]
impl FoodRecognizer for ImageClassifier {
    async fn classify(&self, image_base64: &str) -> UpstreamResult<String> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or(UpstreamError::NotConfigured(CLASSIFIER_SERVICE))?;
        let payload = normalize_image_payload(image_base64)?;

        let request = self
            .client
            .post(&self.config.url)
            .bearer_auth(token)
            .json(&json!({ "inputs": payload }));

        let body = fetch_json(CLASSIFIER_SERVICE, request).await?;
        let label = parse_label(&body).ok_or_else(|| {
            tracing::warn!(response = %body, "Classifier response had no label");
            UpstreamError::EmptyResult(CLASSIFIER_SERVICE)
        })?;

        tracing::info!(label = %label, "Classified food image");
        Ok(label)
    }
}

/// Top label from a `[{"label": ..., "score": ...}, ...]` response
pub fn parse_label(body: &Value) -> Option<String> {
    body.get(0)?
        .get("label")?
        .as_str()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(String::from)
}

fn check_image_bytes(bytes: &[u8]) -> UpstreamResult<()> {
    if bytes.is_empty() {
        return Err(UpstreamError::InvalidInput("No image data provided".to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(UpstreamError::InvalidInput(format!(
            "Image is too large ({} bytes, limit {})",
            bytes.len(),
            MAX_IMAGE_BYTES
        )));
    }
    image::guess_format(bytes)
        .map(|_| ())
        .map_err(|_| UpstreamError::InvalidInput("Data is not a recognised image format".to_string()))
}

/// Accept plain base64 or a `data:image/...;base64,` URL and return the bare
/// base64 payload once it is known to decode to an image
pub fn normalize_image_payload(input: &str) -> UpstreamResult<String> {
    let trimmed = input.trim();
    let payload = match trimmed.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => trimmed,
    };

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| UpstreamError::InvalidInput("Image data is not valid base64".to_string()))?;
    check_image_bytes(&bytes)?;
    Ok(payload.to_string())
}

/// Read an image file and base64-encode it
pub fn encode_image_file(path: &Path) -> UpstreamResult<String> {
    let bytes = std::fs::read(path).map_err(|e| {
        UpstreamError::InvalidInput(format!("Could not read image file {}: {}", path.display(), e))
    })?;
    check_image_bytes(&bytes)?;
    Ok(STANDARD.encode(bytes))
}
