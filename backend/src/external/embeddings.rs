//! Embedding client
//!
//! Fetches text embeddings from an OpenAI-compatible embeddings API. Items
//! and search queries are embedded with the same model so vector distances
//! are comparable.

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};

/// Client for an OpenAI-compatible embeddings API
#[derive(Clone)]
pub struct EmbeddingClient {
    endpoint: String,
    api_key: String,
    model: String,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    /// Create a new embedding client
    pub fn new(endpoint: String, api_key: String, model: String) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            api_key,
            model,
            http_client,
        }
    }

    /// Embed a single text. Returns a 1536-dimension vector.
    pub async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}/embeddings", self.endpoint.trim_end_matches('/'));
        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": self.model,
                "input": text,
            }))
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "Embedding API error: {} - {}",
                status, body
            )));
        }

        let data: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to parse embedding response: {}", e))
        })?;

        data.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                AppError::ExternalService("Embedding API returned no data".to_string())
            })
    }

    /// Embed text, swallowing failures. Embeddings are an enrichment, so a
    /// provider outage must never block an item write.
    pub async fn embed_or_none(&self, text: &str) -> Option<Vec<f32>> {
        match self.embed(text).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                tracing::warn!("Embedding generation failed, continuing without: {}", e);
                None
            }
        }
    }
}
