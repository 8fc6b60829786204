//! Gemini text generator.
//!
//! Single-turn `generateContent` calls against Google's Generative
//! Language API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::InsightsConfig;
use crate::error::{InsightError, InsightResult};
use crate::generator::TextGenerator;

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini-backed [`TextGenerator`].
pub struct GeminiTextGenerator {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiTextGenerator {
    /// Builds a generator. Fails with `NotConfigured` without an API key.
    pub fn new(config: &InsightsConfig) -> InsightResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| InsightError::NotConfigured("missing GEMINI_API_KEY".to_string()))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| InsightError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(GeminiTextGenerator {
            api_key,
            model: config.model.clone(),
            base_url: GEMINI_API_BASE.to_string(),
            client,
        })
    }

    /// Points the generator at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }
}

#[async_trait]
impl TextGenerator for GeminiTextGenerator {
    async fn generate(&self, prompt: &str) -> InsightResult<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "Sending request to Gemini API");

        let response = self
            .client
            .post(self.api_url("generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(InsightError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(InsightError::Api(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| InsightError::Api(format!("Failed to parse response: {}", e)))?;

        body.text().ok_or(InsightError::EmptyResponse)
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, joined. `None` when blank.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> InsightsConfig {
        InsightsConfig {
            api_key: Some("k".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_requires_api_key() {
        assert!(matches!(
            GeminiTextGenerator::new(&InsightsConfig::default()),
            Err(InsightError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_api_url() {
        let generator = GeminiTextGenerator::new(&configured())
            .unwrap()
            .with_base_url("http://localhost:9/v1beta/");
        assert_eq!(
            generator.api_url("generateContent"),
            "http://localhost:9/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn test_request_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some("hola".to_string()),
                }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hola");
        assert_eq!(json["contents"][0]["role"], "user");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Stock "},{"text":"ok"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(body.text().as_deref(), Some("Stock ok"));

        let empty: GenerateContentResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.text().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_offline() {
        let generator = GeminiTextGenerator::new(&configured())
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        let err = generator.generate("x").await.unwrap_err();
        assert!(err.is_offline());
    }
}
