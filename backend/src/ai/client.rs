//! Anthropic API client and the AI-backed enricher.

use async_trait::async_trait;
use serde::Deserialize;
use std::env;
use tracing::{debug, warn};

use super::{prompt, Enricher, TemplateEnricher};
use crate::config::{AiConfig, CatalogConfig};
use crate::error::{EnrichError, EnrichResult};
use crate::models::{Product, SeoContent};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Default number of retries
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// Anthropic API client
#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
}

/// Anthropic API response structure
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

/// Anthropic API error response
#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl AiClient {
    /// Create a new client with explicit API key
    pub fn new(api_key: String) -> Self {
        let defaults = AiConfig::default();
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: defaults.model,
            max_tokens: defaults.max_tokens,
        }
    }

    /// Create a client from environment variable ANTHROPIC_API_KEY
    pub fn from_env() -> EnrichResult<Self> {
        let _ = dotenvy::dotenv();

        let api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| EnrichError::MissingApiKey)?;
        if api_key.trim().is_empty() {
            return Err(EnrichError::MissingApiKey);
        }

        Ok(Self::new(api_key))
    }

    /// Client from the environment with model settings from `config`.
    pub fn from_config(config: &AiConfig) -> EnrichResult<Self> {
        Ok(Self::from_env()?
            .with_model(&config.model)
            .with_max_tokens(config.max_tokens))
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one conversation, retrying transient failures.
    pub async fn complete(&self, system: &str, messages: &serde_json::Value) -> EnrichResult<String> {
        let mut last_error = None;

        for attempt in 1..=DEFAULT_MAX_RETRIES {
            match self.call_api(system, messages).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(attempt, max = DEFAULT_MAX_RETRIES, error = %e, "AI request failed");
                    last_error = Some(e);

                    if attempt < DEFAULT_MAX_RETRIES {
                        tokio::time::sleep(tokio::time::Duration::from_millis(RETRY_DELAY_MS)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| EnrichError::Api("Unknown error".to_string())))
    }

    async fn call_api(&self, system: &str, messages: &serde_json::Value) -> EnrichResult<String> {
        debug!(model = %self.model, max_tokens = self.max_tokens, "calling Anthropic API");

        let request_body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system,
            "messages": messages
        });

        let response = self
            .http
            .post(API_URL)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| EnrichError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EnrichError::Http(e.to_string()))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<AnthropicError>(&body) {
                return Err(EnrichError::Api(error.error.message));
            }
            return Err(EnrichError::Api(format!("HTTP {}: {}", status, body)));
        }

        let text = response_text(&body)?;
        debug!(bytes = text.len(), "received AI response");
        Ok(text)
    }
}

/// Concatenated text blocks of a messages response.
fn response_text(body: &str) -> EnrichResult<String> {
    let response: AnthropicResponse =
        serde_json::from_str(body).map_err(|e| EnrichError::InvalidResponse(e.to_string()))?;

    let text = response
        .content
        .iter()
        .filter(|c| c.content_type == "text")
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("");

    let cleaned = clean_description(&text);
    if cleaned.is_empty() {
        return Err(EnrichError::InvalidResponse("Empty response".to_string()));
    }
    Ok(cleaned)
}

/// Strip code fences and wrapping quotes the model sometimes adds.
fn clean_description(text: &str) -> String {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        let rest = rest.find('\n').map(|i| &rest[i + 1..]).unwrap_or(rest);
        body = rest.trim_end().strip_suffix("```").unwrap_or(rest).trim();
    }

    body.trim_matches('"').trim().to_string()
}

/// Enricher that rewrites descriptions with the AI client and builds SEO
/// content and image URLs from templates.
#[derive(Clone)]
pub struct AiEnricher {
    client: AiClient,
    system: String,
    templates: TemplateEnricher,
}

impl AiEnricher {
    pub fn new(client: AiClient, config: &CatalogConfig) -> Self {
        Self {
            client,
            system: prompt::system_prompt(&config.store_name),
            templates: TemplateEnricher::new(config),
        }
    }

    /// Client from `ANTHROPIC_API_KEY` and the `ai` section of `config`.
    pub fn from_config(config: &CatalogConfig) -> EnrichResult<Self> {
        Ok(Self::new(AiClient::from_config(&config.ai)?, config))
    }
}

#[async_trait]
impl Enricher for AiEnricher {
    fn name(&self) -> &str {
        "ai"
    }

    async fn enhance_description(&self, product: &Product) -> EnrichResult<String> {
        let messages = prompt::build_messages(product);
        self.client.complete(&self.system, &messages).await
    }

    async fn seo_content(&self, product: &Product) -> EnrichResult<SeoContent> {
        Ok(self.templates.seo_for(product))
    }

    async fn image_urls(&self, product: &Product) -> EnrichResult<Vec<String>> {
        self.templates.images_for(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_joins_text_blocks() {
        let body = r#"{"content":[{"type":"text","text":"Soft "},{"type":"tool_use"},{"type":"text","text":"cream."}]}"#;
        assert_eq!(response_text(body).unwrap(), "Soft cream.");
    }

    #[test]
    fn test_response_text_empty_is_error() {
        let body = r#"{"content":[{"type":"text","text":"   "}]}"#;
        assert!(matches!(response_text(body), Err(EnrichError::InvalidResponse(_))));
    }

    #[test]
    fn test_response_text_invalid_json() {
        assert!(matches!(response_text("not json"), Err(EnrichError::InvalidResponse(_))));
    }

    #[test]
    fn test_clean_description_strips_fences_and_quotes() {
        assert_eq!(clean_description("```text\nA rich cream.\n```"), "A rich cream.");
        assert_eq!(clean_description("\"A rich cream.\""), "A rich cream.");
        assert_eq!(clean_description("  plain  "), "plain");
    }

    #[test]
    fn test_builder_overrides_model() {
        let client = AiClient::new("key".into()).with_model("claude-test").with_max_tokens(10);
        assert_eq!(client.model(), "claude-test");
        assert_eq!(client.max_tokens, 10);
    }
}
