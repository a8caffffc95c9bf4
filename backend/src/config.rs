//! Run configuration.
//!
//! A [`CatalogConfig`] value is built once by the caller and passed by
//! reference into every entry point. Every field has a default, so a config
//! file only needs the keys it overrides.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::PipelineError;

/// Complete configuration for one pipeline run or server instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory for exported tables and the `json/` document set.
    pub output_dir: PathBuf,
    /// Maximum number of products enriched concurrently.
    pub max_products_per_batch: usize,
    /// Attach generated image URLs during enrichment.
    pub enable_image_generation: bool,
    /// Attach generated SEO content during enrichment.
    pub enable_seo_generation: bool,
    /// Store name used in page titles and aggregate metadata.
    pub store_name: String,
    /// ISO currency code for structured offer data.
    pub currency: String,
    /// Image URL pattern; `{sku}` is replaced with the product SKU.
    pub image_url_template: String,
    /// Source column names.
    pub columns: ColumnMap,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// AI collaborator settings.
    pub ai: AiConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            max_products_per_batch: 10,
            enable_image_generation: true,
            enable_seo_generation: true,
            store_name: "Livora".to_string(),
            currency: "IRR".to_string(),
            image_url_template: "https://example.com/images/{sku}.jpg".to_string(),
            columns: ColumnMap::default(),
            server: ServerConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

/// Names of the input columns the record parser reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ColumnMap {
    pub id: String,
    pub name: String,
    /// Brand metadata column, consulted before [`ColumnMap::brand`].
    pub brand_meta: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub description: String,
    pub sku: String,
    pub skin_types: String,
    pub ingredients: String,
    pub usage: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            id: "ID".to_string(),
            name: "Name".to_string(),
            brand_meta: "Meta: _livora_brand_name".to_string(),
            brand: "Brand".to_string(),
            category: "Categories".to_string(),
            price: "Regular price".to_string(),
            description: "Description".to_string(),
            sku: "SKU".to_string(),
            skin_types: "Meta: _livora_skin_type".to_string(),
            ingredients: "Meta: ingredients".to_string(),
            usage: "Meta: usage_instructions".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AiConfig {
    pub model: String,
    pub max_tokens: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
        }
    }
}

impl CatalogConfig {
    /// Load configuration: defaults, then the JSON file (if given and
    /// present), then `LIVORA_OUTPUT_DIR` / `LIVORA_PORT` overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let mut config = match path {
            Some(p) if p.exists() => Self::from_file(p)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, PipelineError> {
        serde_json::from_str(json).map_err(|e| PipelineError::Config(e.to_string()))
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = env::var("LIVORA_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
        if let Some(port) = env::var("LIVORA_PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    /// Directory holding the JSON document set.
    pub fn json_dir(&self) -> PathBuf {
        self.output_dir.join("json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_column_names() {
        let config = CatalogConfig::default();
        assert_eq!(config.columns.brand_meta, "Meta: _livora_brand_name");
        assert_eq!(config.columns.price, "Regular price");
        assert_eq!(config.max_products_per_batch, 10);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CatalogConfig::from_json(
            r#"{ "store_name": "Rose", "columns": { "brand": "Marque" } }"#,
        )
        .unwrap();

        assert_eq!(config.store_name, "Rose");
        assert_eq!(config.columns.brand, "Marque");
        assert_eq!(config.columns.category, "Categories");
        assert!(config.enable_seo_generation);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let err = CatalogConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "max_products_per_batch": 3 }"#).unwrap();

        let config = CatalogConfig::from_file(&path).unwrap();
        assert_eq!(config.max_products_per_batch, 3);
        assert_eq!(config.json_dir(), PathBuf::from("output").join("json"));
    }
}
