//! JSON Schema validation for the storefront documents.
//!
//! Schemas (Draft 7) are embedded at compile time from `schemas/`:
//! - `sitemap.schema.json`
//! - `aggregates.schema.json` (brand and category documents)
//! - `products.schema.json`
//!
//! Violations are reported, never fatal: the pipeline logs them as warnings.
//!
//! # Example
//!
//! ```rust,ignore
//! use serde_json::json;
//! use livora::validation::validate_sitemap;
//!
//! let sitemap = json!([{ "url": "/", "changefreq": "daily", "priority": "1.0" }]);
//! assert!(validate_sitemap(&sitemap).is_err()); // fewer than four entries
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::export::SiteDocuments;

static SITEMAP_SCHEMA: Lazy<Result<Value, String>> =
    Lazy::new(|| load(include_str!("../../schemas/sitemap.schema.json")));
static AGGREGATES_SCHEMA: Lazy<Result<Value, String>> =
    Lazy::new(|| load(include_str!("../../schemas/aggregates.schema.json")));
static PRODUCTS_SCHEMA: Lazy<Result<Value, String>> =
    Lazy::new(|| load(include_str!("../../schemas/products.schema.json")));

fn load(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("Invalid embedded schema: {}", e))
}

/// Validate `data` against `schema`.
///
/// # Returns
/// * `Ok(())` when valid
/// * `Err(Vec<String>)` with one message per violation
///
/// # Example
/// ```ignore
/// use serde_json::json;
/// use livora::validation::validate;
///
/// let schema = json!({ "type": "object", "required": ["name"] });
/// assert!(validate(&schema, &json!({ "name": "x" })).is_ok());
/// assert!(validate(&schema, &json!({})).is_err());
/// ```
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_embedded(schema: &Lazy<Result<Value, String>>, data: &Value) -> Result<(), Vec<String>> {
    match Lazy::force(schema) {
        Ok(schema) => validate(schema, data),
        Err(e) => Err(vec![e.clone()]),
    }
}

pub fn validate_sitemap(data: &Value) -> Result<(), Vec<String>> {
    validate_embedded(&SITEMAP_SCHEMA, data)
}

/// Brand or category document.
pub fn validate_aggregates(data: &Value) -> Result<(), Vec<String>> {
    validate_embedded(&AGGREGATES_SCHEMA, data)
}

pub fn validate_products(data: &Value) -> Result<(), Vec<String>> {
    validate_embedded(&PRODUCTS_SCHEMA, data)
}

/// Validate every schema-backed document in the set.
///
/// Returns `(document name, messages)` for each document with violations.
pub fn validate_documents(documents: &SiteDocuments) -> Vec<(String, Vec<String>)> {
    let checks: [(&str, fn(&Value) -> Result<(), Vec<String>>); 4] = [
        ("brands", validate_aggregates),
        ("categories", validate_aggregates),
        ("products", validate_products),
        ("sitemap", validate_sitemap),
    ];

    let mut failures = Vec::new();
    for (name, check) in checks {
        let result = match documents.document(name) {
            Ok(Some(value)) => check(&value),
            Ok(None) => Err(vec![format!("document '{}' is missing", name)]),
            Err(e) => Err(vec![e.to_string()]),
        };
        if let Err(errors) = result {
            failures.push((name.to_string(), errors));
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::export_json;
    use crate::models::Product;
    use crate::transform::{aggregate, build_sitemap};
    use serde_json::json;

    fn documents(products: Vec<Product>) -> SiteDocuments {
        let (brands, categories) = aggregate(&products, "Livora");
        let sitemap = build_sitemap(&brands, &categories);
        export_json(&products, &brands, &categories, &sitemap, "Livora")
    }

    #[test]
    fn test_embedded_schemas_parse() {
        assert!(SITEMAP_SCHEMA.is_ok());
        assert!(AGGREGATES_SCHEMA.is_ok());
        assert!(PRODUCTS_SCHEMA.is_ok());
    }

    #[test]
    fn test_generated_documents_are_valid() {
        let products = vec![
            Product { sku: "A1".into(), brand: "Acme".into(), category: "Skin".into(), ..Product::default() },
            Product { sku: "Z1".into(), brand: "L'Oréal Paris".into(), category: "Hair Care".into(), ..Product::default() },
        ];
        assert!(validate_documents(&documents(products)).is_empty());
    }

    #[test]
    fn test_empty_catalog_is_valid() {
        assert!(validate_documents(&documents(Vec::new())).is_empty());
    }

    #[test]
    fn test_sitemap_rejects_numeric_priority() {
        let sitemap = json!([
            { "url": "/", "changefreq": "daily", "priority": 1.0 },
            { "url": "/products", "changefreq": "daily", "priority": "0.9" },
            { "url": "/brands", "changefreq": "weekly", "priority": "0.8" },
            { "url": "/categories", "changefreq": "weekly", "priority": "0.8" }
        ]);
        let errors = validate_sitemap(&sitemap).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_products_document_requires_wrapper() {
        assert!(validate_products(&json!([])).is_err());
        assert!(validate_products(&json!({ "products": [] })).is_ok());
    }

    #[test]
    fn test_aggregate_page_requires_fields() {
        let doc = json!({ "Acme": { "name": "Acme" } });
        let errors = validate_aggregates(&doc).unwrap_err();
        assert!(!errors.is_empty());
    }
}
