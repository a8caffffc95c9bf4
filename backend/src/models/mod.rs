//! Domain models for the catalog pipeline.
//!
//! - [`Product`] - canonical catalog entry, built once per input row
//! - [`Enrichment`] - optional fields attached by a collaborator
//! - [`SeoContent`] / [`SchemaMarkup`] - SEO block with schema.org offer data
//! - [`Aggregate`] / [`AggregateMap`] - brand and category groupings
//! - [`SitemapEntry`] - one storefront URL with crawl hints
//! - [`ExportSchema`] - flat-table column layout selector

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{EnrichError, ExportError};

/// Brand/category value used when no source column provides one.
pub const UNKNOWN: &str = "Unknown";

/// Characters kept by [`Product::short_description`].
pub const SHORT_DESCRIPTION_CHARS: usize = 200;

// =============================================================================
// Product
// =============================================================================

/// A canonical catalog entry.
///
/// Core fields are fixed at parse time. The three enrichment fields stay
/// `None` until [`Product::attach_enrichment`] sets them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    /// Coerced like a CSV cell: strings accepted, negative or non-numeric is `0`.
    #[serde(deserialize_with = "deserialize_price")]
    pub price: f64,
    pub description: String,
    pub sku: String,
    pub skin_types: Vec<String>,
    pub ingredients: Vec<String>,
    pub usage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seo_content: Option<SeoContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced_description: Option<String>,
}

impl Default for Product {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            brand: UNKNOWN.to_string(),
            category: UNKNOWN.to_string(),
            price: 0.0,
            description: String::new(),
            sku: String::new(),
            skin_types: Vec::new(),
            ingredients: Vec::new(),
            usage: String::new(),
            image_urls: None,
            seo_content: None,
            enhanced_description: None,
        }
    }
}

fn deserialize_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(crate::parser::parse_price(raw.as_ref()))
}

impl Product {
    /// True once any enrichment field has been set.
    pub fn is_enriched(&self) -> bool {
        self.image_urls.is_some() || self.seo_content.is_some() || self.enhanced_description.is_some()
    }

    /// Attach enrichment. Allowed once; core fields are never touched.
    pub fn attach_enrichment(&mut self, enrichment: Enrichment) -> Result<(), EnrichError> {
        if self.is_enriched() {
            return Err(EnrichError::AlreadyEnriched(self.label()));
        }
        self.enhanced_description = enrichment.enhanced_description;
        self.seo_content = enrichment.seo_content;
        self.image_urls = enrichment.image_urls;
        Ok(())
    }

    /// First 200 characters of the original description.
    pub fn short_description(&self) -> String {
        self.description.chars().take(SHORT_DESCRIPTION_CHARS).collect()
    }

    /// Enhanced description when present, else the original.
    pub fn display_description(&self) -> &str {
        self.enhanced_description.as_deref().unwrap_or(&self.description)
    }

    pub fn first_image(&self) -> Option<&str> {
        self.image_urls.as_ref().and_then(|urls| urls.first()).map(String::as_str)
    }

    /// Image URLs joined with `;`, empty when none are attached.
    pub fn joined_images(&self) -> String {
        self.image_urls.as_ref().map(|urls| urls.join(";")).unwrap_or_default()
    }

    /// Short identifier for log lines: SKU, else ID, else name.
    pub fn label(&self) -> String {
        [&self.sku, &self.id, &self.name]
            .into_iter()
            .find(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

// =============================================================================
// Enrichment
// =============================================================================

/// Optional fields produced by an enrichment collaborator for one product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Enrichment {
    pub enhanced_description: Option<String>,
    pub seo_content: Option<SeoContent>,
    pub image_urls: Option<Vec<String>>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        self.enhanced_description.is_none() && self.seo_content.is_none() && self.image_urls.is_none()
    }
}

/// SEO block for one product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeoContent {
    pub meta_title: String,
    pub meta_description: String,
    /// Comma-joined keyword list.
    pub keywords: String,
    pub schema_markup: SchemaMarkup,
}

impl SeoContent {
    pub fn keyword_list(&self) -> Vec<String> {
        self.keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(String::from)
            .collect()
    }

    /// First keyword, used as the commerce "focus keyword".
    pub fn focus_keyword(&self) -> &str {
        self.keywords.split(',').next().unwrap_or("").trim()
    }
}

/// schema.org `Product` structured data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchemaMarkup {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "@type")]
    pub kind: String,
    pub name: String,
    pub brand: BrandMarkup,
    pub category: String,
    pub offers: OfferMarkup,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrandMarkup {
    #[serde(rename = "@type")]
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfferMarkup {
    #[serde(rename = "@type")]
    pub kind: String,
    pub price: String,
    pub price_currency: String,
    pub availability: String,
}

// =============================================================================
// Aggregates
// =============================================================================

/// Which product field an [`AggregateMap`] is keyed by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AggregateKind {
    Brand,
    Category,
}

impl AggregateKind {
    /// URL path segment used by the sitemap.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Category => "category",
        }
    }
}

/// Templated page metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateMeta {
    pub title: String,
    pub description: String,
    pub keywords: String,
}

/// A grouping of products sharing a brand or category value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Aggregate {
    pub name: String,
    pub slug: String,
    /// Indices into the product list this map was built from, in
    /// first-seen order.
    pub products: Vec<usize>,
    pub description: String,
    pub meta: AggregateMeta,
    /// Distinct category names of member products (brand aggregates only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

impl Aggregate {
    pub fn products_count(&self) -> usize {
        self.products.len()
    }
}

pub type BrandAggregate = Aggregate;
pub type CategoryAggregate = Aggregate;

/// Insertion-ordered map from aggregate name to [`Aggregate`].
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateMap {
    kind: AggregateKind,
    entries: Vec<Aggregate>,
    index: HashMap<String, usize>,
}

impl AggregateMap {
    pub fn new(kind: AggregateKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn kind(&self) -> AggregateKind {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&Aggregate> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    /// Look up `name`, creating the aggregate with `make` on first sight.
    pub fn get_or_insert_with(
        &mut self,
        name: &str,
        make: impl FnOnce() -> Aggregate,
    ) -> &mut Aggregate {
        let idx = match self.index.get(name) {
            Some(&i) => i,
            None => {
                self.entries.push(make());
                let i = self.entries.len() - 1;
                self.index.insert(name.to_string(), i);
                i
            }
        };
        &mut self.entries[idx]
    }

    /// Aggregates in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &Aggregate> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serialized as a JSON object keyed by name, in first-seen order.
impl Serialize for AggregateMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, entry)?;
        }
        map.end()
    }
}

// =============================================================================
// Sitemap
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Daily,
    Weekly,
}

/// One sitemap URL. `priority` serializes as a one-decimal string.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SitemapEntry {
    pub url: String,
    pub changefreq: ChangeFreq,
    #[serde(serialize_with = "serialize_priority")]
    pub priority: f32,
}

impl SitemapEntry {
    pub fn new(url: impl Into<String>, changefreq: ChangeFreq, priority: f32) -> Self {
        Self {
            url: url.into(),
            changefreq,
            priority,
        }
    }
}

fn serialize_priority<S: Serializer>(priority: &f32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.1}", priority))
}

// =============================================================================
// Export Schema
// =============================================================================

/// Flat-table column layout.
///
/// Deserialized through [`FromStr`], so JSON accepts the same names as the
/// CLI, case-insensitively.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ExportSchema {
    /// WooCommerce-compatible product import.
    #[default]
    Commerce,
    /// Original vs. enhanced content side by side.
    Enhanced,
}

impl ExportSchema {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commerce => "commerce",
            Self::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for ExportSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ExportSchema {
    type Error = ExportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for ExportSchema {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "commerce" | "woocommerce" => Ok(Self::Commerce),
            "enhanced" => Ok(Self::Enhanced),
            other => Err(ExportError::UnknownSchema(other.to_string())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn markup() -> SchemaMarkup {
        SchemaMarkup {
            context: "https://schema.org/".into(),
            kind: "Product".into(),
            name: "Acme Cream".into(),
            brand: BrandMarkup { kind: "Brand".into(), name: "Acme".into() },
            category: "Skin".into(),
            offers: OfferMarkup {
                kind: "Offer".into(),
                price: "100".into(),
                price_currency: "IRR".into(),
                availability: "https://schema.org/InStock".into(),
            },
        }
    }

    #[test]
    fn test_attach_enrichment_only_once() {
        let mut product = Product { sku: "SK-1".into(), ..Product::default() };
        let enrichment = Enrichment {
            enhanced_description: Some("better".into()),
            ..Enrichment::default()
        };

        product.attach_enrichment(enrichment.clone()).unwrap();
        assert_eq!(product.display_description(), "better");

        let err = product.attach_enrichment(enrichment).unwrap_err();
        assert!(matches!(err, EnrichError::AlreadyEnriched(ref label) if label == "SK-1"));
    }

    #[test]
    fn test_short_description_counts_chars() {
        let product = Product { description: "ش".repeat(250), ..Product::default() };
        assert_eq!(product.short_description().chars().count(), 200);
    }

    #[test]
    fn test_product_defaults_to_unknown() {
        let product: Product = serde_json::from_str(r#"{ "name": "Serum" }"#).unwrap();
        assert_eq!(product.brand, UNKNOWN);
        assert_eq!(product.category, UNKNOWN);
        assert!(!product.is_enriched());
    }

    #[test]
    fn test_unenriched_product_omits_optional_fields() {
        let json = serde_json::to_value(Product::default()).unwrap();
        assert!(json.get("seo_content").is_none());
        assert!(json.get("image_urls").is_none());
        assert!(json.get("enhanced_description").is_none());
    }

    #[test]
    fn test_schema_markup_field_names() {
        let json = serde_json::to_value(markup()).unwrap();
        assert_eq!(json["@type"], "Product");
        assert_eq!(json["brand"]["@type"], "Brand");
        assert_eq!(json["offers"]["priceCurrency"], "IRR");
    }

    #[test]
    fn test_focus_keyword() {
        let seo = SeoContent {
            meta_title: String::new(),
            meta_description: String::new(),
            keywords: "Acme, Cream, Skin".into(),
            schema_markup: markup(),
        };
        assert_eq!(seo.focus_keyword(), "Acme");
        assert_eq!(seo.keyword_list(), vec!["Acme", "Cream", "Skin"]);
    }

    #[test]
    fn test_sitemap_priority_as_string() {
        let entry = SitemapEntry::new("/", ChangeFreq::Daily, 1.0);
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"{"url":"/","changefreq":"daily","priority":"1.0"}"#);
    }

    #[test]
    fn test_export_schema_from_str() {
        assert_eq!("woocommerce".parse::<ExportSchema>().unwrap(), ExportSchema::Commerce);
        assert_eq!("Enhanced".parse::<ExportSchema>().unwrap(), ExportSchema::Enhanced);
        assert!("shopify".parse::<ExportSchema>().is_err());
    }

    #[test]
    fn test_export_schema_json_matches_from_str() {
        let schema: ExportSchema = serde_json::from_str(r#""Enhanced""#).unwrap();
        assert_eq!(schema, ExportSchema::Enhanced);

        let schema: ExportSchema = serde_json::from_str(r#""WooCommerce""#).unwrap();
        assert_eq!(schema, ExportSchema::Commerce);

        assert!(serde_json::from_str::<ExportSchema>(r#""shopify""#).is_err());
        assert_eq!(serde_json::to_string(&ExportSchema::Enhanced).unwrap(), r#""enhanced""#);
    }

    #[test]
    fn test_deserialized_price_is_coerced() {
        let product: Product = serde_json::from_str(r#"{ "name": "x", "price": -5 }"#).unwrap();
        assert_eq!(product.price, 0.0);

        let product: Product = serde_json::from_str(r#"{ "price": "N/A" }"#).unwrap();
        assert_eq!(product.price, 0.0);

        let product: Product = serde_json::from_str(r#"{ "price": "120000" }"#).unwrap();
        assert_eq!(product.price, 120000.0);

        let product: Product = serde_json::from_str(r#"{ "price": 49.5 }"#).unwrap();
        assert_eq!(product.price, 49.5);

        let product: Product = serde_json::from_str(r#"{ "name": "no price" }"#).unwrap();
        assert_eq!(product.price, 0.0);
    }
}
