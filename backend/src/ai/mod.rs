//! Product enrichment.
//!
//! An [`Enricher`] supplies three optional capabilities for one product:
//! an enhanced description, an SEO block and image URLs. [`enrich_all`]
//! runs an enricher over a catalog with bounded concurrency and records
//! every failure in an [`EnrichmentReport`] instead of aborting.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use livora::ai::{enrich_all, EnrichOptions, TemplateEnricher};
//!
//! let enricher = TemplateEnricher::new(&config);
//! let (products, report) = enrich_all(products, &enricher, &EnrichOptions::from_config(&config)).await;
//! println!("{} enriched, {} failures", report.enriched, report.failures.len());
//! ```

pub mod client;
pub mod prompt;
pub mod template;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CatalogConfig;
use crate::error::EnrichResult;
use crate::models::{Enrichment, Product, SeoContent};

pub use client::{AiClient, AiEnricher};
pub use template::TemplateEnricher;

/// Enrichment collaborator. Each capability may fail independently.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Short name for logs and reports.
    fn name(&self) -> &str;

    async fn enhance_description(&self, product: &Product) -> EnrichResult<String>;

    async fn seo_content(&self, product: &Product) -> EnrichResult<SeoContent>;

    async fn image_urls(&self, product: &Product) -> EnrichResult<Vec<String>>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Description,
    Seo,
    Images,
}

/// Runner settings, usually derived from [`CatalogConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichOptions {
    /// Products enriched at the same time.
    pub concurrency: usize,
    pub seo: bool,
    pub images: bool,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}

impl EnrichOptions {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            concurrency: config.max_products_per_batch,
            seo: config.enable_seo_generation,
            images: config.enable_image_generation,
        }
    }
}

/// One capability that failed for one product.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CapabilityFailure {
    /// Position of the product in the input.
    pub index: usize,
    pub product: String,
    pub capability: Capability,
    pub error: String,
}

/// Outcome of an [`enrich_all`] run.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EnrichmentReport {
    pub enricher: String,
    pub attempted: usize,
    /// Products that received at least one field.
    pub enriched: usize,
    /// Products left untouched because they were already enriched.
    pub skipped: Vec<String>,
    pub failures: Vec<CapabilityFailure>,
}

impl EnrichmentReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.skipped.is_empty()
    }
}

struct ProductOutcome {
    product: Product,
    enriched: bool,
    skipped: bool,
    failures: Vec<CapabilityFailure>,
}

/// Enrich `products` with at most `options.concurrency` in flight.
///
/// Each product is moved into exactly one future, so no two tasks touch
/// the same product. Results come back in input order.
pub async fn enrich_all(
    products: Vec<Product>,
    enricher: &dyn Enricher,
    options: &EnrichOptions,
) -> (Vec<Product>, EnrichmentReport) {
    let mut report = EnrichmentReport {
        enricher: enricher.name().to_string(),
        attempted: products.len(),
        ..EnrichmentReport::default()
    };

    let outcomes: Vec<ProductOutcome> = stream::iter(products.into_iter().enumerate())
        .map(|(index, product)| enrich_one(index, product, enricher, options))
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let mut enriched = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        if outcome.enriched {
            report.enriched += 1;
        }
        if outcome.skipped {
            report.skipped.push(outcome.product.label());
        }
        report.failures.extend(outcome.failures);
        enriched.push(outcome.product);
    }

    debug!(
        enricher = %report.enricher,
        enriched = report.enriched,
        failures = report.failures.len(),
        "enrichment finished"
    );
    (enriched, report)
}

async fn enrich_one(
    index: usize,
    mut product: Product,
    enricher: &dyn Enricher,
    options: &EnrichOptions,
) -> ProductOutcome {
    if product.is_enriched() {
        warn!(index, product = %product.label(), "product already enriched, skipping");
        return ProductOutcome {
            product,
            enriched: false,
            skipped: true,
            failures: Vec::new(),
        };
    }

    let mut failures = Vec::new();
    let mut record = |capability: Capability, error: String, product: &Product| {
        warn!(index, product = %product.label(), ?capability, %error, "enrichment failed");
        failures.push(CapabilityFailure {
            index,
            product: product.label(),
            capability,
            error,
        });
    };

    let enhanced_description = match enricher.enhance_description(&product).await {
        Ok(text) => Some(text),
        Err(e) => {
            record(Capability::Description, e.to_string(), &product);
            None
        }
    };

    let seo_content = if options.seo {
        match enricher.seo_content(&product).await {
            Ok(seo) => Some(seo),
            Err(e) => {
                record(Capability::Seo, e.to_string(), &product);
                None
            }
        }
    } else {
        None
    };

    let image_urls = if options.images {
        match enricher.image_urls(&product).await {
            Ok(urls) => Some(urls),
            Err(e) => {
                record(Capability::Images, e.to_string(), &product);
                None
            }
        }
    } else {
        None
    };

    let enrichment = Enrichment {
        enhanced_description,
        seo_content,
        image_urls,
    };

    let enriched = !enrichment.is_empty();
    if enriched {
        if let Err(e) = product.attach_enrichment(enrichment) {
            warn!(index, error = %e, "could not attach enrichment");
        }
    }

    ProductOutcome {
        product,
        enriched,
        skipped: false,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnrichError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn catalog(n: usize) -> Vec<Product> {
        (0..n)
            .map(|i| Product {
                sku: format!("SK-{i}"),
                name: format!("Product {i}"),
                brand: "Acme".into(),
                ..Product::default()
            })
            .collect()
    }

    /// Fails descriptions for odd SKUs and tracks peak concurrency.
    struct FlakyEnricher {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl FlakyEnricher {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Enricher for FlakyEnricher {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn enhance_description(&self, product: &Product) -> EnrichResult<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let n: usize = product.sku.trim_start_matches("SK-").parse().unwrap_or(0);
            if n % 2 == 1 {
                Err(EnrichError::Api("rate limited".into()))
            } else {
                Ok(format!("better {}", product.name))
            }
        }

        async fn seo_content(&self, _product: &Product) -> EnrichResult<SeoContent> {
            Err(EnrichError::Unavailable("no seo".into()))
        }

        async fn image_urls(&self, product: &Product) -> EnrichResult<Vec<String>> {
            Ok(vec![format!("{}.jpg", product.sku)])
        }
    }

    #[tokio::test]
    async fn test_enrich_all_template() {
        let config = CatalogConfig::default();
        let enricher = TemplateEnricher::new(&config);
        let (products, report) = enrich_all(catalog(3), &enricher, &EnrichOptions::from_config(&config)).await;

        assert_eq!(report.enriched, 3);
        assert!(report.is_clean());
        assert!(products.iter().all(|p| p.seo_content.is_some()));
        assert_eq!(products[2].image_urls.as_deref(), Some(&["https://example.com/images/SK-2.jpg".to_string()][..]));
    }

    #[tokio::test]
    async fn test_failures_leave_fields_unset_and_are_reported() {
        let enricher = FlakyEnricher::new();
        let options = EnrichOptions { concurrency: 2, seo: true, images: true };
        let (products, report) = enrich_all(catalog(4), &enricher, &options).await;

        assert_eq!(products.len(), 4);
        assert_eq!(products[0].enhanced_description.as_deref(), Some("better Product 0"));
        assert!(products[1].enhanced_description.is_none());
        assert!(products.iter().all(|p| p.seo_content.is_none()));
        assert!(products.iter().all(|p| p.image_urls.is_some()));

        let description_failures: Vec<_> = report
            .failures
            .iter()
            .filter(|f| f.capability == Capability::Description)
            .map(|f| f.index)
            .collect();
        assert_eq!(description_failures, vec![1, 3]);
        assert_eq!(report.failures.iter().filter(|f| f.capability == Capability::Seo).count(), 4);
        assert_eq!(report.failures[0].product, "SK-0");
    }

    #[tokio::test]
    async fn test_output_keeps_input_order() {
        let enricher = FlakyEnricher::new();
        let options = EnrichOptions { concurrency: 3, seo: false, images: false };
        let (products, _) = enrich_all(catalog(7), &enricher, &options).await;

        let skus: Vec<_> = products.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["SK-0", "SK-1", "SK-2", "SK-3", "SK-4", "SK-5", "SK-6"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let enricher = FlakyEnricher::new();
        let options = EnrichOptions { concurrency: 2, seo: false, images: false };
        enrich_all(catalog(8), &enricher, &options).await;

        assert!(enricher.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_disabled_capabilities_not_called() {
        let config = CatalogConfig::default();
        let enricher = TemplateEnricher::new(&config);
        let options = EnrichOptions { concurrency: 1, seo: false, images: false };
        let (products, _) = enrich_all(catalog(1), &enricher, &options).await;

        assert!(products[0].enhanced_description.is_some());
        assert!(products[0].seo_content.is_none());
        assert!(products[0].image_urls.is_none());
    }

    #[tokio::test]
    async fn test_already_enriched_products_are_skipped() {
        let config = CatalogConfig::default();
        let enricher = TemplateEnricher::new(&config);
        let mut products = catalog(2);
        products[0].enhanced_description = Some("kept".into());

        let (products, report) = enrich_all(products, &enricher, &EnrichOptions::default()).await;

        assert_eq!(products[0].enhanced_description.as_deref(), Some("kept"));
        assert!(products[0].seo_content.is_none());
        assert_eq!(report.skipped, vec!["SK-0"]);
        assert_eq!(report.enriched, 1);
    }
}
