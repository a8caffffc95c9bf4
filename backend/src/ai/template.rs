//! Deterministic enricher built from fixed text templates.

use async_trait::async_trait;

use super::Enricher;
use crate::config::CatalogConfig;
use crate::error::{EnrichError, EnrichResult};
use crate::export::format_price;
use crate::models::{BrandMarkup, OfferMarkup, Product, SchemaMarkup, SeoContent};

const SCHEMA_CONTEXT: &str = "https://schema.org/";
const IN_STOCK: &str = "https://schema.org/InStock";

/// Produces description, SEO block and image URLs without any network call.
#[derive(Debug, Clone)]
pub struct TemplateEnricher {
    currency: String,
    image_url_template: String,
}

impl TemplateEnricher {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            image_url_template: config.image_url_template.clone(),
        }
    }

    pub fn description_for(&self, product: &Product) -> String {
        format!("Enhanced description for {}: {}", product.name, product.description)
    }

    pub fn seo_for(&self, product: &Product) -> SeoContent {
        let brand = &product.brand;
        let name = &product.name;

        SeoContent {
            meta_title: format!("{brand} {name} | بهترین قیمت | ضمانت اصالت"),
            meta_description: format!(
                "خرید {brand} {name} اورجینال با بهترین قیمت. ضمانت اصالت کالا، ارسال سریع."
            ),
            keywords: format!(
                "{brand}, {name}, {}, خرید آنلاین, بهترین قیمت",
                product.category
            ),
            schema_markup: SchemaMarkup {
                context: SCHEMA_CONTEXT.to_string(),
                kind: "Product".to_string(),
                name: format!("{brand} {name}"),
                brand: BrandMarkup {
                    kind: "Brand".to_string(),
                    name: brand.clone(),
                },
                category: product.category.clone(),
                offers: OfferMarkup {
                    kind: "Offer".to_string(),
                    price: format_price(product.price),
                    price_currency: self.currency.clone(),
                    availability: IN_STOCK.to_string(),
                },
            },
        }
    }

    /// One URL from the configured pattern. Needs a SKU to address the image.
    pub fn images_for(&self, product: &Product) -> EnrichResult<Vec<String>> {
        if product.sku.trim().is_empty() {
            return Err(EnrichError::Unavailable(format!(
                "no SKU to build an image URL for '{}'",
                product.label()
            )));
        }
        Ok(vec![self.image_url_template.replace("{sku}", product.sku.trim())])
    }
}

#[async_trait]
impl Enricher for TemplateEnricher {
    fn name(&self) -> &str {
        "template"
    }

    async fn enhance_description(&self, product: &Product) -> EnrichResult<String> {
        Ok(self.description_for(product))
    }

    async fn seo_content(&self, product: &Product) -> EnrichResult<SeoContent> {
        Ok(self.seo_for(product))
    }

    async fn image_urls(&self, product: &Product) -> EnrichResult<Vec<String>> {
        self.images_for(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            name: "Hydra Cream".into(),
            brand: "Cinere".into(),
            category: "Skin Care".into(),
            price: 350000.0,
            description: "Daily moisturizer".into(),
            sku: "CIN-01".into(),
            ..Product::default()
        }
    }

    fn enricher() -> TemplateEnricher {
        TemplateEnricher::new(&CatalogConfig::default())
    }

    #[test]
    fn test_description_template() {
        assert_eq!(
            enricher().description_for(&product()),
            "Enhanced description for Hydra Cream: Daily moisturizer"
        );
    }

    #[test]
    fn test_seo_template() {
        let seo = enricher().seo_for(&product());

        assert_eq!(seo.meta_title, "Cinere Hydra Cream | بهترین قیمت | ضمانت اصالت");
        assert_eq!(seo.focus_keyword(), "Cinere");
        assert_eq!(seo.keyword_list()[2], "Skin Care");
        assert_eq!(seo.schema_markup.name, "Cinere Hydra Cream");
        assert_eq!(seo.schema_markup.offers.price, "350000");
        assert_eq!(seo.schema_markup.offers.price_currency, "IRR");
    }

    #[test]
    fn test_image_url_from_sku() {
        let urls = enricher().images_for(&product()).unwrap();
        assert_eq!(urls, vec!["https://example.com/images/CIN-01.jpg"]);
    }

    #[test]
    fn test_image_url_requires_sku() {
        let p = Product { sku: String::new(), ..product() };
        assert!(matches!(enricher().images_for(&p), Err(EnrichError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_trait_methods_delegate() {
        let e = enricher();
        let p = product();
        assert_eq!(e.enhance_description(&p).await.unwrap(), e.description_for(&p));
        assert_eq!(e.seo_content(&p).await.unwrap(), e.seo_for(&p));
        assert_eq!(e.name(), "template");
    }
}
