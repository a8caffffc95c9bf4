//! JSON-tree exporter: the storefront document set.
//!
//! Five independent documents are produced from one catalog:
//!
//! | File              | Content                                       |
//! |-------------------|-----------------------------------------------|
//! | `brands.json`     | brand pages keyed by name, first-seen order   |
//! | `categories.json` | category pages keyed by name                  |
//! | `products.json`   | `{"products": [...]}` pass-through            |
//! | `sitemap.json`    | ordered sitemap entries                       |
//! | `pages.json`      | static home/products page metadata            |

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

use crate::error::ExportResult;
use crate::models::{Aggregate, AggregateMap, AggregateMeta, Product, SitemapEntry};

/// Document names, in write order.
pub const DOCUMENT_NAMES: [&str; 5] = ["brands", "categories", "products", "sitemap", "pages"];

// =============================================================================
// Document types
// =============================================================================

/// Pages keyed by aggregate name, serialized as an ordered JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMap<T> {
    entries: Vec<(String, T)>,
}

impl<T> PageMap<T> {
    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, page)| page)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Serialize> Serialize for PageMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, page) in &self.entries {
            map.serialize_entry(name, page)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BrandProductSummary {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price: f64,
    pub description: String,
    pub image: Option<String>,
    pub category: String,
    pub skin_types: Vec<String>,
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryProductSummary {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub price: f64,
    pub brand: String,
    pub image: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BrandPage {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub meta: AggregateMeta,
    pub products_count: usize,
    pub categories: Vec<String>,
    pub products: Vec<BrandProductSummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryPage {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub meta: AggregateMeta,
    pub products_count: usize,
    pub products: Vec<CategoryProductSummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductsDocument {
    pub products: Vec<Product>,
}

/// Static page metadata.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
    pub keywords: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PagesDocument {
    pub home: PageMeta,
    pub products: PageMeta,
}

impl PagesDocument {
    pub fn for_store(store: &str) -> Self {
        Self {
            home: PageMeta {
                title: format!("{store} - Beauty Products Store"),
                description: format!("Discover premium beauty products at {store}"),
                keywords: "beauty products, cosmetics, skincare".to_string(),
            },
            products: PageMeta {
                title: format!("All Products - {store}"),
                description: "Browse our complete collection of beauty products".to_string(),
                keywords: "beauty products, cosmetics, makeup".to_string(),
            },
        }
    }
}

/// The full document set.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SiteDocuments {
    pub brands: PageMap<BrandPage>,
    pub categories: PageMap<CategoryPage>,
    pub products: ProductsDocument,
    pub sitemap: Vec<SitemapEntry>,
    pub pages: PagesDocument,
}

impl SiteDocuments {
    /// Serialize one document by name.
    pub fn document(&self, name: &str) -> ExportResult<Option<serde_json::Value>> {
        let value = match name {
            "brands" => serde_json::to_value(&self.brands)?,
            "categories" => serde_json::to_value(&self.categories)?,
            "products" => serde_json::to_value(&self.products)?,
            "sitemap" => serde_json::to_value(&self.sitemap)?,
            "pages" => serde_json::to_value(&self.pages)?,
            _ => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Write every document as `<name>.json` under `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> ExportResult<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::with_capacity(DOCUMENT_NAMES.len());
        for name in DOCUMENT_NAMES {
            let path = dir.join(format!("{name}.json"));
            let json = match name {
                "brands" => serde_json::to_string_pretty(&self.brands)?,
                "categories" => serde_json::to_string_pretty(&self.categories)?,
                "products" => serde_json::to_string_pretty(&self.products)?,
                "sitemap" => serde_json::to_string_pretty(&self.sitemap)?,
                _ => serde_json::to_string_pretty(&self.pages)?,
            };
            std::fs::write(&path, json)?;
            written.push(path);
        }
        Ok(written)
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Brand pages only, as served by the brand-pages endpoint.
pub fn brand_pages(products: &[Product], brands: &AggregateMap) -> PageMap<BrandPage> {
    PageMap {
        entries: brands
            .iter()
            .map(|agg| (agg.name.clone(), brand_page(products, agg)))
            .collect(),
    }
}

pub fn category_pages(products: &[Product], categories: &AggregateMap) -> PageMap<CategoryPage> {
    PageMap {
        entries: categories
            .iter()
            .map(|agg| (agg.name.clone(), category_page(products, agg)))
            .collect(),
    }
}

/// Assemble the full document set. `store_name` feeds the static pages.
pub fn export_json(
    products: &[Product],
    brands: &AggregateMap,
    categories: &AggregateMap,
    sitemap: &[SitemapEntry],
    store_name: &str,
) -> SiteDocuments {
    SiteDocuments {
        brands: brand_pages(products, brands),
        categories: category_pages(products, categories),
        products: ProductsDocument {
            products: products.to_vec(),
        },
        sitemap: sitemap.to_vec(),
        pages: PagesDocument::for_store(store_name),
    }
}

fn members<'a>(products: &'a [Product], agg: &'a Aggregate) -> impl Iterator<Item = &'a Product> {
    agg.products.iter().filter_map(|&i| products.get(i))
}

fn brand_page(products: &[Product], agg: &Aggregate) -> BrandPage {
    BrandPage {
        name: agg.name.clone(),
        slug: agg.slug.clone(),
        description: agg.description.clone(),
        meta: agg.meta.clone(),
        products_count: agg.products_count(),
        categories: agg.categories.clone(),
        products: members(products, agg)
            .map(|p| BrandProductSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                sku: p.sku.clone(),
                price: p.price,
                description: p.short_description(),
                image: p.first_image().map(String::from),
                category: p.category.clone(),
                skin_types: p.skin_types.clone(),
                ingredients: p.ingredients.clone(),
            })
            .collect(),
    }
}

fn category_page(products: &[Product], agg: &Aggregate) -> CategoryPage {
    CategoryPage {
        name: agg.name.clone(),
        slug: agg.slug.clone(),
        description: agg.description.clone(),
        meta: agg.meta.clone(),
        products_count: agg.products_count(),
        products: members(products, agg)
            .map(|p| CategoryProductSummary {
                id: p.id.clone(),
                name: p.name.clone(),
                sku: p.sku.clone(),
                price: p.price,
                brand: p.brand.clone(),
                image: p.first_image().map(String::from),
                description: p.short_description(),
            })
            .collect(),
    }
}
