//! Catalog transformation.
//!
//! - Aggregate: products to brand/category groupings
//! - Sitemap: groupings to storefront URLs
//! - Pipeline: ingestion, enrichment, aggregation and export in one run

pub mod aggregate;
pub mod pipeline;
pub mod sitemap;

pub use aggregate::{aggregate, slug_collisions, slugify};
pub use pipeline::*;
pub use sitemap::build_sitemap;
