//! Storefront sitemap from aggregate maps.
//!
//! Four fixed entries first, then one URL per brand, then one per category,
//! each in the map's first-seen order.

use crate::models::{AggregateMap, ChangeFreq, SitemapEntry};

const BOOTSTRAP: [(&str, ChangeFreq, f32); 4] = [
    ("/", ChangeFreq::Daily, 1.0),
    ("/products", ChangeFreq::Daily, 0.9),
    ("/brands", ChangeFreq::Weekly, 0.8),
    ("/categories", ChangeFreq::Weekly, 0.8),
];

const AGGREGATE_PRIORITY: f32 = 0.7;

pub fn build_sitemap(brands: &AggregateMap, categories: &AggregateMap) -> Vec<SitemapEntry> {
    let mut entries: Vec<SitemapEntry> = BOOTSTRAP
        .iter()
        .map(|&(url, freq, priority)| SitemapEntry::new(url, freq, priority))
        .collect();

    for map in [brands, categories] {
        let segment = map.kind().path_segment();
        entries.extend(map.iter().map(|agg| {
            SitemapEntry::new(
                format!("/{}/{}", segment, agg.slug),
                ChangeFreq::Weekly,
                AGGREGATE_PRIORITY,
            )
        }));
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::transform::aggregate::aggregate;

    fn maps(brands: &[&str], category: &str) -> (AggregateMap, AggregateMap) {
        let products: Vec<Product> = brands
            .iter()
            .map(|b| Product {
                brand: b.to_string(),
                category: category.to_string(),
                ..Product::default()
            })
            .collect();
        aggregate(&products, "Livora")
    }

    #[test]
    fn test_sitemap_order() {
        let (brands, categories) = maps(&["Acme", "Zed"], "Skin");
        let sitemap = build_sitemap(&brands, &categories);

        let urls: Vec<&str> = sitemap.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["/", "/products", "/brands", "/categories", "/brand/acme", "/brand/zed", "/category/skin"]
        );
    }

    #[test]
    fn test_sitemap_priorities() {
        let (brands, categories) = maps(&["Acme"], "Skin");
        let sitemap = build_sitemap(&brands, &categories);

        assert_eq!(sitemap[0].priority, 1.0);
        assert_eq!(sitemap[0].changefreq, ChangeFreq::Daily);
        assert_eq!(sitemap[1].priority, 0.9);
        assert_eq!(sitemap[3].changefreq, ChangeFreq::Weekly);
        assert!(sitemap[4..].iter().all(|e| e.priority == 0.7 && e.changefreq == ChangeFreq::Weekly));
    }

    #[test]
    fn test_empty_maps_yield_bootstrap_only() {
        let (brands, categories) = maps(&[], "Skin");
        assert_eq!(build_sitemap(&brands, &categories).len(), 4);
    }

    #[test]
    fn test_sitemap_is_byte_identical_across_calls() {
        let (brands, categories) = maps(&["Acme", "Zed"], "Skin");
        let a = serde_json::to_string(&build_sitemap(&brands, &categories)).unwrap();
        let b = serde_json::to_string(&build_sitemap(&brands, &categories)).unwrap();
        assert_eq!(a, b);
    }
}
