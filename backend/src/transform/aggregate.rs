//! Group canonical products into brand and category aggregates.
//!
//! ```text
//! Products (row order)              →  Aggregates (first-seen order)
//! ┌──────────────────────────┐        ┌──────────────────────────────┐
//! │ #0 brand: Acme, cat: Skin│        │ Acme  → [#0, #1]  /brand/acme│
//! │ #1 brand: Acme, cat: Hair│   →    │ Zed   → [#2]      /brand/zed │
//! │ #2 brand: Zed,  cat: Skin│        ├──────────────────────────────┤
//! └──────────────────────────┘        │ Skin  → [#0, #2]             │
//!                                     │ Hair  → [#1]                 │
//!                                     └──────────────────────────────┘
//! ```
//!
//! Aggregates hold product indices, not copies. Slugs are not deduplicated:
//! two names that slug identically keep separate aggregates.

use crate::models::{Aggregate, AggregateKind, AggregateMap, AggregateMeta, Product};

/// URL slug: lowercase, spaces to hyphens, apostrophes removed.
///
/// ```ignore
/// assert_eq!(livora::slugify("L'Oréal Paris"), "loréal-paris");
/// ```
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-").replace('\'', "")
}

/// Build both aggregate maps in a single pass over `products`.
pub fn aggregate(products: &[Product], store_name: &str) -> (AggregateMap, AggregateMap) {
    let mut brands = AggregateMap::new(AggregateKind::Brand);
    let mut categories = AggregateMap::new(AggregateKind::Category);

    for (idx, product) in products.iter().enumerate() {
        let brand = brands.get_or_insert_with(&product.brand, || {
            new_aggregate(AggregateKind::Brand, &product.brand, store_name)
        });
        brand.products.push(idx);
        if !brand.categories.contains(&product.category) {
            brand.categories.push(product.category.clone());
        }

        categories
            .get_or_insert_with(&product.category, || {
                new_aggregate(AggregateKind::Category, &product.category, store_name)
            })
            .products
            .push(idx);
    }

    (brands, categories)
}

/// Names in `map` that share a slug with an earlier name.
pub fn slug_collisions(map: &AggregateMap) -> Vec<(String, String)> {
    let mut seen: Vec<(&str, &str)> = Vec::new();
    let mut collisions = Vec::new();

    for agg in map.iter() {
        match seen.iter().find(|(slug, _)| *slug == agg.slug) {
            Some((_, first)) => collisions.push((first.to_string(), agg.name.clone())),
            None => seen.push((&agg.slug, &agg.name)),
        }
    }

    collisions
}

fn new_aggregate(kind: AggregateKind, name: &str, store: &str) -> Aggregate {
    let (description, meta) = match kind {
        AggregateKind::Brand => (
            format!("Premium {name} products at {store}"),
            AggregateMeta {
                title: format!("{name} Products - {store}"),
                description: format!("Shop authentic {name} products with best price guarantee"),
                keywords: format!("{name}, {} products, buy {name}", name.to_lowercase()),
            },
        ),
        AggregateKind::Category => (
            format!("Browse {name} products at {store}"),
            AggregateMeta {
                title: format!("{name} Products - {store}"),
                description: format!("Shop premium {name} products with authentic brands"),
                keywords: format!("{name}, {} products, buy {name}", name.to_lowercase()),
            },
        ),
    };

    Aggregate {
        name: name.to_string(),
        slug: slugify(name),
        products: Vec::new(),
        description,
        meta,
        categories: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(sku: &str, brand: &str, category: &str) -> Product {
        Product {
            sku: sku.into(),
            brand: brand.into(),
            category: category.into(),
            ..Product::default()
        }
    }

    fn sample() -> Vec<Product> {
        vec![
            product("A1", "Acme", "Skin"),
            product("Z1", "Zed", "Skin"),
            product("A2", "Acme", "Hair"),
        ]
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("L'Oréal Paris"), "loréal-paris");
        assert_eq!(slugify("Skin Care"), "skin-care");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_brand_grouping_keeps_row_order() {
        let (brands, _) = aggregate(&sample(), "Livora");

        assert_eq!(brands.len(), 2);
        assert_eq!(brands.get("Acme").unwrap().products, vec![0, 2]);
        assert_eq!(brands.get("Zed").unwrap().products, vec![1]);
        assert_eq!(brands.names(), vec!["Acme", "Zed"]);
    }

    #[test]
    fn test_category_grouping() {
        let (_, categories) = aggregate(&sample(), "Livora");

        assert_eq!(categories.names(), vec!["Skin", "Hair"]);
        assert_eq!(categories.get("Skin").unwrap().products, vec![0, 1]);
        assert_eq!(categories.get("Hair").unwrap().products_count(), 1);
    }

    #[test]
    fn test_every_product_in_exactly_one_aggregate() {
        let products = sample();
        let (brands, categories) = aggregate(&products, "Livora");

        for map in [&brands, &categories] {
            let mut seen: Vec<usize> = map.iter().flat_map(|a| a.products.iter().copied()).collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..products.len()).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let products = sample();
        let first = aggregate(&products, "Livora");
        let second = aggregate(&products, "Livora");

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.0).unwrap(),
            serde_json::to_string(&second.0).unwrap()
        );
    }

    #[test]
    fn test_brand_metadata_templates() {
        let (brands, categories) = aggregate(&sample(), "Livora");
        let acme = brands.get("Acme").unwrap();

        assert_eq!(acme.slug, "acme");
        assert_eq!(acme.description, "Premium Acme products at Livora");
        assert_eq!(acme.meta.title, "Acme Products - Livora");
        assert_eq!(acme.meta.keywords, "Acme, acme products, buy Acme");
        assert_eq!(acme.categories, vec!["Skin", "Hair"]);
        assert_eq!(categories.get("Skin").unwrap().description, "Browse Skin products at Livora");
    }

    #[test]
    fn test_empty_key_is_ordinary() {
        let products = vec![product("1", "", ""), product("2", "", "")];
        let (brands, categories) = aggregate(&products, "Livora");

        assert_eq!(brands.get("").unwrap().products, vec![0, 1]);
        assert_eq!(categories.get("").unwrap().slug, "");
    }

    #[test]
    fn test_slug_collisions_are_kept_and_reported() {
        let products = vec![product("1", "Acme Co", "x"), product("2", "acme co", "x")];
        let (brands, _) = aggregate(&products, "Livora");

        assert_eq!(brands.len(), 2);
        assert_eq!(
            slug_collisions(&brands),
            vec![("Acme Co".to_string(), "acme co".to_string())]
        );
    }

    #[test]
    fn test_serialized_map_preserves_order() {
        let (brands, _) = aggregate(&sample(), "Livora");
        let json = serde_json::to_string(&brands).unwrap();

        let acme = json.find("\"Acme\"").unwrap();
        let zed = json.find("\"Zed\"").unwrap();
        assert!(acme < zed);
    }
}
