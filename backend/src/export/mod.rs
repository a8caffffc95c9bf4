//! Exporters.
//!
//! - [`table`] - flat commerce-import tables (CSV)
//! - [`site`] - storefront JSON document set

pub mod site;
pub mod table;

pub use site::{
    brand_pages, category_pages, export_json, BrandPage, CategoryPage, PageMap, PagesDocument,
    SiteDocuments, DOCUMENT_NAMES,
};
pub use table::{export_table, format_price, ExportTable, COMMERCE_HEADERS, ENHANCED_HEADERS};
