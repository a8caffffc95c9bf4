//! Flat-table exporter for commerce import files.
//!
//! Two column layouts are supported (see [`ExportSchema`]). Missing
//! enrichment renders as an empty cell; the `ID` column is a 1-based row
//! sequence, not the source product id.

use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::ExportResult;
use crate::models::{ExportSchema, Product};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const COMMERCE_HEADERS: [&str; 19] = [
    "ID",
    "Type",
    "SKU",
    "Name",
    "Published",
    "Is featured?",
    "Visibility in catalog",
    "Short description",
    "Description",
    "Tax status",
    "In stock?",
    "Stock",
    "Regular price",
    "Categories",
    "Tags",
    "Images",
    "SEO title",
    "SEO description",
    "SEO focus-keyword",
];

pub const ENHANCED_HEADERS: [&str; 12] = [
    "ID",
    "SKU",
    "Name",
    "Brand",
    "Category",
    "Price",
    "Original Description",
    "Enhanced Description",
    "SEO Title",
    "SEO Description",
    "Keywords",
    "Image URLs",
];

/// Stock level written for every commerce row.
const DEFAULT_STOCK: u32 = 10;

/// Rows rendered for one schema, header first when written out.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExportTable {
    pub schema: ExportSchema,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`, if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.headers.iter().position(|h| h == column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// CSV bytes: UTF-8 BOM, header row, then one line per product.
    pub fn to_csv_bytes(&self) -> ExportResult<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        Ok(writer.into_inner()?)
    }

    /// File name with a local timestamp, e.g. `commerce_products_20250101_120000.csv`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_products_{}.csv",
            self.schema,
            Local::now().format("%Y%m%d_%H%M%S")
        )
    }

    /// Write into `dir` (created if missing) and return the file path.
    pub fn write_to(&self, dir: &Path) -> ExportResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.to_csv_bytes()?)?;
        Ok(path)
    }
}

/// Render `products` with the column layout of `schema`.
pub fn export_table(products: &[Product], schema: ExportSchema) -> ExportTable {
    let headers: &[&str] = match schema {
        ExportSchema::Commerce => &COMMERCE_HEADERS,
        ExportSchema::Enhanced => &ENHANCED_HEADERS,
    };
    let render: fn(usize, &Product) -> Vec<String> = match schema {
        ExportSchema::Commerce => commerce_row,
        ExportSchema::Enhanced => enhanced_row,
    };

    let rows = products
        .iter()
        .enumerate()
        .map(|(i, p)| render(i + 1, p))
        .collect();

    ExportTable {
        schema,
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows,
    }
}

/// Integral prices print without a fractional part.
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{:.0}", price)
    } else {
        price.to_string()
    }
}

fn commerce_row(seq: usize, p: &Product) -> Vec<String> {
    let seo = p.seo_content.as_ref();
    vec![
        seq.to_string(),
        "simple".to_string(),
        p.sku.clone(),
        p.name.clone(),
        "1".to_string(),
        "0".to_string(),
        "visible".to_string(),
        p.short_description(),
        p.display_description().to_string(),
        "taxable".to_string(),
        "1".to_string(),
        DEFAULT_STOCK.to_string(),
        format_price(p.price),
        p.category.clone(),
        String::new(),
        p.joined_images(),
        seo.map(|s| s.meta_title.clone()).unwrap_or_default(),
        seo.map(|s| s.meta_description.clone()).unwrap_or_default(),
        seo.map(|s| s.focus_keyword().to_string()).unwrap_or_default(),
    ]
}

fn enhanced_row(seq: usize, p: &Product) -> Vec<String> {
    let seo = p.seo_content.as_ref();
    vec![
        seq.to_string(),
        p.sku.clone(),
        p.name.clone(),
        p.brand.clone(),
        p.category.clone(),
        format_price(p.price),
        p.description.clone(),
        p.enhanced_description.clone().unwrap_or_default(),
        seo.map(|s| s.meta_title.clone()).unwrap_or_default(),
        seo.map(|s| s.meta_description.clone()).unwrap_or_default(),
        seo.map(|s| s.keywords.clone()).unwrap_or_default(),
        p.joined_images(),
    ]
}
