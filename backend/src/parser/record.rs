//! Record parser: raw row → canonical [`Product`].
//!
//! Rows are JSON objects keyed by column name (see [`super::ParseResult`]).
//! Parsing never fails: missing strings become `""`, missing or malformed
//! numbers become `0`, and absent brand/category fall back to
//! [`UNKNOWN`].

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::ColumnMap;
use crate::models::{Product, UNKNOWN};

/// Delimiters tried, in order, for list fields such as skin types.
pub const LIST_DELIMITERS: &[&str] = &[",", ";", "|", "،"];

/// Delimiters tried, in order, for ingredient lists.
pub const INGREDIENT_DELIMITERS: &[&str] = &[",", ";", "|", "،", " | "];

/// Split `raw` on the first delimiter from `delimiters` that occurs in it.
///
/// Only that one delimiter is used, so `"a;b|c"` yields `["a", "b|c"]`.
/// Pieces are trimmed and empty pieces dropped. Without any delimiter the
/// trimmed string is the single element, or the list is empty.
pub fn parse_list_with(raw: &str, delimiters: &[&str]) -> Vec<String> {
    match delimiters.iter().find(|d| raw.contains(**d)) {
        Some(delimiter) => raw
            .split(*delimiter)
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(String::from)
            .collect(),
        None => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
    }
}

/// Split a generic list field using [`LIST_DELIMITERS`].
pub fn parse_list(raw: &str) -> Vec<String> {
    parse_list_with(raw, LIST_DELIMITERS)
}

pub fn parse_skin_types(raw: &str) -> Vec<String> {
    parse_list_with(raw, LIST_DELIMITERS)
}

pub fn parse_ingredients(raw: &str) -> Vec<String> {
    parse_list_with(raw, INGREDIENT_DELIMITERS)
}

/// Coerce a raw cell to a non-negative price; anything else is `0`.
pub fn parse_price(raw: Option<&Value>) -> f64 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(price) if price.is_finite() && price >= 0.0 => price,
        _ => 0.0,
    }
}

/// Render a cell as text. Numbers keep their JSON form, `null` is absent.
fn cell_text(row: &Map<String, Value>, column: &str) -> Option<String> {
    match row.get(column)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn text_or_empty(row: &Map<String, Value>, column: &str) -> String {
    cell_text(row, column).unwrap_or_default()
}

/// Brand metadata column when non-blank, else the generic brand column,
/// else [`UNKNOWN`].
fn resolve_brand(row: &Map<String, Value>, columns: &ColumnMap) -> String {
    cell_text(row, &columns.brand_meta)
        .filter(|b| !b.trim().is_empty())
        .or_else(|| cell_text(row, &columns.brand))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Parse one row into a [`Product`].
pub fn parse_row(row: &Map<String, Value>, columns: &ColumnMap) -> Product {
    Product {
        id: text_or_empty(row, &columns.id),
        name: text_or_empty(row, &columns.name),
        brand: resolve_brand(row, columns),
        category: cell_text(row, &columns.category).unwrap_or_else(|| UNKNOWN.to_string()),
        price: parse_price(row.get(&columns.price)),
        description: text_or_empty(row, &columns.description),
        sku: text_or_empty(row, &columns.sku),
        skin_types: parse_skin_types(&text_or_empty(row, &columns.skin_types)),
        ingredients: parse_ingredients(&text_or_empty(row, &columns.ingredients)),
        usage: text_or_empty(row, &columns.usage),
        image_urls: None,
        seo_content: None,
        enhanced_description: None,
    }
}

/// Parse every row, preserving order. Output length equals input length.
pub fn parse_all(rows: &[Map<String, Value>], columns: &ColumnMap) -> Vec<Product> {
    let products: Vec<Product> = rows.iter().map(|row| parse_row(row, columns)).collect();
    debug!(count = products.len(), "parsed product rows");
    products
}

/// Parse loosely typed JSON rows. Entries that are not objects carry no
/// row structure and are skipped with a warning naming their index.
pub fn parse_values(rows: &[Value], columns: &ColumnMap) -> Vec<Product> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, value)| match value.as_object() {
            Some(row) => Some(parse_row(row, columns)),
            None => {
                warn!(row = i, "skipping row that is not an object");
                None
            }
        })
        .collect()
}
