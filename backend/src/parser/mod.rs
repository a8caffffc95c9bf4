//! Tabular ingestion with encoding and delimiter auto-detection.
//!
//! Turns CSV bytes into JSON objects keyed by header. The record parser in
//! [`record`] then maps those objects onto [`crate::models::Product`].

pub mod record;

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{IngestError, IngestResult};

pub use record::{
    parse_all, parse_ingredients, parse_list, parse_list_with, parse_price, parse_row,
    parse_skin_types, parse_values, INGREDIENT_DELIMITERS, LIST_DELIMITERS,
};

const UTF8_BOM: char = '\u{feff}';

/// Parsed table with detection metadata.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// One JSON object per data row.
    pub records: Vec<Map<String, Value>>,
    /// Detected or used encoding.
    pub encoding: String,
    /// Detected or used delimiter.
    pub delimiter: char,
    /// Column headers.
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        "windows-1256" | "cp1256" => "windows-1256".to_string(),
        _ => charset,
    }
}

/// Decode bytes with the given encoding and drop a leading BOM.
pub fn decode_content(bytes: &[u8], encoding: &str) -> IngestResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).into_owned(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        "windows-1256" | "cp1256" => encoding_rs::WINDOWS_1256.decode(bytes).0.into_owned(),
        other => {
            let codec = encoding_rs::Encoding::for_label(other.as_bytes()).ok_or_else(|| {
                IngestError::Encoding {
                    encoding: other.to_string(),
                    message: "unsupported encoding label".to_string(),
                }
            })?;
            codec.decode(bytes).0.into_owned()
        }
    };

    Ok(decoded
        .strip_prefix(UTF8_BOM)
        .map(str::to_string)
        .unwrap_or(decoded))
}

/// Detect the delimiter by counting occurrences in the header line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV text with an explicit delimiter.
///
/// Fields may be quoted and contain the delimiter or newlines. Short rows
/// are padded with empty strings; extra cells are ignored. Blank and
/// whitespace-only lines are skipped, but a row of empty cells (`,,`) is a
/// record.
///
/// # Example
/// ```ignore
/// let rows = livora::parser::csv_to_json("Name,SKU\nCream,A1", ',').unwrap();
/// assert_eq!(rows[0]["SKU"], "A1");
/// ```
pub fn csv_to_json(content: &str, delimiter: char) -> IngestResult<Vec<Map<String, Value>>> {
    parse_string(content, delimiter, "utf-8".to_string()).map(|r| r.records)
}

/// Parse CSV text with an explicit delimiter, returning metadata.
pub fn parse_string(content: &str, delimiter: char, encoding: String) -> IngestResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(IngestError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter_byte(delimiter)?)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_matches(UTF8_BOM).to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(IngestError::NoHeaders);
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        // Whitespace-only line; rows of empty cells are kept.
        if headers.len() > 1 && row.len() == 1 && row.get(0) == Some("") {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = row.get(i).unwrap_or("");
            obj.insert(header.clone(), Value::String(value.to_string()));
        }
        records.push(obj);
    }

    Ok(ParseResult {
        records,
        encoding,
        delimiter,
        headers,
    })
}

fn delimiter_byte(delimiter: char) -> IngestResult<u8> {
    u8::try_from(delimiter).map_err(|_| IngestError::Parse {
        line: 0,
        message: format!("delimiter '{}' is not a single-byte character", delimiter),
    })
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> IngestResult<ParseResult> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(IngestError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_string(&content, delimiter, encoding)
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> IngestResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}
