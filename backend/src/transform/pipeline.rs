//! High-level pipeline API: CSV in, catalog exports out.
//!
//! Combines every step: ingestion, record parsing, optional enrichment,
//! aggregation, sitemap, document assembly and validation.
//!
//! # Example
//!
//! ```rust,ignore
//! use livora::{process_file, write_outputs, CatalogConfig, TemplateEnricher};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = CatalogConfig::default();
//!     let enricher = TemplateEnricher::new(&config);
//!     let run = process_file(Path::new("catalog.csv"), &config, Some(&enricher)).await?;
//!
//!     println!("{} products, {} brands", run.products.len(), run.brands.len());
//!     write_outputs(&run, &config)?;
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::aggregate::{aggregate, slug_collisions, slugify};
use super::sitemap::build_sitemap;
use crate::ai::{enrich_all, EnrichOptions, Enricher, EnrichmentReport};
use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::config::CatalogConfig;
use crate::error::PipelineResult;
use crate::export::{export_json, export_table, SiteDocuments};
use crate::models::{AggregateMap, ExportSchema, Product, SitemapEntry};
use crate::parser::{parse_all, parse_bytes_auto, parse_csv_file_auto, ParseResult};
use crate::validation::validate_documents;

/// CSV file information
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl From<&ParseResult> for CsvInfo {
    fn from(result: &ParseResult) -> Self {
        Self {
            encoding: result.encoding.clone(),
            delimiter: result.delimiter,
            headers: result.headers.clone(),
            row_count: result.records.len(),
        }
    }
}

/// Two aggregates whose names produce the same slug.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SlugCollision {
    pub kind: String,
    pub slug: String,
    pub first: String,
    pub second: String,
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogRun {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_info: Option<CsvInfo>,
    pub products: Vec<Product>,
    pub brands: AggregateMap,
    pub categories: AggregateMap,
    pub sitemap: Vec<SitemapEntry>,
    pub documents: SiteDocuments,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentReport>,
    pub slug_collisions: Vec<SlugCollision>,
    /// `(document, messages)` for documents that failed schema validation.
    pub validation_errors: Vec<(String, Vec<String>)>,
}

/// Run the catalog pipeline over already-ingested rows.
///
/// Enrichment, when an enricher is given, completes before aggregation
/// reads any product.
pub async fn run_catalog(
    records: &[Map<String, Value>],
    config: &CatalogConfig,
    enricher: Option<&dyn Enricher>,
) -> CatalogRun {
    log_info(format!("🧴 Parsing {} rows...", records.len()));
    let products = parse_all(records, &config.columns);
    log_success(format!("{} products", products.len()));

    let (products, enrichment) = match enricher {
        Some(enricher) => {
            log_info(format!(
                "✨ Enriching with '{}' (up to {} at a time)...",
                enricher.name(),
                config.max_products_per_batch
            ));
            let (products, report) =
                enrich_all(products, enricher, &EnrichOptions::from_config(config)).await;
            print_enrichment_report(&report);
            (products, Some(report))
        }
        None => (products, None),
    };

    log_info("📦 Grouping by brand and category...");
    let (brands, categories) = aggregate(&products, &config.store_name);
    log_success(format!("{} brands, {} categories", brands.len(), categories.len()));

    let collisions = find_collisions(&brands, &categories);
    for c in &collisions {
        log_warning(format!(
            "{} slug '{}' shared by '{}' and '{}'",
            c.kind, c.slug, c.first, c.second
        ));
    }

    let sitemap = build_sitemap(&brands, &categories);
    log_success(format!("Sitemap with {} URLs", sitemap.len()));

    let documents = export_json(&products, &brands, &categories, &sitemap, &config.store_name);

    log_info("✔️  Validating documents...");
    let validation_errors = validate_documents(&documents);
    if validation_errors.is_empty() {
        log_success("All documents valid");
    } else {
        for (name, errors) in &validation_errors {
            log_warning(format!("{}.json: {} schema violation(s)", name, errors.len()));
            for e in errors.iter().take(3) {
                log_error(format!("{}: {}", name, e));
            }
        }
    }

    CatalogRun {
        csv_info: None,
        products,
        brands,
        categories,
        sitemap,
        documents,
        enrichment,
        slug_collisions: collisions,
        validation_errors,
    }
}

/// Ingest CSV bytes and run the pipeline.
pub async fn process_bytes(
    bytes: &[u8],
    config: &CatalogConfig,
    enricher: Option<&dyn Enricher>,
) -> PipelineResult<CatalogRun> {
    log_info("📖 Reading CSV...");
    let parsed = parse_bytes_auto(bytes)?;
    process_parsed(parsed, config, enricher).await
}

/// Ingest a CSV file and run the pipeline.
pub async fn process_file(
    path: &Path,
    config: &CatalogConfig,
    enricher: Option<&dyn Enricher>,
) -> PipelineResult<CatalogRun> {
    log_info(format!("📖 Reading {}...", path.display()));
    let parsed = parse_csv_file_auto(path)?;
    process_parsed(parsed, config, enricher).await
}

async fn process_parsed(
    parsed: ParseResult,
    config: &CatalogConfig,
    enricher: Option<&dyn Enricher>,
) -> PipelineResult<CatalogRun> {
    let csv_info = CsvInfo::from(&parsed);
    log_success(format!("Detected encoding: {}", csv_info.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(csv_info.delimiter)));
    log_success(format!("Read {} rows, {} columns", csv_info.row_count, csv_info.headers.len()));

    if parsed.records.is_empty() {
        log_warning("CSV has a header but no data rows");
    }

    let mut run = run_catalog(&parsed.records, config, enricher).await;
    run.csv_info = Some(csv_info);
    Ok(run)
}

/// Write both tables to `output_dir` and the document set to its `json/`
/// subdirectory. Returns every written path.
pub fn write_outputs(run: &CatalogRun, config: &CatalogConfig) -> PipelineResult<Vec<PathBuf>> {
    let mut written = Vec::new();

    for schema in [ExportSchema::Commerce, ExportSchema::Enhanced] {
        let path = export_table(&run.products, schema).write_to(&config.output_dir)?;
        log_success(format!("Wrote {}", path.display()));
        written.push(path);
    }

    let docs = run.documents.write_to_dir(&config.json_dir())?;
    log_success(format!("Wrote {} documents to {}", docs.len(), config.json_dir().display()));
    written.extend(docs);

    Ok(written)
}

fn find_collisions(brands: &AggregateMap, categories: &AggregateMap) -> Vec<SlugCollision> {
    [brands, categories]
        .into_iter()
        .flat_map(|map| {
            let kind = map.kind().path_segment();
            slug_collisions(map)
                .into_iter()
                .map(move |(first, second)| SlugCollision {
                    kind: kind.to_string(),
                    slug: slugify(&first),
                    first,
                    second,
                })
        })
        .collect()
}

fn print_enrichment_report(report: &EnrichmentReport) {
    log_success(format!("{}/{} products enriched", report.enriched, report.attempted));
    if !report.skipped.is_empty() {
        log_warning(format!("{} already enriched, skipped", report.skipped.len()));
    }
    if !report.failures.is_empty() {
        log_warning(format!("{} capability failures", report.failures.len()));
        for f in report.failures.iter().take(3) {
            log_error(format!("{} ({:?}): {}", f.product, f.capability, f.error));
        }
    }
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}
