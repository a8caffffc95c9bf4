//! # Livora - beauty catalog ingestion and storefront export
//!
//! Livora turns a merchant's product spreadsheet into everything a storefront
//! needs: a commerce-platform import table, an enhanced product table, brand
//! and category landing-page documents, a product document and a sitemap.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Enricher   │────▶│ Aggregator  │────▶│  Exporters  │
//! │  (ISO/UTF8) │     │  (records)  │     │ (optional)  │     │  + sitemap  │     │ (CSV, JSON) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use livora::{process_file, write_outputs, CatalogConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = CatalogConfig::default();
//!     let run = process_file(Path::new("catalog.csv"), &config, None).await.unwrap();
//!     write_outputs(&run, &config).unwrap();
//!     println!("{} brands, {} categories", run.brands.len(), run.categories.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Run configuration
//! - [`models`] - Product, aggregates, sitemap entries
//! - [`parser`] - CSV ingestion and record parsing
//! - [`transform`] - Aggregation, sitemap and the pipeline
//! - [`export`] - Commerce tables and storefront documents
//! - [`ai`] - Enrichment (template and AI)
//! - [`validation`] - JSON schema checks for generated documents
//! - [`tasks`] - Tagged task dispatch
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;
pub mod validation;

// Enrichment
pub mod ai;

// Dispatch and HTTP API
pub mod api;
pub mod tasks;

// =============================================================================
// Re-exports - Errors and configuration
// =============================================================================

pub use config::{CatalogConfig, ColumnMap};
pub use error::{
    EnrichError, ExportError, IngestError, PipelineError, PipelineResult, ServerError, TaskError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Aggregate, AggregateKind, AggregateMap, ChangeFreq, Enrichment, ExportSchema, Product,
    SeoContent, SitemapEntry,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    detect_delimiter, detect_encoding, parse_all, parse_bytes_auto, parse_csv_file_auto,
    parse_price, parse_row, ParseResult,
};

// =============================================================================
// Re-exports - Transform and export
// =============================================================================

pub use export::{export_json, export_table, ExportTable, SiteDocuments};
pub use transform::{
    aggregate, build_sitemap, process_bytes, process_file, run_catalog, slugify, write_outputs,
    CatalogRun, CsvInfo,
};

// =============================================================================
// Re-exports - Enrichment and tasks
// =============================================================================

pub use ai::{enrich_all, AiClient, AiEnricher, EnrichOptions, Enricher, EnrichmentReport, TemplateEnricher};
pub use tasks::{TaskDispatcher, TaskKind, TaskOutput, TaskRequest};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
