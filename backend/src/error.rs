//! Error types for the Livora catalog pipeline.
//!
//! One enum per layer, converted upward with `From` so `?` works across
//! boundaries:
//!
//! - [`IngestError`] - reading and decoding the tabular input
//! - [`EnrichError`] - enrichment collaborator failures
//! - [`ExportError`] - writing tables and documents
//! - [`TaskError`] - task dispatch
//! - [`PipelineError`] - top-level orchestration
//! - [`ServerError`] - HTTP layer
//!
//! Row-level defects are never errors: the record parser normalizes them.

use thiserror::Error;

use crate::tasks::TaskKind;

// =============================================================================
// Ingestion Errors
// =============================================================================

/// The whole input could not be read. Distinct from a readable file with
/// zero data rows, which is `Ok(vec![])`.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes could not be decoded with the detected encoding.
    #[error("Failed to decode input as {encoding}: {message}")]
    Encoding { encoding: String, message: String },

    /// Malformed CSV structure.
    #[error("Invalid CSV at line {line}: {message}")]
    Parse { line: u64, message: String },

    /// Zero bytes, or only whitespace.
    #[error("CSV file is empty")]
    EmptyFile,

    /// Header line present but holds no column names.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for IngestError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map(|p| p.line()).unwrap_or(0);
        IngestError::Parse {
            line,
            message: e.to_string(),
        }
    }
}

// =============================================================================
// Enrichment Errors
// =============================================================================

/// Errors from an enrichment collaborator.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// Missing API key.
    #[error("Missing ANTHROPIC_API_KEY environment variable")]
    MissingApiKey,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Upstream API reported an error.
    #[error("API error: {0}")]
    Api(String),

    /// Response body could not be interpreted.
    #[error("Invalid AI response: {0}")]
    InvalidResponse(String),

    /// The collaborator cannot produce this capability for the product.
    #[error("Enrichment unavailable: {0}")]
    Unavailable(String),

    /// Enrichment fields were already attached to this product.
    #[error("Product '{0}' is already enriched")]
    AlreadyEnriched(String),
}

// =============================================================================
// Export Errors
// =============================================================================

/// Errors while serializing or writing exports.
#[derive(Debug, Error)]
pub enum ExportError {
    /// IO error.
    #[error("Export IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown table schema name.
    #[error("Unknown export schema: {0}")]
    UnknownSchema(String),
}

impl From<csv::IntoInnerError<csv::Writer<Vec<u8>>>> for ExportError {
    fn from(e: csv::IntoInnerError<csv::Writer<Vec<u8>>>) -> Self {
        ExportError::Io(e.into_error())
    }
}

// =============================================================================
// Task Errors
// =============================================================================

/// Errors from task dispatch.
#[derive(Debug, Error)]
pub enum TaskError {
    /// No handler registered for the requested kind.
    #[error("No handler registered for task kind '{0}'")]
    UnknownKind(TaskKind),

    /// Handler received a request of another kind.
    #[error("Handler for '{expected}' cannot run a '{got}' task")]
    KindMismatch { expected: TaskKind, got: TaskKind },

    /// Export failed inside a task.
    #[error("Export task failed: {0}")]
    Export(#[from] ExportError),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input could not be read.
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Enrichment collaborator could not be constructed.
    #[error("Enrichment error: {0}")]
    Enrich(#[from] EnrichError),

    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Configuration file error.
    #[error("Config error: {0}")]
    Config(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Task error.
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for enrichment.
pub type EnrichResult<T> = Result<T, EnrichError>;

/// Result type for exports.
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let ingest_err = IngestError::EmptyFile;
        let pipeline_err: PipelineError = ingest_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        let export_err = ExportError::UnknownSchema("shopify".into());
        let pipeline_err: PipelineError = export_err.into();
        assert!(pipeline_err.to_string().contains("shopify"));
    }

    #[test]
    fn test_task_error_names_kind() {
        let err = TaskError::KindMismatch {
            expected: TaskKind::Parse,
            got: TaskKind::Export,
        };
        let msg = err.to_string();
        assert!(msg.contains("parse"));
        assert!(msg.contains("export"));
    }
}
