//! REST API request and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::ai::EnrichmentReport;
use crate::error::{PipelineError, ServerError, TaskError};
use crate::models::{ExportSchema, Product};
use crate::transform::{CsvInfo, SlugCollision};

/// Rows echoed back as a preview after upload.
pub const PREVIEW_ROWS: usize = 10;

/// Body of the endpoints that operate on a product list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsRequest {
    #[serde(default)]
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub format: ExportSchema,
}

/// CSV file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl From<CsvInfo> for CsvMetadata {
    fn from(info: CsvInfo) -> Self {
        Self {
            encoding: info.encoding,
            delimiter: info.delimiter.to_string(),
            row_count: info.row_count,
            columns: info.headers,
        }
    }
}

/// Response sent after a CSV upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: String,
    /// "ready" with products, "empty" for a header-only file
    pub status: String,
    pub filename: String,
    pub total_products: usize,
    pub products: Vec<Product>,
    pub preview: Vec<Product>,
    pub csv_info: CsvMetadata,
}

impl UploadResponse {
    pub fn new(filename: String, products: Vec<Product>, csv_info: CsvInfo) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: if products.is_empty() { "empty" } else { "ready" }.to_string(),
            filename,
            total_products: products.len(),
            preview: products.iter().take(PREVIEW_ROWS).cloned().collect(),
            products,
            csv_info: csv_info.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceResponse {
    pub status: String,
    pub products: Vec<Product>,
    pub report: EnrichmentReport,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPagesResponse {
    pub status: String,
    pub files: Vec<String>,
    pub brands_count: usize,
    pub categories_count: usize,
    pub sitemap_entries: usize,
}

/// Summary of a full pipeline run started from an upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResponse {
    pub job_id: String,
    /// "success", or "warning" when enrichment or validation reported problems
    pub status: String,
    pub products_processed: usize,
    pub brands_generated: usize,
    pub categories_generated: usize,
    pub files_generated: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentReport>,
    pub slug_collisions: Vec<SlugCollision>,
    pub validation_errors: Vec<(String, Vec<String>)>,
    pub timestamp: DateTime<Utc>,
}

/// Create an error response body
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Pipeline(PipelineError::Ingest(_)) => StatusCode::BAD_REQUEST,
            Self::Task(TaskError::UnknownKind(_) | TaskError::KindMismatch { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Pipeline(_) | Self::Task(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExportError, IngestError};
    use crate::tasks::TaskKind;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServerError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServerError::from(PipelineError::from(IngestError::EmptyFile)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(TaskError::UnknownKind(TaskKind::Enrich)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::from(TaskError::from(ExportError::UnknownSchema("x".into()))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upload_response_preview_is_capped() {
        let products: Vec<Product> = (0..25).map(|i| Product { id: i.to_string(), ..Product::default() }).collect();
        let info = CsvInfo { encoding: "utf-8".into(), delimiter: ',', headers: vec!["ID".into()], row_count: 25 };
        let response = UploadResponse::new("catalog.csv".into(), products, info);

        assert_eq!(response.status, "ready");
        assert_eq!(response.total_products, 25);
        assert_eq!(response.preview.len(), PREVIEW_ROWS);
        assert_eq!(response.csv_info.delimiter, ",");
    }

    #[test]
    fn test_export_request_defaults() {
        let request: ExportRequest = serde_json::from_str("{}").unwrap();
        assert!(request.products.is_empty());
        assert_eq!(request.format, ExportSchema::Commerce);

        let request: ExportRequest = serde_json::from_str(r#"{ "format": "woocommerce" }"#).unwrap();
        assert_eq!(request.format, ExportSchema::Commerce);
    }

    #[test]
    fn test_error_response_shape() {
        let body = error_response("boom");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "boom");
    }
}
