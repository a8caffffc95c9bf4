//! HTTP server for the Livora catalog API.
//!
//! # API Endpoints
//!
//! | Method | Path                   | Description                              |
//! |--------|------------------------|------------------------------------------|
//! | GET    | `/`, `/health`         | Health check                             |
//! | POST   | `/api/upload`          | Upload CSV, get parsed products          |
//! | POST   | `/api/enhance`         | Enrich a product list                    |
//! | POST   | `/api/brand-pages`     | Brand page document for a product list   |
//! | POST   | `/api/export`          | Product list as a CSV attachment         |
//! | POST   | `/api/json-pages`      | Write the JSON document set              |
//! | GET    | `/api/download/{file}` | Fetch a generated JSON document          |
//! | POST   | `/api/tasks`           | Run one tagged task                      |
//! | POST   | `/api/workflow`        | Upload CSV and run the full pipeline     |
//! | GET    | `/api/logs`            | SSE stream for real-time logs            |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderValue, Method},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use futures::stream::Stream;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{
    EnhanceResponse, ExportRequest, JsonPagesResponse, ProductsRequest, UploadResponse,
    WorkflowResponse,
};
use crate::ai::{enrich_all, EnrichOptions, Enricher};
use crate::config::CatalogConfig;
use crate::error::{PipelineError, ServerError};
use crate::export::{brand_pages, export_json, export_table, BrandPage, PageMap};
use crate::parser::{parse_all, parse_bytes_auto};
use crate::tasks::{TaskDispatcher, TaskOutput, TaskRequest};
use crate::transform::{aggregate, build_sitemap, process_bytes, write_outputs, CsvInfo};

/// Uploads larger than this are rejected.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

static DOCUMENT_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+\.json$").expect("static pattern compiles"));

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CatalogConfig>,
    pub enricher: Arc<dyn Enricher>,
    pub dispatcher: Arc<TaskDispatcher>,
}

impl AppState {
    pub fn new(config: CatalogConfig, enricher: Arc<dyn Enricher>) -> Self {
        let dispatcher = TaskDispatcher::with_defaults(&config, enricher.clone());
        Self {
            config: Arc::new(config),
            enricher,
            dispatcher: Arc::new(dispatcher),
        }
    }
}

/// Build the router with CORS for the configured origins.
pub fn router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_csv))
        .route("/api/enhance", post(enhance_products))
        .route("/api/brand-pages", post(generate_brand_pages))
        .route("/api/export", post(export_csv))
        .route("/api/json-pages", post(generate_json_pages))
        .route("/api/download/{file}", get(download_json))
        .route("/api/tasks", post(run_task))
        .route("/api/workflow", post(run_workflow))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(
    config: CatalogConfig,
    enricher: Arc<dyn Enricher>,
) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.server.port;
    let app = router(AppState::new(config, enricher));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "Livora catalog API listening");
    info!("POST /api/upload, /api/workflow - CSV uploads");
    info!("GET  /api/logs - SSE log stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "livora",
        "version": env!("CARGO_PKG_VERSION"),
        "enricher": state.enricher.name(),
        "timestamp": Utc::now(),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Only `.csv` file names are accepted.
fn check_csv_name(name: &str) -> Result<(), ServerError> {
    if name.to_lowercase().ends_with(".csv") {
        Ok(())
    } else {
        Err(ServerError::BadRequest("Only CSV files are allowed".to_string()))
    }
}

/// Read the `file` field of a multipart upload.
async fn read_csv_upload(mut multipart: Multipart) -> Result<(String, Vec<u8>), ServerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or_default().to_string();
        check_csv_name(&name)?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;

        log_info(format!("📄 Upload: {} ({} bytes)", name, bytes.len()));
        return Ok((name, bytes.to_vec()));
    }

    Err(ServerError::BadRequest("No file provided".to_string()))
}

/// Upload CSV endpoint
async fn upload_csv(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let (name, bytes) = read_csv_upload(multipart).await?;

    let parsed = parse_bytes_auto(&bytes).map_err(PipelineError::from)?;
    let csv_info = CsvInfo::from(&parsed);
    let products = parse_all(&parsed.records, &state.config.columns);

    Ok(Json(UploadResponse::new(name, products, csv_info)))
}

async fn enhance_products(
    State(state): State<AppState>,
    Json(request): Json<ProductsRequest>,
) -> Json<EnhanceResponse> {
    let options = EnrichOptions::from_config(&state.config);
    let (products, report) = enrich_all(request.products, state.enricher.as_ref(), &options).await;

    Json(EnhanceResponse {
        status: if report.is_clean() { "success" } else { "warning" }.to_string(),
        products,
        report,
    })
}

async fn generate_brand_pages(
    State(state): State<AppState>,
    Json(request): Json<ProductsRequest>,
) -> Json<PageMap<BrandPage>> {
    let (brands, _) = aggregate(&request.products, &state.config.store_name);
    Json(brand_pages(&request.products, &brands))
}

/// Product list rendered as a CSV download.
async fn export_csv(Json(request): Json<ExportRequest>) -> Result<Response, ServerError> {
    let table = export_table(&request.products, request.format);
    let bytes = table
        .to_csv_bytes()
        .map_err(|e| ServerError::Pipeline(e.into()))?;
    let disposition = format!("attachment; filename=\"{}\"", table.file_name());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn generate_json_pages(
    State(state): State<AppState>,
    Json(request): Json<ProductsRequest>,
) -> Result<Json<JsonPagesResponse>, ServerError> {
    let config = &state.config;
    let (brands, categories) = aggregate(&request.products, &config.store_name);
    let sitemap = build_sitemap(&brands, &categories);
    let documents = export_json(&request.products, &brands, &categories, &sitemap, &config.store_name);

    let files = documents
        .write_to_dir(&config.json_dir())
        .map_err(|e| ServerError::Pipeline(e.into()))?;

    Ok(Json(JsonPagesResponse {
        status: "success".to_string(),
        files: files
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect(),
        brands_count: brands.len(),
        categories_count: categories.len(),
        sitemap_entries: sitemap.len(),
    }))
}

async fn download_json(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, ServerError> {
    if !DOCUMENT_FILE.is_match(&file) {
        return Err(ServerError::BadRequest(format!("Invalid file name: {}", file)));
    }

    let path = state.config.json_dir().join(&file);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ServerError::NotFound(file.clone()))?;

    Ok(([(header::CONTENT_TYPE, "application/json")], bytes).into_response())
}

async fn run_task(
    State(state): State<AppState>,
    Json(request): Json<TaskRequest>,
) -> Result<Json<TaskOutput>, ServerError> {
    log_info(format!("🤖 Task: {}", request.kind()));
    let output = state.dispatcher.dispatch(request).await?;
    Ok(Json(output))
}

/// Upload a CSV and run parse, enrich, aggregate and export in one go.
async fn run_workflow(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<WorkflowResponse>, ServerError> {
    let (_, bytes) = read_csv_upload(multipart).await?;
    let config = state.config.as_ref();

    let run = process_bytes(&bytes, config, Some(state.enricher.as_ref())).await?;
    let files = write_outputs(&run, config)?;

    let clean = run.validation_errors.is_empty()
        && run.enrichment.as_ref().map_or(true, |r| r.is_clean());

    Ok(Json(WorkflowResponse {
        job_id: Uuid::new_v4().to_string(),
        status: if clean { "success" } else { "warning" }.to_string(),
        products_processed: run.products.len(),
        brands_generated: run.brands.len(),
        categories_generated: run.categories.len(),
        files_generated: files.iter().map(|p| p.display().to_string()).collect(),
        enrichment: run.enrichment,
        slug_collisions: run.slug_collisions,
        validation_errors: run.validation_errors,
        timestamp: Utc::now(),
    }))
}
