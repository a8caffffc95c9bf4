//! Task dispatch over the catalog operations.
//!
//! A closed set of [`TaskKind`]s, each served by one registered
//! [`TaskHandler`]. Requests arrive as tagged JSON:
//!
//! ```json
//! { "task": "aggregate", "products": [ ... ] }
//! ```
//!
//! [`TaskDispatcher::run_workflow`] runs several requests in order and
//! stops at the first failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::ai::{enrich_all, EnrichOptions, Enricher, EnrichmentReport};
use crate::config::{CatalogConfig, ColumnMap};
use crate::error::TaskError;
use crate::export::{brand_pages, category_pages, export_table, BrandPage, CategoryPage, ExportTable, PageMap};
use crate::models::{ExportSchema, Product, SitemapEntry};
use crate::parser::parse_values;
use crate::transform::{aggregate, build_sitemap};

// =============================================================================
// Requests and outputs
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Parse,
    Aggregate,
    Export,
    Enrich,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [Self::Parse, Self::Aggregate, Self::Export, Self::Enrich];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Aggregate => "aggregate",
            Self::Export => "export",
            Self::Enrich => "enrich",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "lowercase")]
pub enum TaskRequest {
    /// Raw rows keyed by column name.
    Parse { rows: Vec<Value> },
    Aggregate { products: Vec<Product> },
    Export {
        products: Vec<Product>,
        #[serde(default)]
        format: ExportSchema,
    },
    Enrich { products: Vec<Product> },
}

impl TaskRequest {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Parse { .. } => TaskKind::Parse,
            Self::Aggregate { .. } => TaskKind::Aggregate,
            Self::Export { .. } => TaskKind::Export,
            Self::Enrich { .. } => TaskKind::Enrich,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "task", rename_all = "lowercase")]
pub enum TaskOutput {
    Parse {
        products: Vec<Product>,
    },
    Aggregate {
        brands: PageMap<BrandPage>,
        categories: PageMap<CategoryPage>,
        sitemap: Vec<SitemapEntry>,
    },
    Export {
        table: ExportTable,
        path: PathBuf,
    },
    Enrich {
        products: Vec<Product>,
        report: EnrichmentReport,
    },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Completed,
    Failed,
}

/// Result of one task in a workflow.
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub id: String,
    pub kind: TaskKind,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<TaskOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Serves one [`TaskKind`].
#[async_trait]
pub trait TaskHandler: Send + Sync {
    fn kind(&self) -> TaskKind;

    async fn handle(&self, request: TaskRequest) -> Result<TaskOutput, TaskError>;
}

fn mismatch(expected: TaskKind, request: &TaskRequest) -> TaskError {
    TaskError::KindMismatch {
        expected,
        got: request.kind(),
    }
}

pub struct ParseHandler {
    columns: ColumnMap,
}

#[async_trait]
impl TaskHandler for ParseHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::Parse
    }

    async fn handle(&self, request: TaskRequest) -> Result<TaskOutput, TaskError> {
        match request {
            TaskRequest::Parse { rows } => Ok(TaskOutput::Parse {
                products: parse_values(&rows, &self.columns),
            }),
            other => Err(mismatch(self.kind(), &other)),
        }
    }
}

pub struct AggregateHandler {
    store_name: String,
}

#[async_trait]
impl TaskHandler for AggregateHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::Aggregate
    }

    async fn handle(&self, request: TaskRequest) -> Result<TaskOutput, TaskError> {
        match request {
            TaskRequest::Aggregate { products } => {
                let (brands, categories) = aggregate(&products, &self.store_name);
                Ok(TaskOutput::Aggregate {
                    sitemap: build_sitemap(&brands, &categories),
                    brands: brand_pages(&products, &brands),
                    categories: category_pages(&products, &categories),
                })
            }
            other => Err(mismatch(self.kind(), &other)),
        }
    }
}

/// Renders the table and writes it under the output directory.
pub struct ExportHandler {
    output_dir: PathBuf,
}

#[async_trait]
impl TaskHandler for ExportHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::Export
    }

    async fn handle(&self, request: TaskRequest) -> Result<TaskOutput, TaskError> {
        match request {
            TaskRequest::Export { products, format } => {
                let table = export_table(&products, format);
                let path = table.write_to(&self.output_dir)?;
                Ok(TaskOutput::Export { table, path })
            }
            other => Err(mismatch(self.kind(), &other)),
        }
    }
}

pub struct EnrichHandler {
    enricher: Arc<dyn Enricher>,
    options: EnrichOptions,
}

#[async_trait]
impl TaskHandler for EnrichHandler {
    fn kind(&self) -> TaskKind {
        TaskKind::Enrich
    }

    async fn handle(&self, request: TaskRequest) -> Result<TaskOutput, TaskError> {
        match request {
            TaskRequest::Enrich { products } => {
                let (products, report) = enrich_all(products, self.enricher.as_ref(), &self.options).await;
                Ok(TaskOutput::Enrich { products, report })
            }
            other => Err(mismatch(self.kind(), &other)),
        }
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Lookup table from task kind to handler.
#[derive(Default)]
pub struct TaskDispatcher {
    handlers: HashMap<TaskKind, Box<dyn TaskHandler>>,
}

impl TaskDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with a handler for every kind.
    pub fn with_defaults(config: &CatalogConfig, enricher: Arc<dyn Enricher>) -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(Box::new(ParseHandler {
            columns: config.columns.clone(),
        }));
        dispatcher.register(Box::new(AggregateHandler {
            store_name: config.store_name.clone(),
        }));
        dispatcher.register(Box::new(ExportHandler {
            output_dir: config.output_dir.clone(),
        }));
        dispatcher.register(Box::new(EnrichHandler {
            enricher,
            options: EnrichOptions::from_config(config),
        }));
        dispatcher
    }

    /// Register `handler`, replacing any previous handler for its kind.
    pub fn register(&mut self, handler: Box<dyn TaskHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    /// Registered kinds in declaration order.
    pub fn kinds(&self) -> Vec<TaskKind> {
        TaskKind::ALL
            .into_iter()
            .filter(|k| self.handlers.contains_key(k))
            .collect()
    }

    pub async fn dispatch(&self, request: TaskRequest) -> Result<TaskOutput, TaskError> {
        let kind = request.kind();
        let handler = self.handlers.get(&kind).ok_or(TaskError::UnknownKind(kind))?;
        handler.handle(request).await
    }

    /// Run `requests` in order. The first failure ends the workflow; its
    /// report is the last one returned.
    pub async fn run_workflow(&self, requests: Vec<TaskRequest>) -> Vec<TaskReport> {
        let total = requests.len();
        let mut reports = Vec::with_capacity(total);

        for (i, request) in requests.into_iter().enumerate() {
            let kind = request.kind();
            let started_at = Utc::now();
            let result = self.dispatch(request).await;
            let finished_at = Utc::now();

            let (status, output, error) = match result {
                Ok(output) => (TaskStatus::Completed, Some(output), None),
                Err(e) => (TaskStatus::Failed, None, Some(e.to_string())),
            };

            reports.push(TaskReport {
                id: Uuid::new_v4().to_string(),
                kind,
                status,
                output,
                error,
                started_at,
                finished_at,
            });

            if status == TaskStatus::Failed {
                warn!(step = i + 1, total, %kind, "workflow stopped at failed task");
                break;
            }
            info!(step = i + 1, total, %kind, "task completed");
        }

        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::TemplateEnricher;
    use serde_json::json;
    use tempfile::TempDir;

    fn dispatcher(output_dir: PathBuf) -> TaskDispatcher {
        let config = CatalogConfig {
            output_dir,
            ..CatalogConfig::default()
        };
        let enricher: Arc<dyn Enricher> = Arc::new(TemplateEnricher::new(&config));
        TaskDispatcher::with_defaults(&config, enricher)
    }

    fn products() -> Vec<Product> {
        vec![
            Product { sku: "A1".into(), brand: "Acme".into(), category: "Skin".into(), ..Product::default() },
            Product { sku: "Z1".into(), brand: "Zed".into(), category: "Skin".into(), ..Product::default() },
        ]
    }

    #[test]
    fn test_request_deserializes_from_tag() {
        let request: TaskRequest = serde_json::from_value(json!({
            "task": "export",
            "products": [],
            "format": "enhanced"
        }))
        .unwrap();

        assert_eq!(request.kind(), TaskKind::Export);
        assert!(matches!(request, TaskRequest::Export { format: ExportSchema::Enhanced, .. }));
    }

    #[test]
    fn test_export_format_defaults_to_commerce() {
        let request: TaskRequest = serde_json::from_value(json!({ "task": "export", "products": [] })).unwrap();
        assert!(matches!(request, TaskRequest::Export { format: ExportSchema::Commerce, .. }));
    }

    #[test]
    fn test_unknown_task_tag_rejected() {
        let result: Result<TaskRequest, _> = serde_json::from_value(json!({ "task": "scrape" }));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_parse() {
        let dir = TempDir::new().unwrap();
        let output = dispatcher(dir.path().to_path_buf())
            .dispatch(TaskRequest::Parse {
                rows: vec![json!({ "Name": "Cream", "Brand": "Acme" }), json!(7)],
            })
            .await
            .unwrap();

        match output {
            TaskOutput::Parse { products } => {
                assert_eq!(products.len(), 1);
                assert_eq!(products[0].brand, "Acme");
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_aggregate() {
        let dir = TempDir::new().unwrap();
        let output = dispatcher(dir.path().to_path_buf())
            .dispatch(TaskRequest::Aggregate { products: products() })
            .await
            .unwrap();

        match output {
            TaskOutput::Aggregate { brands, sitemap, .. } => {
                assert_eq!(brands.names(), vec!["Acme", "Zed"]);
                assert_eq!(sitemap.len(), 7);
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_export_writes_file() {
        let dir = TempDir::new().unwrap();
        let output = dispatcher(dir.path().to_path_buf())
            .dispatch(TaskRequest::Export { products: products(), format: ExportSchema::Commerce })
            .await
            .unwrap();

        match output {
            TaskOutput::Export { table, path } => {
                assert_eq!(table.len(), 2);
                assert!(path.starts_with(dir.path()));
                assert!(path.exists());
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unregistered_kind() {
        let err = TaskDispatcher::new()
            .dispatch(TaskRequest::Enrich { products: vec![] })
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::UnknownKind(TaskKind::Enrich)));
    }

    #[tokio::test]
    async fn test_handler_rejects_other_kind() {
        let handler = ParseHandler { columns: ColumnMap::default() };
        let err = handler.handle(TaskRequest::Aggregate { products: vec![] }).await.unwrap_err();
        assert!(matches!(
            err,
            TaskError::KindMismatch { expected: TaskKind::Parse, got: TaskKind::Aggregate }
        ));
    }

    #[tokio::test]
    async fn test_workflow_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let mut partial = TaskDispatcher::new();
        partial.register(Box::new(ParseHandler { columns: ColumnMap::default() }));
        partial.register(Box::new(ExportHandler { output_dir: dir.path().to_path_buf() }));

        let reports = partial
            .run_workflow(vec![
                TaskRequest::Parse { rows: vec![json!({ "Name": "a" })] },
                TaskRequest::Enrich { products: products() },
                TaskRequest::Export { products: products(), format: ExportSchema::Enhanced },
            ])
            .await;

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].status, TaskStatus::Completed);
        assert_eq!(reports[1].status, TaskStatus::Failed);
        assert!(reports[1].error.as_deref().unwrap().contains("enrich"));
        assert_eq!(partial.kinds(), vec![TaskKind::Parse, TaskKind::Export]);
    }

    #[tokio::test]
    async fn test_workflow_all_kinds() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(dir.path().to_path_buf());
        assert_eq!(d.kinds(), TaskKind::ALL.to_vec());

        let reports = d
            .run_workflow(vec![
                TaskRequest::Enrich { products: products() },
                TaskRequest::Aggregate { products: products() },
            ])
            .await;

        assert!(reports.iter().all(|r| r.status == TaskStatus::Completed));
        let json = serde_json::to_value(&reports[0]).unwrap();
        assert_eq!(json["kind"], "enrich");
        assert_eq!(json["output"]["report"]["enriched"], 2);
    }
}
