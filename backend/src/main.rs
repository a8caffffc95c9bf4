//! Livora CLI - catalog CSV to commerce tables and storefront documents
//!
//! # Commands
//!
//! ```bash
//! livora run catalog.csv                   # Full pipeline, template enrichment
//! livora run catalog.csv --enrich ai       # Descriptions from the AI collaborator
//! livora serve                             # Start HTTP server (port 8000)
//! ```
//!
//! # Single steps
//!
//! ```bash
//! livora parse catalog.csv                 # Parsed products as JSON
//! livora export catalog.csv -f enhanced    # One flat table, no enrichment
//! livora pages catalog.csv                 # Brand/category/sitemap documents
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use livora::{
    aggregate, build_sitemap, export_json, export_table, parse_all, parse_csv_file_auto,
    process_file, write_outputs, AiEnricher, CatalogConfig, Enricher, ExportSchema,
    TemplateEnricher,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "livora")]
#[command(about = "Turn a beauty catalog CSV into commerce imports and storefront pages", long_about = None)]
struct Cli {
    /// JSON config file (missing keys keep their defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output products as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Full pipeline: CSV -> products -> enrichment -> tables + documents
    Run {
        /// Input CSV file
        input: PathBuf,

        /// Enrichment collaborator
        #[arg(short, long, value_enum, default_value = "template")]
        enrich: EnrichMode,

        /// Output directory (overrides config)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Export one flat table without enrichment
    Export {
        /// Input CSV file
        input: PathBuf,

        /// Table layout: commerce (alias woocommerce) or enhanced
        #[arg(short, long, default_value = "commerce")]
        format: ExportSchema,

        /// Output file (default: timestamped file in the output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write the storefront JSON documents without enrichment
    Pages {
        /// Input CSV file
        input: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Enrichment collaborator for /api/enhance and /api/workflow
        #[arg(short, long, value_enum, default_value = "template")]
        enrich: EnrichMode,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EnrichMode {
    Template,
    Ai,
    None,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match CatalogConfig::load(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Parse { input, output } => cmd_parse(&input, output.as_deref(), &config),

            Commands::Run {
                input,
                enrich,
                output_dir,
            } => cmd_run(&input, enrich, output_dir, config).await,

            Commands::Export {
                input,
                format,
                output,
            } => cmd_export(&input, format, output.as_deref(), &config),

            Commands::Pages { input } => cmd_pages(&input, &config),

            Commands::Serve { port, enrich } => cmd_serve(port, enrich, config).await,
        },
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn build_enricher(
    mode: EnrichMode,
    config: &CatalogConfig,
) -> Result<Option<Box<dyn Enricher>>, Box<dyn std::error::Error>> {
    let enricher: Box<dyn Enricher> = match mode {
        EnrichMode::Template => Box::new(TemplateEnricher::new(config)),
        EnrichMode::Ai => Box::new(AiEnricher::from_config(config)?),
        EnrichMode::None => return Ok(None),
    };
    Ok(Some(enricher))
}

fn cmd_parse(
    input: &Path,
    output: Option<&Path>,
    config: &CatalogConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_csv_file_auto(input)?;
    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));

    let products = parse_all(&result.records, &config.columns);
    eprintln!("✅ Parsed {} products", products.len());

    let json = serde_json::to_string_pretty(&products)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_run(
    input: &Path,
    enrich: EnrichMode,
    output_dir: Option<PathBuf>,
    mut config: CatalogConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    let enricher = build_enricher(enrich, &config)?;

    let run = process_file(input, &config, enricher.as_deref()).await?;
    let files = write_outputs(&run, &config)?;

    eprintln!("\n📊 Summary:");
    eprintln!("   Products:   {}", run.products.len());
    eprintln!("   Brands:     {}", run.brands.len());
    eprintln!("   Categories: {}", run.categories.len());
    eprintln!("   Sitemap:    {} URLs", run.sitemap.len());
    if let Some(report) = &run.enrichment {
        eprintln!(
            "   Enriched:   {}/{} ({} failures)",
            report.enriched,
            report.attempted,
            report.failures.len()
        );
    }
    if !run.slug_collisions.is_empty() {
        eprintln!("   ⚠️  {} slug collision(s)", run.slug_collisions.len());
    }

    eprintln!("\n💾 Files:");
    for path in &files {
        eprintln!("   {}", path.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_export(
    input: &Path,
    format: ExportSchema,
    output: Option<&Path>,
    config: &CatalogConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Exporting {} table from: {}", format, input.display());

    let result = parse_csv_file_auto(input)?;
    let products = parse_all(&result.records, &config.columns);
    let table = export_table(&products, format);

    let path = match output {
        Some(p) => {
            fs::write(p, table.to_csv_bytes()?)?;
            p.to_path_buf()
        }
        None => table.write_to(&config.output_dir)?,
    };

    eprintln!("✅ {} rows written to: {}", table.len(), path.display());
    Ok(())
}

fn cmd_pages(input: &Path, config: &CatalogConfig) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📦 Building pages from: {}", input.display());

    let result = parse_csv_file_auto(input)?;
    let products = parse_all(&result.records, &config.columns);
    let (brands, categories) = aggregate(&products, &config.store_name);
    let sitemap = build_sitemap(&brands, &categories);

    eprintln!("   {} brands, {} categories", brands.len(), categories.len());

    let documents = export_json(&products, &brands, &categories, &sitemap, &config.store_name);
    for path in documents.write_to_dir(&config.json_dir())? {
        eprintln!("💾 {}", path.display());
    }

    Ok(())
}

async fn cmd_serve(
    port: Option<u16>,
    enrich: EnrichMode,
    mut config: CatalogConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.server.port = port;
    }

    let enricher: Arc<dyn Enricher> = match enrich {
        EnrichMode::Ai => Arc::new(AiEnricher::from_config(&config)?),
        EnrichMode::Template | EnrichMode::None => Arc::new(TemplateEnricher::new(&config)),
    };

    livora::server::start_server(config, enricher).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
