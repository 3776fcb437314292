use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cds_ocr::{DocumentProcessor, OcrBackend, ScanPipeline};

mod config;
mod report;

use config::{OcrConfig, ScannerConfig};

/// Classify scanned Vietnamese HR documents and extract their fields.
#[derive(Parser)]
#[command(name = "cds-scanner", version)]
struct Cli {
    /// Configuration file (defaults to the per-user config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify already-recognized text files
    Classify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// OCR document images, then classify and extract
    Scan {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Write `<stem>_result.json` per image into this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show how an image would be tiled for a vision model
    Tile {
        image: PathBuf,
        #[arg(long)]
        edge: Option<u32>,
        #[arg(long)]
        min: Option<u32>,
        #[arg(long)]
        max: Option<u32>,
        #[arg(long)]
        no_thumbnail: bool,
    },
    /// List the loaded document types
    Catalog,
}

#[derive(Serialize)]
struct CatalogEntry<'a> {
    id: &'a str,
    name: &'a str,
    keywords: &'a [String],
    fields: &'a [String],
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "tesseract")]
fn build_recognizer(ocr: &OcrConfig) -> Box<dyn OcrBackend> {
    Box::new(cds_ocr::TesseractRecognizer::new(ocr.data_path.clone(), &ocr.language))
}

#[cfg(not(feature = "tesseract"))]
fn build_recognizer(_ocr: &OcrConfig) -> Box<dyn OcrBackend> {
    tracing::warn!("Built without the `tesseract` feature; every scan will fail");
    Box::new(cds_ocr::UnavailableRecognizer)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = ScannerConfig::load(cli.config.as_deref())?;
    let catalog = Arc::new(config.load_catalog()?);

    match cli.command {
        Command::Classify { files } => {
            let processor = Arc::new(DocumentProcessor::new(catalog));
            let reports = report::classify_files(files, processor).await;
            print_json(&reports)?;
        }
        Command::Scan { images, output } => {
            let processor = Arc::new(DocumentProcessor::new(catalog));
            let pipeline = Arc::new(
                ScanPipeline::new(build_recognizer(&config.ocr), processor)
                    .with_preprocess(config.preprocess),
            );
            let reports = report::scan_files(images, pipeline).await;
            let failed = reports.iter().filter(|r| r.is_error()).count();
            if let Some(dir) = output {
                report::write_reports(&dir, &reports)
                    .with_context(|| format!("Failed to write results to {}", dir.display()))?;
            }
            print_json(&reports)?;
            if failed > 0 {
                tracing::warn!("{failed} of {} images could not be scanned", reports.len());
            }
        }
        Command::Tile { image, edge, min, max, no_thumbnail } => {
            let mut params = config.tiling;
            params.edge_length = edge.unwrap_or(params.edge_length);
            params.min_tiles = min.unwrap_or(params.min_tiles);
            params.max_tiles = max.unwrap_or(params.max_tiles);
            params.use_thumbnail &= !no_thumbnail;
            params.validate()?;

            let report = report::tile_file(image, params).await;
            print_json(&report)?;
        }
        Command::Catalog => {
            let entries: Vec<CatalogEntry> = catalog
                .iter()
                .map(|spec| CatalogEntry {
                    id: &spec.id,
                    name: &spec.name,
                    keywords: &spec.keywords,
                    fields: &spec.fields,
                })
                .collect();
            print_json(&entries)?;
        }
    }

    Ok(())
}
