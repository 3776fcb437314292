use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

use cds_ocr::{DocumentProcessor, OcrBackend, ProcessingOutcome, ScanPipeline, ScanResult};
use cds_tiler::{TileSet, TilingParams};

/// Per-file result as written to stdout and `--output`.
#[derive(Debug, Serialize)]
pub struct FileReport<T> {
    pub file: PathBuf,
    pub processed_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    #[serde(flatten)]
    pub body: ReportBody<T>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReportBody<T> {
    Done(T),
    /// The file itself could not be handled (unreadable, undecodable, OCR failure).
    Error { status: &'static str, message: String },
}

impl<T> ReportBody<T> {
    fn error(err: impl std::fmt::Display) -> Self {
        ReportBody::Error { status: "error", message: err.to_string() }
    }
}

impl<T> FileReport<T> {
    fn finish(file: PathBuf, started: Instant, body: ReportBody<T>) -> Self {
        Self {
            file,
            processed_at: Utc::now(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            body,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.body, ReportBody::Error { .. })
    }
}

#[derive(Debug, Serialize)]
pub struct TileSummary {
    pub cols: u32,
    pub rows: u32,
    pub edge: u32,
    pub grid_tiles: usize,
    pub has_thumbnail: bool,
    pub batch_shape: [usize; 4],
}

impl From<&TileSet> for TileSummary {
    fn from(set: &TileSet) -> Self {
        let (_, batch_shape) = set.to_batch();
        Self {
            cols: set.grid.cols,
            rows: set.grid.rows,
            edge: batch_shape[2] as u32,
            grid_tiles: set.grid_tile_count(),
            has_thumbnail: set.has_thumbnail(),
            batch_shape,
        }
    }
}

/// Run `work` for every path on the blocking pool; reports keep input order.
/// A worker that dies still leaves an error report for its file.
async fn run_each<T, F>(paths: Vec<PathBuf>, work: F) -> Vec<FileReport<T>>
where
    T: Send + 'static,
    F: Fn(&Path) -> ReportBody<T> + Send + Sync + 'static,
{
    let started = Instant::now();
    let work = Arc::new(work);
    let mut slots: Vec<(PathBuf, Option<FileReport<T>>)> =
        paths.iter().map(|p| (p.clone(), None)).collect();

    let mut set = JoinSet::new();
    for (index, path) in paths.into_iter().enumerate() {
        let work = Arc::clone(&work);
        set.spawn_blocking(move || {
            let started = Instant::now();
            let body = work(&path);
            (index, FileReport::finish(path, started, body))
        });
    }

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, report)) => slots[index].1 = Some(report),
            Err(e) => tracing::error!("Worker task failed: {e}"),
        }
    }

    slots
        .into_iter()
        .map(|(path, report)| {
            report.unwrap_or_else(|| {
                FileReport::finish(path, started, ReportBody::error("worker task failed"))
            })
        })
        .collect()
}

pub async fn classify_files(
    paths: Vec<PathBuf>,
    processor: Arc<DocumentProcessor>,
) -> Vec<FileReport<ProcessingOutcome>> {
    run_each(paths, move |path| match std::fs::read_to_string(path) {
        Ok(text) => ReportBody::Done(processor.classify_and_extract(&text)),
        Err(e) => {
            tracing::warn!("Cannot read {}: {e}", path.display());
            ReportBody::error(e)
        }
    })
    .await
}

pub async fn scan_files<R: OcrBackend + 'static>(
    paths: Vec<PathBuf>,
    pipeline: Arc<ScanPipeline<R>>,
) -> Vec<FileReport<ScanResult>> {
    run_each(paths, move |path| {
        let result = std::fs::read(path)
            .map_err(cds_ocr::PipelineError::from)
            .and_then(|bytes| pipeline.process_bytes(&bytes));
        match result {
            Ok(scan) => ReportBody::Done(scan),
            Err(e) => {
                tracing::warn!("Scan of {} failed: {e}", path.display());
                ReportBody::error(e)
            }
        }
    })
    .await
}

pub async fn tile_file(path: PathBuf, params: TilingParams) -> FileReport<TileSummary> {
    let mut reports = run_each(vec![path.clone()], move |path| {
        match std::fs::read(path) {
            Ok(bytes) => match cds_tiler::tile_image_bytes(&bytes, &params) {
                Ok(set) => ReportBody::Done(TileSummary::from(&set)),
                Err(e) => ReportBody::error(e),
            },
            Err(e) => ReportBody::error(e),
        }
    })
    .await;
    reports
        .pop()
        .unwrap_or_else(|| FileReport::finish(path, Instant::now(), ReportBody::error("tiling task failed")))
}

/// Write `<stem>_result.json` for each report into `dir`. Inputs sharing a
/// stem get `<stem>-2_result.json`, `<stem>-3_result.json`, and so on.
pub fn write_reports<T: Serialize>(dir: &Path, reports: &[FileReport<T>]) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut taken = HashSet::new();
    for report in reports {
        let stem = report
            .file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let name = unique_result_name(stem, &mut taken);
        if !name.starts_with(&format!("{stem}_")) {
            tracing::warn!("Another input is also named '{stem}'; writing {name}");
        }
        let out = dir.join(&name);
        std::fs::write(&out, serde_json::to_string_pretty(report)?)?;
        tracing::info!("Wrote {}", out.display());
    }
    Ok(())
}

fn unique_result_name(stem: &str, taken: &mut HashSet<String>) -> String {
    let mut name = format!("{stem}_result.json");
    let mut n = 2;
    while !taken.insert(name.clone()) {
        name = format!("{stem}-{n}_result.json");
        n += 1;
    }
    name
}
