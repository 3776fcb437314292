use anyhow::Context;
use cds_core::DocumentTypeCatalog;
use cds_ocr::PreprocessOptions;
use cds_tiler::TilingParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract language string.
    pub language: String,
    /// Directory holding `*.traineddata`; the engine default when unset.
    pub data_path: Option<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self { language: "vie+eng".into(), data_path: None }
    }
}

/// Everything read from `config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub ocr: OcrConfig,
    pub preprocess: PreprocessOptions,
    pub tiling: TilingParams,
    /// Replacement document type catalog (TOML); the built-in one when unset.
    pub catalog_path: Option<PathBuf>,
}

impl ScannerConfig {
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid scanner configuration")?;
        config.tiling.validate()?;
        Ok(config)
    }

    /// `--config` if given, else the per-user config file if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => match default_path().filter(|p| p.exists()) {
                Some(p) => p,
                None => {
                    tracing::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        tracing::info!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn load_catalog(&self) -> anyhow::Result<DocumentTypeCatalog> {
        let Some(path) = &self.catalog_path else {
            return Ok(DocumentTypeCatalog::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let catalog = DocumentTypeCatalog::from_toml(&content)
            .with_context(|| format!("Invalid catalog {}", path.display()))?;
        tracing::info!("Loaded {} document types from {}", catalog.len(), path.display());
        Ok(catalog)
    }
}

pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("vn", "cds", "cds-scanner")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
