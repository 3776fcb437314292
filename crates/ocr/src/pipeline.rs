use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::hash;
use crate::preprocess::{self, PreprocessOptions};
use crate::process::DocumentProcessor;
use crate::recognizer::{OcrBackend, OcrError};
use crate::types::{ProcessingOutcome, RecognizedText, SourceId};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image preprocessing failed: {0}")]
    Preprocess(#[from] crate::preprocess::PreprocessError),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
}

/// The result of scanning one document image.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// SHA-256 hex digest of the original image bytes.
    pub source: SourceId,
    /// Engine-reported recognition confidence, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_confidence: Option<f32>,
    #[serde(flatten)]
    pub outcome: ProcessingOutcome,
}

/// Orchestrates: hash → preprocess → OCR → classify → extract.
///
/// Image-level problems (unreadable file, undecodable image, engine failure)
/// are errors; a readable image that yields no usable document is a
/// [`ProcessingOutcome::Failed`] inside an `Ok`.
pub struct ScanPipeline<R: OcrBackend> {
    recognizer: R,
    processor: Arc<DocumentProcessor>,
    options: PreprocessOptions,
}

impl<R: OcrBackend> ScanPipeline<R> {
    pub fn new(recognizer: R, processor: Arc<DocumentProcessor>) -> Self {
        Self { recognizer, processor, options: PreprocessOptions::default() }
    }

    pub fn with_preprocess(mut self, options: PreprocessOptions) -> Self {
        self.options = options;
        self
    }

    pub fn processor(&self) -> &DocumentProcessor {
        &self.processor
    }

    /// Process a file on disk.
    pub async fn process_file(&self, path: &Path) -> Result<ScanResult, PipelineError> {
        let bytes = tokio::fs::read(path).await?;
        tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
        self.process_bytes(&bytes)
    }

    /// Process raw encoded image bytes.
    pub fn process_bytes(&self, data: &[u8]) -> Result<ScanResult, PipelineError> {
        let recognized = self.recognize(data)?;
        let outcome = self.processor.process(&recognized);
        if let Some(failure) = outcome.failure() {
            tracing::info!("Document {} not processed: {}", recognized.source(), failure.message);
        }
        Ok(ScanResult {
            source: recognized.source().clone(),
            ocr_confidence: recognized.ocr_confidence(),
            outcome,
        })
    }

    /// Hash, clean up and recognize an image without classifying it.
    pub fn recognize(&self, data: &[u8]) -> Result<RecognizedText, PipelineError> {
        let source = hash::source_id(data);
        let image_bytes = preprocess::prepare_for_ocr(data, &self.options)?;
        let recognition = self.recognizer.recognize(&image_bytes)?;
        Ok(RecognizedText::new(recognition.text, source, recognition.confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{MockRecognizer, UnavailableRecognizer};
    use crate::types::ProcessingError;
    use cds_core::DocumentType;
    use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let img: GrayImage = ImageBuffer::from_fn(4, 4, |_, _| Luma([200u8]));
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn pipeline(text: &str) -> ScanPipeline<MockRecognizer> {
        ScanPipeline::new(
            MockRecognizer::new(text).with_confidence(0.91),
            Arc::new(DocumentProcessor::default()),
        )
    }

    #[test]
    fn process_bytes_extracts_document() {
        let result = pipeline("QUYẾT ĐỊNH ĐIỀU CHUYỂN\nBộ phận cũ: Kho\nBộ phận mới: Kế toán")
            .process_bytes(&tiny_png())
            .unwrap();

        assert_eq!(result.source.0.len(), 64);
        assert_eq!(result.ocr_confidence, Some(0.91));
        let doc = result.outcome.document().unwrap();
        assert_eq!(doc.document_type(), DocumentType::TransferDecision);
        assert_eq!(doc.record.get("new_department"), Some("Kế toán"));
    }

    #[test]
    fn blank_recognition_is_an_outcome_not_an_error() {
        let result = pipeline("  \n").process_bytes(&tiny_png()).unwrap();
        assert_eq!(result.outcome.failure().unwrap().error, ProcessingError::EmptyInput);
    }

    #[test]
    fn source_id_is_stable_for_same_bytes() {
        let p = pipeline("irrelevant");
        let data = tiny_png();
        assert_eq!(
            p.process_bytes(&data).unwrap().source,
            p.process_bytes(&data).unwrap().source
        );
    }

    #[test]
    fn undecodable_image_is_an_error() {
        let err = pipeline("x").process_bytes(b"garbage").unwrap_err();
        assert!(matches!(err, PipelineError::Preprocess(_)));
    }

    #[test]
    fn engine_failure_is_an_error() {
        let p = ScanPipeline::new(UnavailableRecognizer, Arc::new(DocumentProcessor::default()));
        assert!(matches!(p.process_bytes(&tiny_png()), Err(PipelineError::Ocr(_))));
    }

    #[test]
    fn result_serializes_with_status() {
        let result = pipeline("HĐLĐ\nMSNV: 12").process_bytes(&tiny_png()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "processed");
        assert_eq!(json["document_type"], "hop_dong_lao_dong");
        assert_eq!(json["processed_data"]["employee_code"], "12");
        assert_eq!(json["source"].as_str().unwrap().len(), 64);
    }

    #[tokio::test]
    async fn process_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.png");
        tokio::fs::write(&path, tiny_png()).await.unwrap();

        let result = pipeline("Khen thưởng\nÔng: Hà Văn M").process_file(&path).await.unwrap();
        assert_eq!(
            result.outcome.document().unwrap().record.get("category"),
            Some("reward")
        );
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = pipeline("x").process_file(&dir.path().join("nope.png")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
