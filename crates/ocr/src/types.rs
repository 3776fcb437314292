use cds_core::{DocumentType, ExtractionRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Successful extractions below this confidence should be checked by a person.
pub const REVIEW_THRESHOLD: f32 = 0.6;

/// Number of characters of context returned when a document cannot be classified.
pub const PARTIAL_TEXT_CHARS: usize = 500;

/// Content-derived identity of a source image (SHA-256, lowercase hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// OCR output for one document image.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedText {
    text: String,
    source: SourceId,
    /// Mean recognition confidence reported by the OCR engine (0.0–1.0).
    ocr_confidence: Option<f32>,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>, source: SourceId, ocr_confidence: Option<f32>) -> Self {
        Self {
            text: text.into(),
            source,
            ocr_confidence: ocr_confidence.map(|c| c.clamp(0.0, 1.0)),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn ocr_confidence(&self) -> Option<f32> {
        self.ocr_confidence
    }
}

/// Why a document produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessingError {
    #[error("no text extracted")]
    EmptyInput,
    #[error("unrecognized document type")]
    UnrecognizedType,
    /// The catalog lists a type that has no extractor. A configuration defect.
    #[error("unsupported document type: {type_id}")]
    UnsupportedType { type_id: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedDocument {
    #[serde(flatten)]
    pub record: ExtractionRecord,
    pub extracted_text: String,
    /// Fraction of the record's fields that were populated (0.0–1.0).
    pub confidence: f32,
}

impl ProcessedDocument {
    pub fn document_type(&self) -> DocumentType {
        self.record.document_type()
    }

    pub fn needs_review(&self) -> bool {
        self.confidence < REVIEW_THRESHOLD
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingFailure {
    pub error: ProcessingError,
    pub message: String,
    /// Leading context of the text, when there was any.
    pub partial_text: String,
    pub truncated: bool,
}

impl ProcessingFailure {
    pub fn new(error: ProcessingError, text: &str) -> Self {
        let (partial_text, truncated) = leading_chars(text, PARTIAL_TEXT_CHARS);
        Self {
            message: error.to_string(),
            error,
            partial_text,
            truncated,
        }
    }
}

/// Exactly one of a record or a failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessingOutcome {
    Processed(ProcessedDocument),
    Failed(ProcessingFailure),
}

impl ProcessingOutcome {
    pub fn is_processed(&self) -> bool {
        matches!(self, ProcessingOutcome::Processed(_))
    }

    pub fn document(&self) -> Option<&ProcessedDocument> {
        match self {
            ProcessingOutcome::Processed(doc) => Some(doc),
            ProcessingOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ProcessingFailure> {
        match self {
            ProcessingOutcome::Processed(_) => None,
            ProcessingOutcome::Failed(f) => Some(f),
        }
    }
}

/// First `max_chars` characters of `text`, never splitting a character.
fn leading_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => (text[..cut].to_string(), true),
        None => (text.to_string(), false),
    }
}
