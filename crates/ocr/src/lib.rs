//! Classification and field extraction for scanned Vietnamese HR documents.

pub mod classify;
pub mod extract;
pub mod hash;
pub mod pipeline;
pub mod preprocess;
pub mod process;
pub mod recognizer;
pub mod types;

pub use classify::{Classifier, KeywordMatch, UNKNOWN_TYPE};
pub use extract::{reward_category, Extractor};
pub use hash::{sha256_bytes, source_id, to_hex};
pub use pipeline::{PipelineError, ScanPipeline, ScanResult};
pub use preprocess::{prepare_for_ocr, PreprocessError, PreprocessOptions};
pub use process::{classify_and_extract, default_processor, DocumentProcessor};
pub use recognizer::{MockRecognizer, OcrBackend, OcrError, Recognition, UnavailableRecognizer};
pub use types::{
    ProcessedDocument, ProcessingError, ProcessingFailure, ProcessingOutcome, RecognizedText,
    SourceId, PARTIAL_TEXT_CHARS, REVIEW_THRESHOLD,
};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
