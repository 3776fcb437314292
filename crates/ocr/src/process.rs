use std::sync::{Arc, OnceLock};

use cds_core::{DocumentType, DocumentTypeCatalog};

use crate::classify::Classifier;
use crate::extract::Extractor;
use crate::types::{
    ProcessedDocument, ProcessingError, ProcessingFailure, ProcessingOutcome, RecognizedText,
};

/// Classify-then-extract over recognized text.
///
/// Holds only the frozen catalog and the classifier derived from it, so one
/// instance can be shared across worker threads.
pub struct DocumentProcessor {
    catalog: Arc<DocumentTypeCatalog>,
    classifier: Classifier,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(Arc::new(DocumentTypeCatalog::default()))
    }
}

impl DocumentProcessor {
    pub fn new(catalog: Arc<DocumentTypeCatalog>) -> Self {
        let classifier = Classifier::new(&catalog);
        Self { catalog, classifier }
    }

    pub fn catalog(&self) -> &DocumentTypeCatalog {
        &self.catalog
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// empty → classify → dispatch → extract.
    pub fn classify_and_extract(&self, text: &str) -> ProcessingOutcome {
        if text.trim().is_empty() {
            return ProcessingOutcome::Failed(ProcessingFailure::new(
                ProcessingError::EmptyInput,
                "",
            ));
        }

        let Some(found) = self.classifier.find_match(text) else {
            tracing::info!("No catalog keyword matched ({} chars)", text.chars().count());
            return ProcessingOutcome::Failed(ProcessingFailure::new(
                ProcessingError::UnrecognizedType,
                text,
            ));
        };

        let doc_type: DocumentType = match found.type_id.parse() {
            Ok(t) => t,
            Err(_) => {
                tracing::warn!(
                    "Catalog type '{}' has no extractor (matched '{}')",
                    found.type_id,
                    found.keyword
                );
                return ProcessingOutcome::Failed(ProcessingFailure::new(
                    ProcessingError::UnsupportedType { type_id: found.type_id.to_string() },
                    text,
                ));
            }
        };

        let record = Extractor::extract(doc_type, text);
        let confidence = record.fill_ratio();
        tracing::info!(
            "Extracted {} via keyword '{}' (confidence {:.2})",
            doc_type,
            found.keyword,
            confidence
        );

        ProcessingOutcome::Processed(ProcessedDocument {
            record,
            extracted_text: text.to_string(),
            confidence,
        })
    }

    pub fn process(&self, recognized: &RecognizedText) -> ProcessingOutcome {
        tracing::debug!("Processing text from source {}", recognized.source());
        self.classify_and_extract(recognized.text())
    }
}

/// Processor over the built-in catalog, built on first use.
pub fn default_processor() -> &'static DocumentProcessor {
    static PROCESSOR: OnceLock<DocumentProcessor> = OnceLock::new();
    PROCESSOR.get_or_init(DocumentProcessor::default)
}

/// Classify and extract with the built-in catalog.
pub fn classify_and_extract(text: &str) -> ProcessingOutcome {
    default_processor().classify_and_extract(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceId, PARTIAL_TEXT_CHARS};
    use cds_core::{DocumentTypeSpec, ExtractionRecord};

    #[test]
    fn end_to_end_appointment() {
        let text = "QUYẾT ĐỊNH BỔ NHIỆM\nÔng: Trần Văn B\nChức vụ: Trưởng phòng\nNgày hiệu lực: 01/01/2024";
        let outcome = classify_and_extract(text);
        let doc = outcome.document().expect("should be processed");

        assert_eq!(doc.document_type(), DocumentType::AppointmentDecision);
        assert_eq!(doc.extracted_text, text);
        match &doc.record {
            ExtractionRecord::AppointmentDecision(r) => {
                assert_eq!(r.name, "Trần Văn B");
                assert_eq!(r.new_title, "Trưởng phòng");
                assert_eq!(r.effective_date, "01/01/2024");
                assert_eq!(r.old_title, "");
                assert_eq!(r.signer, "");
            }
            other => panic!("unexpected record {other:?}"),
        }
        assert!((doc.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn empty_text_fails_with_empty_input() {
        for text in ["", "   \n  "] {
            let outcome = classify_and_extract(text);
            let failure = outcome.failure().unwrap();
            assert_eq!(failure.error, ProcessingError::EmptyInput);
            assert_eq!(failure.message, "no text extracted");
        }
    }

    #[test]
    fn unrecognized_text_returns_leading_context() {
        let text = "Biên bản bàn giao tài sản ".repeat(40);
        let outcome = classify_and_extract(&text);
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.error, ProcessingError::UnrecognizedType);
        assert_eq!(failure.partial_text.chars().count(), PARTIAL_TEXT_CHARS);
        assert!(text.starts_with(&failure.partial_text));
        assert!(failure.truncated);
    }

    #[test]
    fn short_unrecognized_text_is_returned_whole() {
        let outcome = classify_and_extract("Giấy mời họp");
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.partial_text, "Giấy mời họp");
        assert!(!failure.truncated);
    }

    #[test]
    fn catalog_type_without_extractor_is_unsupported() {
        let mut entries: Vec<DocumentTypeSpec> =
            DocumentTypeCatalog::default().iter().cloned().collect();
        entries.insert(
            0,
            DocumentTypeSpec {
                id: "giay_nghi_phep".into(),
                name: "Giấy nghỉ phép".into(),
                description: String::new(),
                keywords: vec!["NGHỈ PHÉP".into()],
                fields: vec!["name".into()],
            },
        );
        let processor = DocumentProcessor::new(Arc::new(DocumentTypeCatalog::new(entries).unwrap()));

        let outcome = processor.classify_and_extract("ĐƠN XIN NGHỈ PHÉP\nHọ và tên: An");
        assert_eq!(
            outcome.failure().unwrap().error,
            ProcessingError::UnsupportedType { type_id: "giay_nghi_phep".into() }
        );
    }

    #[test]
    fn each_type_dispatches_to_its_extractor() {
        let processor = DocumentProcessor::default();
        let cases = [
            ("HỢP ĐỒNG LAO ĐỘNG\nHọ và tên: Nguyễn Văn A", DocumentType::LaborContract),
            ("QUYẾT ĐỊNH ĐIỀU CHUYỂN\nÔng: Lê Văn C", DocumentType::TransferDecision),
            ("QUYẾT ĐỊNH KỶ LUẬT\nÔng: Lê Văn C", DocumentType::RewardDiscipline),
        ];
        for (text, expected) in cases {
            let outcome = processor.classify_and_extract(text);
            let doc = outcome.document().unwrap();
            assert_eq!(doc.document_type(), expected);
            assert!(!doc.record.get("name").unwrap().is_empty());
        }
    }

    #[test]
    fn process_reads_recognized_text() {
        let recognized = RecognizedText::new(
            "HĐLĐ\nMã số: 77",
            SourceId("00".repeat(32)),
            Some(0.9),
        );
        let outcome = DocumentProcessor::default().process(&recognized);
        let doc = outcome.document().unwrap();
        assert_eq!(doc.record.get("employee_code"), Some("77"));
    }

    #[test]
    fn default_processor_is_built_once() {
        let first = default_processor();
        let second = default_processor();
        assert!(std::ptr::eq(first, second));
        assert!(std::ptr::eq(first.catalog(), second.catalog()));
        assert_eq!(first.catalog().len(), 4);
    }

    #[test]
    fn processor_is_shareable_across_threads() {
        let processor = Arc::new(DocumentProcessor::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let p = Arc::clone(&processor);
                std::thread::spawn(move || {
                    p.classify_and_extract(&format!("HỢP ĐỒNG LAO ĐỘNG\nMã nhân viên: NV{i}"))
                })
            })
            .collect();
        for (i, h) in handles.into_iter().enumerate() {
            let outcome = h.join().unwrap();
            let expected = format!("NV{i}");
            assert_eq!(outcome.document().unwrap().record.get("employee_code"), Some(expected.as_str()));
        }
    }
}
