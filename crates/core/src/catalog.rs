use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::document::DocumentType;

/// One catalog entry: how to recognize a document type and what it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTypeSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Detection keywords, matched case-insensitively as substrings, in order.
    pub keywords: Vec<String>,
    /// Field names the type's record produces.
    pub fields: Vec<String>,
}

impl DocumentTypeSpec {
    /// The built-in document type this entry describes, if any.
    pub fn document_type(&self) -> Option<DocumentType> {
        self.id.parse().ok()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Failed to parse catalog TOML: {0}")]
    Parse(String),
    #[error("Duplicate document type: {0}")]
    DuplicateType(String),
    #[error("Document type {0} has no keywords")]
    NoKeywords(String),
    #[error("Document type {0} has an empty keyword")]
    EmptyKeyword(String),
    #[error("Catalog is missing document type {0}")]
    MissingType(DocumentType),
    #[error("Fields of {id} do not match its record: expected {expected:?}, got {actual:?}")]
    FieldMismatch {
        id: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

/// `(type, display name, description, keywords)`. Insertion order is
/// classification order.
pub const DEFAULT_CATALOG: &[(DocumentType, &str, &str, &[&str])] = &[
    (
        DocumentType::LaborContract,
        "Hợp đồng lao động",
        "Hợp đồng lao động giữa công ty và nhân viên",
        &[
            "HỢP ĐỒNG LAO ĐỘNG",
            "Hợp đồng lao động",
            "HĐLĐ",
            "BÊN A",
            "BÊN B",
            "Người lao động",
            "Người sử dụng lao động",
        ],
    ),
    (
        DocumentType::AppointmentDecision,
        "Quyết định bổ nhiệm",
        "Quyết định bổ nhiệm chức vụ cho nhân viên",
        &[
            "QUYẾT ĐỊNH BỔ NHIỆM",
            "Quyết định bổ nhiệm",
            "Bổ nhiệm",
            "Chức vụ",
            "Bổ nhiệm chức vụ",
        ],
    ),
    (
        DocumentType::TransferDecision,
        "Quyết định điều chuyển",
        "Quyết định điều chuyển nhân viên giữa các bộ phận",
        &[
            "QUYẾT ĐỊNH ĐIỀU CHUYỂN",
            "Quyết định điều chuyển",
            "Điều chuyển",
            "Bộ phận",
            "Chuyển công tác",
        ],
    ),
    (
        DocumentType::RewardDiscipline,
        "Khen thưởng/Kỷ luật",
        "Quyết định khen thưởng hoặc kỷ luật nhân viên",
        &[
            "QUYẾT ĐỊNH KHEN THƯỞNG",
            "QUYẾT ĐỊNH KỶ LUẬT",
            "Khen thưởng",
            "Kỷ luật",
            "Thưởng",
            "Phạt",
        ],
    ),
];

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(rename = "document_type")]
    document_types: Vec<DocumentTypeSpec>,
}

/// Ordered, validated, read-only table of document types.
///
/// There are no mutating methods: build it once at startup and share it
/// (typically behind an `Arc`).
#[derive(Debug, Clone)]
pub struct DocumentTypeCatalog {
    entries: Vec<DocumentTypeSpec>,
}

impl Default for DocumentTypeCatalog {
    fn default() -> Self {
        let entries = DEFAULT_CATALOG
            .iter()
            .map(|(doc_type, name, description, keywords)| DocumentTypeSpec {
                id: doc_type.id().to_string(),
                name: name.to_string(),
                description: description.to_string(),
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
                fields: doc_type.field_names().iter().map(|f| f.to_string()).collect(),
            })
            .collect();
        Self { entries }
    }
}

impl DocumentTypeCatalog {
    pub fn new(entries: Vec<DocumentTypeSpec>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.as_str()) {
                return Err(CatalogError::DuplicateType(entry.id.clone()));
            }
            if entry.keywords.is_empty() {
                return Err(CatalogError::NoKeywords(entry.id.clone()));
            }
            // An empty keyword is a substring of every text.
            if entry.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(CatalogError::EmptyKeyword(entry.id.clone()));
            }
            match entry.document_type() {
                Some(doc_type) => {
                    let expected: Vec<String> =
                        doc_type.field_names().iter().map(|f| f.to_string()).collect();
                    if entry.fields != expected {
                        return Err(CatalogError::FieldMismatch {
                            id: entry.id.clone(),
                            expected,
                            actual: entry.fields.clone(),
                        });
                    }
                }
                None => {
                    tracing::warn!(
                        "Catalog entry '{}' has no extractor; documents of this type will be rejected",
                        entry.id
                    );
                }
            }
        }

        if let Some(missing) = DocumentType::ALL
            .into_iter()
            .find(|t| !seen.contains(t.id()))
        {
            return Err(CatalogError::MissingType(missing));
        }

        Ok(Self { entries })
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile =
            toml::from_str(toml_content).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(file.document_types)
    }

    /// Entries in classification order.
    pub fn iter(&self) -> impl Iterator<Item = &DocumentTypeSpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&DocumentTypeSpec> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn spec(&self, doc_type: DocumentType) -> Option<&DocumentTypeSpec> {
        self.get(doc_type.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_TOML: &str = r#"
[[document_type]]
id = "khen_thuong_ky_luat"
name = "Khen thưởng/Kỷ luật"
keywords = ["KHEN THƯỞNG"]
fields = ["name", "decision_content", "issue_date", "category", "signer", "decision_number"]

[[document_type]]
id = "hop_dong_lao_dong"
name = "Hợp đồng lao động"
keywords = ["HĐLĐ"]
fields = ["name", "employee_code", "title", "contract_type", "contract_term"]

[[document_type]]
id = "quyet_dinh_bo_nhiem"
name = "Quyết định bổ nhiệm"
keywords = ["BỔ NHIỆM"]
fields = ["name", "old_title", "new_title", "effective_date", "signer", "decision_number"]

[[document_type]]
id = "quyet_dinh_dieu_chuyen"
name = "Quyết định điều chuyển"
keywords = ["ĐIỀU CHUYỂN"]
fields = ["name", "old_department", "new_department", "transfer_date", "signer", "decision_number"]
"#;

    fn default_entries() -> Vec<DocumentTypeSpec> {
        DocumentTypeCatalog::default().iter().cloned().collect()
    }

    #[test]
    fn default_catalog_covers_every_type_in_order() {
        let catalog = DocumentTypeCatalog::default();
        let ids: Vec<&str> = catalog.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            ["hop_dong_lao_dong", "quyet_dinh_bo_nhiem", "quyet_dinh_dieu_chuyen", "khen_thuong_ky_luat"]
        );
        // The default table must pass its own validation.
        assert!(DocumentTypeCatalog::new(default_entries()).is_ok());
    }

    #[test]
    fn default_catalog_first_keywords() {
        let catalog = DocumentTypeCatalog::default();
        let spec = catalog.spec(DocumentType::AppointmentDecision).unwrap();
        assert_eq!(spec.keywords[0], "QUYẾT ĐỊNH BỔ NHIỆM");
        assert_eq!(spec.name, "Quyết định bổ nhiệm");
    }

    #[test]
    fn from_toml_preserves_file_order() {
        let catalog = DocumentTypeCatalog::from_toml(MINIMAL_TOML).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.iter().next().unwrap().id, "khen_thuong_ky_luat");
        assert_eq!(catalog.get("hop_dong_lao_dong").unwrap().description, "");
    }

    #[test]
    fn from_toml_rejects_garbage() {
        assert!(matches!(
            DocumentTypeCatalog::from_toml("not = [valid"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut entries = default_entries();
        entries.push(entries[0].clone());
        assert_eq!(
            DocumentTypeCatalog::new(entries).unwrap_err(),
            CatalogError::DuplicateType("hop_dong_lao_dong".into())
        );
    }

    #[test]
    fn empty_keyword_rejected() {
        let mut entries = default_entries();
        entries[1].keywords.push("  ".into());
        assert!(matches!(
            DocumentTypeCatalog::new(entries),
            Err(CatalogError::EmptyKeyword(_))
        ));
    }

    #[test]
    fn missing_type_rejected() {
        let mut entries = default_entries();
        entries.retain(|e| e.id != "quyet_dinh_dieu_chuyen");
        assert_eq!(
            DocumentTypeCatalog::new(entries).unwrap_err(),
            CatalogError::MissingType(DocumentType::TransferDecision)
        );
    }

    #[test]
    fn field_mismatch_rejected() {
        let mut entries = default_entries();
        entries[0].fields.pop();
        assert!(matches!(
            DocumentTypeCatalog::new(entries),
            Err(CatalogError::FieldMismatch { .. })
        ));
    }

    #[test]
    fn extra_type_without_extractor_is_allowed() {
        let mut entries = default_entries();
        entries.push(DocumentTypeSpec {
            id: "giay_nghi_phep".into(),
            name: "Giấy nghỉ phép".into(),
            description: String::new(),
            keywords: vec!["NGHỈ PHÉP".into()],
            fields: vec!["name".into()],
        });
        let catalog = DocumentTypeCatalog::new(entries).unwrap();
        assert_eq!(catalog.get("giay_nghi_phep").unwrap().document_type(), None);
    }
}
