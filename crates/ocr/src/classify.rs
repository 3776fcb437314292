use cds_core::DocumentTypeCatalog;

/// Sentinel identifier for text that matched no catalog keyword.
pub const UNKNOWN_TYPE: &str = "unknown";

/// The catalog entry and keyword that decided a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordMatch<'a> {
    pub type_id: &'a str,
    pub keyword: &'a str,
}

/// Internal pairing of a catalog entry with its uppercased keywords.
struct CompiledType {
    id: String,
    keywords: Vec<(String, String)>,
}

/// First-match keyword classifier.
///
/// Types are tried in catalog order and keywords in their listed order; the
/// first keyword found (case-insensitively) in the text decides the type. No
/// scoring: a keyword shared with a later type never reaches that type.
pub struct Classifier {
    types: Vec<CompiledType>,
}

impl Classifier {
    pub fn new(catalog: &DocumentTypeCatalog) -> Self {
        let types = catalog
            .iter()
            .map(|spec| CompiledType {
                id: spec.id.clone(),
                keywords: spec
                    .keywords
                    .iter()
                    .map(|k| (k.clone(), k.to_uppercase()))
                    .collect(),
            })
            .collect();
        Self { types }
    }

    pub fn find_match(&self, text: &str) -> Option<KeywordMatch<'_>> {
        if text.trim().is_empty() {
            return None;
        }
        let normalized = text.to_uppercase();
        self.types.iter().find_map(|t| {
            t.keywords
                .iter()
                .find(|(_, upper)| normalized.contains(upper.as_str()))
                .map(|(keyword, _)| KeywordMatch { type_id: &t.id, keyword })
        })
    }

    /// Catalog identifier of the text's type, or [`UNKNOWN_TYPE`].
    pub fn classify(&self, text: &str) -> &str {
        match self.find_match(text) {
            Some(m) => {
                tracing::debug!("Classified as {} via keyword '{}'", m.type_id, m.keyword);
                m.type_id
            }
            None => UNKNOWN_TYPE,
        }
    }
}
