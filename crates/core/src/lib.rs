pub mod catalog;
pub mod document;
pub mod record;

pub use catalog::{CatalogError, DocumentTypeCatalog, DocumentTypeSpec, DEFAULT_CATALOG};
pub use document::DocumentType;
pub use record::{
    AppointmentDecision, ExtractionRecord, LaborContract, RewardCategory, RewardDiscipline,
    TransferDecision,
};
