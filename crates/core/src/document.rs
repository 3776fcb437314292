use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::{AppointmentDecision, LaborContract, RewardDiscipline, TransferDecision};

/// The HR document categories the extraction chain knows how to handle.
///
/// Variant order is the order of the built-in catalog, which is also the
/// classification order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    #[serde(rename = "hop_dong_lao_dong")]
    LaborContract,
    #[serde(rename = "quyet_dinh_bo_nhiem")]
    AppointmentDecision,
    #[serde(rename = "quyet_dinh_dieu_chuyen")]
    TransferDecision,
    #[serde(rename = "khen_thuong_ky_luat")]
    RewardDiscipline,
}

impl DocumentType {
    pub const ALL: [DocumentType; 4] = [
        DocumentType::LaborContract,
        DocumentType::AppointmentDecision,
        DocumentType::TransferDecision,
        DocumentType::RewardDiscipline,
    ];

    /// Stable identifier used as the catalog key and in persisted results.
    pub fn id(self) -> &'static str {
        match self {
            DocumentType::LaborContract => "hop_dong_lao_dong",
            DocumentType::AppointmentDecision => "quyet_dinh_bo_nhiem",
            DocumentType::TransferDecision => "quyet_dinh_dieu_chuyen",
            DocumentType::RewardDiscipline => "khen_thuong_ky_luat",
        }
    }

    /// Field names of this type's record, in persisted order.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            DocumentType::LaborContract => LaborContract::FIELDS,
            DocumentType::AppointmentDecision => AppointmentDecision::FIELDS,
            DocumentType::TransferDecision => TransferDecision::FIELDS,
            DocumentType::RewardDiscipline => RewardDiscipline::FIELDS,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| format!("Unknown document type: '{s}'"))
    }
}
