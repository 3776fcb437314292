use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::DocumentType;

// Every field is a plain string; an empty string means "not found".
macro_rules! hr_record {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$fmeta:meta])* $field:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $($(#[$fmeta])* pub $field: String,)+
        }

        impl $name {
            /// Field names in persisted order.
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            /// `(field, value)` pairs in persisted order.
            pub fn values(&self) -> Vec<(&'static str, &str)> {
                vec![$((stringify!($field), self.$field.as_str())),+]
            }
        }
    };
}

hr_record! {
    /// Hợp đồng lao động.
    LaborContract {
        name,
        employee_code,
        title,
        contract_type,
        /// Either a `D/M/Y` date or a free-text duration such as "12 tháng".
        contract_term,
    }
}

hr_record! {
    /// Quyết định bổ nhiệm.
    AppointmentDecision {
        name,
        old_title,
        new_title,
        effective_date,
        signer,
        decision_number,
    }
}

hr_record! {
    /// Quyết định điều chuyển.
    TransferDecision {
        name,
        old_department,
        new_department,
        transfer_date,
        signer,
        decision_number,
    }
}

hr_record! {
    /// Quyết định khen thưởng / kỷ luật.
    RewardDiscipline {
        name,
        decision_content,
        issue_date,
        /// `"reward"`, `"discipline"`, or empty. See [`RewardCategory`].
        category,
        signer,
        decision_number,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardCategory {
    Reward,
    Discipline,
}

impl RewardCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            RewardCategory::Reward => "reward",
            RewardCategory::Discipline => "discipline",
        }
    }
}

impl fmt::Display for RewardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RewardCategory {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reward" => Ok(RewardCategory::Reward),
            "discipline" => Ok(RewardCategory::Discipline),
            other => Err(format!("Unknown reward category: '{other}'")),
        }
    }
}

impl RewardDiscipline {
    pub fn category(&self) -> Option<RewardCategory> {
        self.category.parse().ok()
    }
}

/// A typed extraction result for one classified document.
///
/// Serializes adjacently tagged as
/// `{"document_type": "<id>", "processed_data": {<fields in order>}}`, which is
/// the form the persistence layer stores and the transport layer returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "document_type", content = "processed_data")]
pub enum ExtractionRecord {
    #[serde(rename = "hop_dong_lao_dong")]
    LaborContract(LaborContract),
    #[serde(rename = "quyet_dinh_bo_nhiem")]
    AppointmentDecision(AppointmentDecision),
    #[serde(rename = "quyet_dinh_dieu_chuyen")]
    TransferDecision(TransferDecision),
    #[serde(rename = "khen_thuong_ky_luat")]
    RewardDiscipline(RewardDiscipline),
}

impl ExtractionRecord {
    pub fn document_type(&self) -> DocumentType {
        match self {
            ExtractionRecord::LaborContract(_) => DocumentType::LaborContract,
            ExtractionRecord::AppointmentDecision(_) => DocumentType::AppointmentDecision,
            ExtractionRecord::TransferDecision(_) => DocumentType::TransferDecision,
            ExtractionRecord::RewardDiscipline(_) => DocumentType::RewardDiscipline,
        }
    }

    pub fn values(&self) -> Vec<(&'static str, &str)> {
        match self {
            ExtractionRecord::LaborContract(r) => r.values(),
            ExtractionRecord::AppointmentDecision(r) => r.values(),
            ExtractionRecord::TransferDecision(r) => r.values(),
            ExtractionRecord::RewardDiscipline(r) => r.values(),
        }
    }

    /// Look up a single field by name. `None` if the field is not part of this
    /// record's schema.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values()
            .into_iter()
            .find(|(name, _)| *name == field)
            .map(|(_, value)| value)
    }

    /// Fraction of fields holding a non-empty value (0.0–1.0).
    pub fn fill_ratio(&self) -> f32 {
        let values = self.values();
        if values.is_empty() {
            return 0.0;
        }
        let filled = values.iter().filter(|(_, v)| !v.is_empty()).count();
        filled as f32 / values.len() as f32
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transfer() -> ExtractionRecord {
        ExtractionRecord::TransferDecision(TransferDecision {
            name: "Lê Thị C".into(),
            old_department: "Phòng Kế toán".into(),
            new_department: "Phòng Kinh doanh".into(),
            transfer_date: "5-3-2024".into(),
            ..Default::default()
        })
    }

    #[test]
    fn fields_follow_declaration_order() {
        assert_eq!(
            LaborContract::FIELDS,
            &["name", "employee_code", "title", "contract_type", "contract_term"]
        );
        assert_eq!(RewardDiscipline::FIELDS[3], "category");
    }

    #[test]
    fn default_record_is_all_empty_strings() {
        let r = AppointmentDecision::default();
        assert!(r.values().iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn json_roundtrip_is_field_for_field_equal() {
        let record = sample_transfer();
        let json = record.to_json().unwrap();
        let back = ExtractionRecord::from_json(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.values(), record.values());
    }

    #[test]
    fn persisted_form_is_tagged_by_document_type() {
        let v: serde_json::Value = serde_json::to_value(sample_transfer()).unwrap();
        assert_eq!(v["document_type"], "quyet_dinh_dieu_chuyen");
        assert_eq!(v["processed_data"]["new_department"], "Phòng Kinh doanh");
        assert_eq!(v["processed_data"]["signer"], "");
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let json = r#"{"document_type":"hop_dong_lao_dong","processed_data":{"name":"Nguyễn Văn A"}}"#;
        let record = ExtractionRecord::from_json(json).unwrap();
        assert_eq!(record.get("name"), Some("Nguyễn Văn A"));
        assert_eq!(record.get("contract_term"), Some(""));
        assert_eq!(record.get("signer"), None);
    }

    #[test]
    fn fill_ratio_counts_non_empty_fields() {
        let record = sample_transfer();
        assert!((record.fill_ratio() - 4.0 / 6.0).abs() < 1e-6);
        let empty = ExtractionRecord::LaborContract(LaborContract::default());
        assert_eq!(empty.fill_ratio(), 0.0);
    }

    #[test]
    fn reward_category_parses_from_field() {
        let r = RewardDiscipline { category: "discipline".into(), ..Default::default() };
        assert_eq!(r.category(), Some(RewardCategory::Discipline));
        assert_eq!(RewardDiscipline::default().category(), None);
    }
}
