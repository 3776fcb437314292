use std::sync::OnceLock;

use cds_core::{
    AppointmentDecision, DocumentType, ExtractionRecord, LaborContract, RewardCategory,
    RewardDiscipline, TransferDecision,
};
use regex::{Regex, RegexBuilder};

// ── Shared pattern pieces ────────────────────────────────────────────────────

// ASCII letters, the Vietnamese uppercase accented letters and a literal space.
// Chains compile case-insensitively, so lowercase forms match too. Newlines are
// excluded: a captured value ends with its line.
macro_rules! vn_text {
    () => {
        "[A-ZÀÁẠẢÃÂẦẤẬẨẪĂẰẮẶẲẴÈÉẸẺẼÊỀẾỆỂỄÌÍỊỈĨÒÓỌỎÕÔỒỐỘỔỖƠỜỚỢỞỠÙÚỤỦŨƯỪỨỰỬỮỲÝỴỶỸĐ ]"
    };
}

// Day/month/year, no calendar validation.
macro_rules! date {
    () => {
        r"\d{1,2}[/-]\d{1,2}[/-]\d{4}"
    };
}

/// Character class shared by every name and free-text field.
pub const VIETNAMESE_TEXT_CLASS: &str = vn_text!();

/// Date shape accepted by every date field.
pub const DATE_PATTERN: &str = date!();

// `<label>[: \t]+<capture>`
macro_rules! labeled {
    ($label:literal, text) => {
        concat!(r"\b", $label, r"[: \t]+(", vn_text!(), "+)")
    };
    ($label:literal, date) => {
        concat!(r"\b", $label, r"[: \t]+(", date!(), ")")
    };
    ($label:literal, code) => {
        concat!(r"\b", $label, r"[: \t]+([A-Z0-9]+)")
    };
}

// `<label>:<capture>`, for generic labels that prefix a more specific one
// ("Chức vụ" vs "Chức vụ cũ"), where a bare space would capture the suffix.
macro_rules! colon_labeled {
    ($label:literal, text) => {
        concat!(r"\b", $label, r":[ \t]*(", vn_text!(), "+)")
    };
}

// ── Compiled pattern chains ──────────────────────────────────────────────────

macro_rules! chain {
    ($name:ident, [$($pat:expr),+ $(,)?]) => {
        fn $name() -> &'static [Regex] {
            static R: OnceLock<Vec<Regex>> = OnceLock::new();
            R.get_or_init(|| compile_chain(stringify!($name), &[$($pat),+]))
        }
    };
}

/// Compile a chain, dropping (and logging) any pattern that fails so the
/// remaining patterns still run.
fn compile_chain(chain: &str, patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| match RegexBuilder::new(p).case_insensitive(true).build() {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!("Dropping invalid pattern in {chain}: {e}");
                None
            }
        })
        .collect()
}

chain!(person_name, [
    labeled!("Ông", text),
    labeled!("Bà", text),
    labeled!("Họ và tên", text),
]);
chain!(signer, [
    labeled!("Người ký", text),
    labeled!("Ký tên", text),
]);
// Document numbers start with a digit ("15/QĐ-NS"). A bare "Số" label only
// counts at the start of a line, so "Mã số" and "Số điện thoại" never match.
chain!(decision_number, [
    r"(?m)^[ \t]*Số[: \t]+(\d[A-Z0-9Đ/-]*)",
    r"\bQuyết định số[: \t]+(\d[A-Z0-9Đ/-]*)",
]);

chain!(labor_name, [
    labeled!("Họ và tên", text),
    labeled!("Người lao động", text),
    labeled!("BÊN B", text),
]);
chain!(labor_employee_code, [
    labeled!("Mã nhân viên", code),
    labeled!("MSNV", code),
    labeled!("Mã số", code),
]);
chain!(labor_title, [
    labeled!("Chức danh", text),
    labeled!("Vị trí công việc", text),
]);
chain!(labor_contract_type, [
    labeled!("Loại hợp đồng", text),
    concat!(r"\bThời hạn(?: hợp đồng)?:[ \t]*(", vn_text!(), "+)"),
]);
chain!(labor_contract_term, [
    labeled!("Từ ngày", date),
    labeled!("Đến ngày", date),
    concat!(r"\bThời hạn(?: hợp đồng)?[: \t]+(", date!(), ")"),
    concat!(r"\bThời hạn(?: hợp đồng)?[: \t]+(\d{1,3}[ \t]*(?:tháng|năm|ngày)|", vn_text!(), "+)"),
]);

chain!(appointment_old_title, [
    labeled!("Chức vụ cũ", text),
    labeled!("Chức vụ hiện tại", text),
]);
chain!(appointment_new_title, [
    labeled!("Chức vụ mới", text),
    labeled!("Bổ nhiệm chức vụ", text),
    colon_labeled!("Bổ nhiệm", text),
    colon_labeled!("Chức vụ", text),
]);
chain!(appointment_effective_date, [
    labeled!("Ngày hiệu lực", date),
    concat!(r"\bCó hiệu lực từ(?: ngày)?[: \t]+(", date!(), ")"),
]);

// The from/to prepositions ("Từ" / "Sang", "Đến") feed both department chains;
// chain order decides which phrase lands in which field.
chain!(transfer_old_department, [
    labeled!("Bộ phận cũ", text),
    concat!(r"\bTừ[: \t]+(", vn_text!(), r"+?)[ \t]+(?:sang|đến)\b"),
    colon_labeled!("Từ", text),
    colon_labeled!("Bộ phận", text),
]);
chain!(transfer_new_department, [
    labeled!("Bộ phận mới", text),
    labeled!("Sang", text),
    colon_labeled!("Đến", text),
]);
chain!(transfer_date, [
    labeled!("Ngày điều chuyển", date),
    labeled!("Từ ngày", date),
]);

chain!(reward_content, [
    labeled!("Nội dung", text),
    labeled!("Lý do", text),
]);
chain!(reward_issue_date, [
    labeled!("Ngày ban hành", date),
    labeled!("Ngày", date),
]);

const REWARD_KEYWORDS: &[&str] = &["KHEN THƯỞNG", "THƯỞNG"];
const DISCIPLINE_KEYWORDS: &[&str] = &["KỶ LUẬT", "PHẠT"];

// ── Field rule tables ────────────────────────────────────────────────────────

/// One field of a record: its ordered pattern chain and where the value goes.
pub struct FieldRule<R> {
    pub field: &'static str,
    patterns: fn() -> &'static [Regex],
    assign: fn(&mut R, String),
}

impl<R> FieldRule<R> {
    /// Trimmed group 1 of the first pattern that matches, or an empty string.
    pub fn capture(&self, text: &str) -> String {
        first_capture(text, (self.patterns)())
    }
}

macro_rules! rule {
    ($record:ty, $field:ident, $patterns:path) => {
        FieldRule::<$record> {
            field: stringify!($field),
            patterns: $patterns,
            assign: |r: &mut $record, v: String| r.$field = v,
        }
    };
}

pub fn labor_contract_rules() -> Vec<FieldRule<LaborContract>> {
    vec![
        rule!(LaborContract, name, labor_name),
        rule!(LaborContract, employee_code, labor_employee_code),
        rule!(LaborContract, title, labor_title),
        rule!(LaborContract, contract_type, labor_contract_type),
        rule!(LaborContract, contract_term, labor_contract_term),
    ]
}

pub fn appointment_rules() -> Vec<FieldRule<AppointmentDecision>> {
    vec![
        rule!(AppointmentDecision, name, person_name),
        rule!(AppointmentDecision, old_title, appointment_old_title),
        rule!(AppointmentDecision, new_title, appointment_new_title),
        rule!(AppointmentDecision, effective_date, appointment_effective_date),
        rule!(AppointmentDecision, signer, signer),
        rule!(AppointmentDecision, decision_number, decision_number),
    ]
}

pub fn transfer_rules() -> Vec<FieldRule<TransferDecision>> {
    vec![
        rule!(TransferDecision, name, person_name),
        rule!(TransferDecision, old_department, transfer_old_department),
        rule!(TransferDecision, new_department, transfer_new_department),
        rule!(TransferDecision, transfer_date, transfer_date),
        rule!(TransferDecision, signer, signer),
        rule!(TransferDecision, decision_number, decision_number),
    ]
}

/// Regex-driven fields only; `category` is decided by [`reward_category`].
pub fn reward_discipline_rules() -> Vec<FieldRule<RewardDiscipline>> {
    vec![
        rule!(RewardDiscipline, name, person_name),
        rule!(RewardDiscipline, decision_content, reward_content),
        rule!(RewardDiscipline, issue_date, reward_issue_date),
        rule!(RewardDiscipline, signer, signer),
        rule!(RewardDiscipline, decision_number, decision_number),
    ]
}

// ── Public extraction API ────────────────────────────────────────────────────

pub struct Extractor;

impl Extractor {
    /// Run the type's extraction chain over the full recognized text.
    pub fn extract(doc_type: DocumentType, text: &str) -> ExtractionRecord {
        match doc_type {
            DocumentType::LaborContract => {
                ExtractionRecord::LaborContract(Self::labor_contract(text))
            }
            DocumentType::AppointmentDecision => {
                ExtractionRecord::AppointmentDecision(Self::appointment_decision(text))
            }
            DocumentType::TransferDecision => {
                ExtractionRecord::TransferDecision(Self::transfer_decision(text))
            }
            DocumentType::RewardDiscipline => {
                ExtractionRecord::RewardDiscipline(Self::reward_discipline(text))
            }
        }
    }

    pub fn labor_contract(text: &str) -> LaborContract {
        apply_rules(text, &labor_contract_rules())
    }

    pub fn appointment_decision(text: &str) -> AppointmentDecision {
        apply_rules(text, &appointment_rules())
    }

    pub fn transfer_decision(text: &str) -> TransferDecision {
        apply_rules(text, &transfer_rules())
    }

    pub fn reward_discipline(text: &str) -> RewardDiscipline {
        let mut record: RewardDiscipline = apply_rules(text, &reward_discipline_rules());
        if let Some(category) = reward_category(text) {
            record.category = category.as_str().to_string();
        }
        record
    }
}

/// Reward keywords take precedence over discipline keywords.
pub fn reward_category(text: &str) -> Option<RewardCategory> {
    let upper = text.to_uppercase();
    if REWARD_KEYWORDS.iter().any(|k| upper.contains(k)) {
        Some(RewardCategory::Reward)
    } else if DISCIPLINE_KEYWORDS.iter().any(|k| upper.contains(k)) {
        Some(RewardCategory::Discipline)
    } else {
        None
    }
}

fn apply_rules<R: Default>(text: &str, rules: &[FieldRule<R>]) -> R {
    let mut record = R::default();
    for rule in rules {
        let value = rule.capture(text);
        if value.is_empty() {
            tracing::debug!("No pattern matched field '{}'", rule.field);
        }
        (rule.assign)(&mut record, value);
    }
    record
}

fn first_capture(text: &str, patterns: &[Regex]) -> String {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

// ── Tests ────────────────────────────────────────────────────────────────────
