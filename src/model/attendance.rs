use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One cell of an attendance sheet.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AttendanceMark {
    #[serde(rename = "P")]
    Present,
    #[serde(rename = "A")]
    Absent,
    #[serde(rename = "O")]
    Off,
}

impl AttendanceMark {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'P' => Some(AttendanceMark::Present),
            'A' => Some(AttendanceMark::Absent),
            'O' => Some(AttendanceMark::Off),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            AttendanceMark::Present => 'P',
            AttendanceMark::Absent => 'A',
            AttendanceMark::Off => 'O',
        }
    }

    /// Parse a boundary value such as `"P"` or `" a "`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut chars = raw.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => None,
        }
    }
}

/// Attendance of a single worker as returned by the backend.
///
/// Marks are kept as raw strings so one malformed cell does not reject the
/// whole sheet; they are validated when the row is expanded.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[schema(example = "w-1001")]
    pub worker_id: String,

    /// calendar date string -> mark character
    #[serde(default)]
    #[schema(value_type = Object, example = json!({"2025-07-24": "P", "25/07/2025": "O"}))]
    pub attendance: BTreeMap<String, String>,

    #[serde(default)]
    pub present_days: u32,

    #[serde(default)]
    pub absent_days: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceData {
    pub sheet_id: Option<String>,
    #[serde(default)]
    pub attendances: Vec<AttendanceRecord>,
}

/// Whole-sheet save payload: worker id -> (date -> mark).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkAttendance {
    pub tender_id: String,
    #[schema(value_type = Object)]
    pub attendances: BTreeMap<String, BTreeMap<String, AttendanceMark>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSheetWorker {
    pub new_worker_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessPaymentRequest {
    pub event_name: String,
    pub sheet_id: String,
}

/// One Electronic Challan cum Return row produced by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct EcrRow {
    #[serde(rename = "UAN")]
    pub uan: String,
    pub member_name: String,
    pub gross_wages: f64,
    #[serde(rename = "EPFWages")]
    pub epf_wages: f64,
    #[serde(rename = "EPSWages")]
    pub eps_wages: f64,
    #[serde(rename = "EDLIWages")]
    pub edli_wages: f64,
    #[serde(rename = "EPFContributionRemitted")]
    pub epf_contribution_remitted: f64,
    #[serde(rename = "EPSContributionRemitted")]
    pub eps_contribution_remitted: f64,
    #[serde(rename = "EPFAndEPSDiffRemitted")]
    pub epf_and_eps_diff_remitted: f64,
    #[serde(rename = "NCPDays")]
    pub ncp_days: u32,
    pub refund_of_advances: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    #[serde(default)]
    pub processed: Vec<EcrRow>,
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub missing: Vec<serde_json::Value>,
    #[serde(default)]
    pub txt_data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_characters_case_insensitively() {
        assert_eq!(AttendanceMark::parse("p"), Some(AttendanceMark::Present));
        assert_eq!(AttendanceMark::parse(" A "), Some(AttendanceMark::Absent));
        assert_eq!(AttendanceMark::parse("o"), Some(AttendanceMark::Off));
        assert_eq!(AttendanceMark::parse("X"), None);
        assert_eq!(AttendanceMark::parse("PA"), None);
        assert_eq!(AttendanceMark::parse(""), None);
    }

    #[test]
    fn record_reads_backend_shape() {
        let json = serde_json::json!({
            "workerId": "w-1",
            "attendance": {"2025-07-24": "P", "2025-07-25": "A"},
            "presentDays": 1,
            "absentDays": 1
        });
        let record: AttendanceRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.worker_id, "w-1");
        assert_eq!(record.attendance.len(), 2);
        assert_eq!(record.present_days, 1);
    }

    #[test]
    fn ecr_row_uses_backend_field_names() {
        let json = serde_json::json!({
            "UAN": "100200300400",
            "MemberName": "UMESH KUMAR RAJAK",
            "GrossWages": 15417.0,
            "EPFWages": 15417.0,
            "EPSWages": 15000.0,
            "EDLIWages": 15000.0,
            "EPFContributionRemitted": 1851.0,
            "EPSContributionRemitted": 1250.0,
            "EPFAndEPSDiffRemitted": 601.0,
            "NCPDays": 0,
            "RefundOfAdvances": 0.0
        });
        let row: EcrRow = serde_json::from_value(json).unwrap();
        assert_eq!(row.uan, "100200300400");
        assert_eq!(row.epf_contribution_remitted, 1851.0);
    }
}
