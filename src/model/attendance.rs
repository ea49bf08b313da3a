use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Present,
    HalfDay,
    Absent,
    Leave,
}

impl AttendanceStatus {
    /// Present-day equivalent this status contributes to a payroll summary.
    pub fn present_weight(self) -> f64 {
        match self {
            AttendanceStatus::Present => 1.0,
            AttendanceStatus::HalfDay => 0.5,
            AttendanceStatus::Absent | AttendanceStatus::Leave => 0.0,
        }
    }

    /// Loss-of-pay days this status contributes. Approved leave is paid.
    pub fn lop_weight(self) -> f64 {
        match self {
            AttendanceStatus::Absent => 1.0,
            _ => 0.0,
        }
    }
}

/// One attendance entry per employee per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 10,
    "employee_id": 1,
    "date": "2026-01-15",
    "status": "PRESENT"
}))]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

/// Attendance entry joined with the owning employee's display fields.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DailyAttendance {
    #[serde(flatten)]
    pub record: AttendanceRecord,
    pub employee_name: String,
    pub department: String,
    pub designation: String,
}
