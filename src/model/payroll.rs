use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum PayrollStatus {
    Generated,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceSummary {
    #[schema(example = 30)]
    pub total_days: u32,
    /// Half days count as 0.5.
    #[schema(example = 26.5)]
    pub present_days: f64,
    #[schema(example = 2.0)]
    pub lop_days: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollBreakdown {
    pub basic: f64,
    pub hra: f64,
    /// Sum of all allowance amounts.
    pub allowances: f64,
    pub gross: f64,
    /// Sum of all standard deduction amounts.
    pub deductions: f64,
    pub lop_deduction: f64,
    pub net_salary: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 3,
    "employee_id": 1,
    "month": 6,
    "year": 2026,
    "attendance_summary": { "total_days": 30, "present_days": 27.5, "lop_days": 2.0 },
    "breakdown": {
        "basic": 30000.0,
        "hra": 5000.0,
        "allowances": 0.0,
        "gross": 35000.0,
        "deductions": 0.0,
        "lop_deduction": 2333.33,
        "net_salary": 32666.67
    },
    "status": "GENERATED"
}))]
pub struct PayrollRecord {
    pub id: u64,
    pub employee_id: u64,
    pub month: u32,
    pub year: i32,
    pub attendance_summary: AttendanceSummary,
    pub breakdown: PayrollBreakdown,
    pub status: PayrollStatus,
}

/// Values the engine computes for one (employee, month, year) before they are persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollDraft {
    pub employee_id: u64,
    pub month: u32,
    pub year: i32,
    pub attendance_summary: AttendanceSummary,
    pub breakdown: PayrollBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeSummary {
    pub name: String,
    pub department: String,
    pub designation: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PayrollHistoryEntry {
    #[serde(flatten)]
    pub payroll: PayrollRecord,
    pub employee: EmployeeSummary,
}
