use crate::api::attendance::MarkAttendance;
use crate::api::payroll::{GenerateResponse, PayrollPeriod};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::employee::{SalaryComponent, SalaryStructure};
use crate::model::payroll::{
    AttendanceSummary, EmployeeSummary, PayrollBreakdown, PayrollHistoryEntry, PayrollRecord,
    PayrollStatus,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Payroll API",
        version = "1.0.0",
        description = r#"
## Attendance & Payroll

Tracks one attendance record per employee per calendar day and turns a month
of attendance into a payroll record.

### Key Features
- **Attendance**
  - Mark or re-mark attendance, self check-in, daily and per-employee views
  - A daily job backfills ABSENT (or LEAVE, when an approved leave covers the day)
- **Payroll**
  - Per-employee and batch generation for a month; re-generation overwrites
  - Salary structure maintenance and payroll history

### Security
All endpoints require **JWT Bearer authentication**. Employees may only see and
mark their own records; generation, salary changes and company-wide views are
limited to **HR** and **Admin**.
"#,
    ),
    paths(
        crate::api::attendance::mark_attendance,
        crate::api::attendance::check_in,
        crate::api::attendance::daily_attendance,
        crate::api::attendance::employee_attendance,

        crate::api::payroll::generate_payroll,
        crate::api::payroll::run_payroll,
        crate::api::payroll::update_salary_structure,
        crate::api::payroll::all_payroll_history,
        crate::api::payroll::employee_payroll_history
    ),
    components(
        schemas(
            MarkAttendance,
            AttendanceRecord,
            AttendanceStatus,
            PayrollPeriod,
            GenerateResponse,
            SalaryComponent,
            SalaryStructure,
            AttendanceSummary,
            PayrollBreakdown,
            PayrollRecord,
            PayrollStatus,
            EmployeeSummary,
            PayrollHistoryEntry
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Attendance", description = "Attendance ledger APIs"),
        (name = "Payroll", description = "Payroll generation and history APIs"),
    )
)]
pub struct ApiDoc;

/// Prefix the handlers' `utoipa::path` attributes are written against.
const DOCUMENTED_PREFIX: &str = "/api";

/// The API document with every path moved under the configured `api_prefix`.
pub fn openapi_for(api_prefix: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let prefix = api_prefix.trim_end_matches('/');

    doc.paths.paths = std::mem::take(&mut doc.paths.paths)
        .into_iter()
        .map(|(path, item)| {
            let rest = path.strip_prefix(DOCUMENTED_PREFIX).unwrap_or(path.as_str());
            (format!("{prefix}{rest}"), item)
        })
        .collect();
    doc
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
