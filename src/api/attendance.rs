use crate::auth::auth::AuthUser;
use crate::model::attendance::AttendanceStatus;
use crate::service::attendance as attendance_service;
use crate::store::Store;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = 1)]
    pub employee_id: u64,

    #[schema(example = "2026-01-15", value_type = String, format = "date")]
    pub date: NaiveDate,

    #[schema(example = "PRESENT")]
    pub status: AttendanceStatus,
}

#[derive(Deserialize, IntoParams)]
pub struct DailyQuery {
    /// Calendar day, `YYYY-MM-DD`
    #[param(value_type = String, format = "date", example = "2026-01-15")]
    pub date: Option<NaiveDate>,
}

/// Mark (or re-mark) an employee's attendance for a day
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 200, description = "Attendance marked", body = Object, example = json!({
            "message": "Attendance marked successfully",
            "data": { "id": 10, "employee_id": 1, "date": "2026-01-15", "status": "PRESENT" }
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Employees can only mark their own attendance"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    payload: web::Json<MarkAttendance>,
) -> Result<impl Responder, AppError> {
    auth.require_self_or_privileged(payload.employee_id, "mark attendance for")?;

    let record = attendance_service::mark_attendance(
        store.get_ref(),
        payload.employee_id,
        payload.date,
        payload.status,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance marked successfully",
        "data": record
    })))
}

/// Self check-in: marks today PRESENT for the caller
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in", body = Object, example = json!({
            "message": "Check-in successful",
            "data": { "id": 11, "employee_id": 1, "date": "2026-01-15", "status": "PRESENT" }
        })),
        (status = 400, description = "No employee profile linked to your account"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    store: web::Data<dyn Store>,
) -> Result<impl Responder, AppError> {
    let today = Local::now().date_naive();
    let record = attendance_service::self_check_in(store.get_ref(), auth.employee_id, today).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Check-in successful",
        "data": record
    })))
}

/// Attendance of every employee for one day (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/attendance/daily",
    params(DailyQuery),
    responses(
        (status = 200, description = "Records for the day", body = Object),
        (status = 400, description = "Date is required"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn daily_attendance(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    query: web::Query<DailyQuery>,
) -> Result<impl Responder, AppError> {
    auth.require_hr_or_admin()?;

    let date = query
        .date
        .ok_or_else(|| AppError::Validation("Date is required".into()))?;
    let data = attendance_service::daily_attendance(store.get_ref(), date).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "data": data })))
}

/// Attendance history of one employee
#[utoipa::path(
    get,
    path = "/api/attendance/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Attendance records", body = Object),
        (status = 403, description = "Employees can only view their own attendance")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn employee_attendance(
    auth: AuthUser,
    store: web::Data<dyn Store>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let employee_id = path.into_inner();
    auth.require_self_or_privileged(employee_id, "view attendance for")?;

    let data = attendance_service::attendance_by_employee(store.get_ref(), employee_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "data": data })))
}
