use chrono::NaiveDate;
use tracing::info;

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, DailyAttendance};
use crate::store::{AttendanceStore, EmployeeDirectory};

/// Writes or re-marks the employee's record for `date`. Any status may
/// replace any other.
pub async fn mark_attendance<S>(
    store: &S,
    employee_id: u64,
    date: NaiveDate,
    status: AttendanceStatus,
) -> Result<AttendanceRecord, AppError>
where
    S: EmployeeDirectory + AttendanceStore + ?Sized,
{
    if store.find_employee(employee_id).await?.is_none() {
        return Err(AppError::NotFound("Employee not found".into()));
    }

    let record = store.upsert_attendance(employee_id, date, status).await?;
    info!(employee_id, %date, status = %status, "Attendance marked");
    Ok(record)
}

/// Marks `today` PRESENT for the employee linked to the caller.
pub async fn self_check_in<S>(
    store: &S,
    employee_id: Option<u64>,
    today: NaiveDate,
) -> Result<AttendanceRecord, AppError>
where
    S: EmployeeDirectory + AttendanceStore + ?Sized,
{
    let employee_id = employee_id
        .ok_or_else(|| AppError::Validation("No employee profile linked to your account".into()))?;

    mark_attendance(store, employee_id, today, AttendanceStatus::Present).await
}

pub async fn attendance_by_employee<S>(
    store: &S,
    employee_id: u64,
) -> Result<Vec<AttendanceRecord>, AppError>
where
    S: AttendanceStore + ?Sized,
{
    store.attendance_for_employee(employee_id).await
}

pub async fn daily_attendance<S>(store: &S, date: NaiveDate) -> Result<Vec<DailyAttendance>, AppError>
where
    S: AttendanceStore + ?Sized,
{
    store.attendance_on(date).await
}
