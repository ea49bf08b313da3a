//! Persistence seams for the directory and the three ledgers.
//!
//! Every method maps storage failures to [`AppError::Persistence`]. Writes that
//! must respect a uniqueness key (`(employee_id, date)` for attendance,
//! `(employee_id, month, year)` for payroll) are performed atomically by the
//! backend rather than by read-then-write in the caller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, DailyAttendance};
use crate::model::employee::{Employee, EmployeeStatus, SalaryStructure};
use crate::model::leave_request::LeaveRequest;
use crate::model::payroll::{PayrollDraft, PayrollHistoryEntry, PayrollRecord};

pub mod memory;
pub mod mysql;

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn find_by_status(&self, status: EmployeeStatus) -> Result<Vec<Employee>, AppError>;

    async fn find_employee(&self, id: u64) -> Result<Option<Employee>, AppError>;

    /// Returns `false` when no employee has this id.
    async fn update_salary_structure(
        &self,
        id: u64,
        structure: &SalaryStructure,
    ) -> Result<bool, AppError>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Writes or overwrites the single record for `(employee_id, date)`.
    async fn upsert_attendance(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError>;

    /// Creates the record only when none exists for `(employee_id, date)`.
    /// Returns whether a record was created. Never overwrites.
    async fn insert_attendance_if_absent(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<bool, AppError>;

    /// Records with `from <= date <= to`.
    async fn attendance_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError>;

    async fn attendance_for_employee(&self, employee_id: u64)
    -> Result<Vec<AttendanceRecord>, AppError>;

    async fn attendance_on(&self, date: NaiveDate) -> Result<Vec<DailyAttendance>, AppError>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// APPROVED leaves whose inclusive interval contains `date`.
    async fn approved_leaves_covering(&self, date: NaiveDate)
    -> Result<Vec<LeaveRequest>, AppError>;
}

#[async_trait]
pub trait PayrollStore: Send + Sync {
    /// Inserts or fully overwrites the record keyed by `(employee_id, month, year)`;
    /// the stored status is always reset to GENERATED.
    async fn upsert_payroll(&self, draft: &PayrollDraft) -> Result<PayrollRecord, AppError>;

    /// Newest period first.
    async fn payrolls_for_employee(&self, employee_id: u64)
    -> Result<Vec<PayrollRecord>, AppError>;

    /// Every employee's records, newest period first, with employee display fields.
    async fn payroll_history(&self) -> Result<Vec<PayrollHistoryEntry>, AppError>;
}

pub trait Store: EmployeeDirectory + AttendanceStore + LeaveStore + PayrollStore {}

impl<T> Store for T where T: EmployeeDirectory + AttendanceStore + LeaveStore + PayrollStore {}

pub type SharedStore = Arc<dyn Store>;
