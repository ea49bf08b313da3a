//! Monthly payroll generation: attendance for the period is folded into a
//! summary, converted into a financial breakdown and upserted per
//! `(employee, month, year)`.

use chrono::Datelike;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::error::AppError;
use crate::model::attendance::AttendanceRecord;
use crate::model::employee::{Employee, EmployeeStatus, SalaryStructure};
use crate::model::payroll::{
    AttendanceSummary, PayrollBreakdown, PayrollDraft, PayrollHistoryEntry, PayrollRecord,
};
use crate::store::{AttendanceStore, EmployeeDirectory, PayrollStore};
use crate::utils::dates;

/// Employees processed concurrently by [`generate_payroll`].
const BATCH_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub employee_id: u64,
    pub message: String,
}

#[derive(Debug, Default, Serialize)]
pub struct BatchOutcome {
    pub generated: Vec<PayrollRecord>,
    pub failures: Vec<BatchFailure>,
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// PRESENT counts 1, HALF_DAY 0.5, ABSENT is a loss-of-pay day and LEAVE is
/// paid. Days with no record contribute to neither total.
pub fn summarize_attendance(records: &[AttendanceRecord], total_days: u32) -> AttendanceSummary {
    let (present_days, lop_days) = records.iter().fold((0.0, 0.0), |(present, lop), r| {
        (present + r.status.present_weight(), lop + r.status.lop_weight())
    });

    AttendanceSummary {
        total_days,
        present_days,
        lop_days,
    }
}

pub fn compute_breakdown(structure: &SalaryStructure, summary: &AttendanceSummary) -> PayrollBreakdown {
    let allowances = structure.total_allowances();
    let deductions = structure.total_deductions();

    let gross = structure.basic + structure.hra + allowances;
    let per_day = gross / f64::from(summary.total_days);
    let lop_deduction = summary.lop_days * per_day;
    let net_salary = gross - deductions - lop_deduction;

    PayrollBreakdown {
        basic: structure.basic,
        hra: structure.hra,
        allowances,
        gross,
        deductions,
        lop_deduction: round_cents(lop_deduction),
        net_salary: round_cents(net_salary),
    }
}

fn validate_period(month: u32, year: i32) -> Result<(), AppError> {
    if !(1..=12).contains(&month) {
        return Err(AppError::Validation("month must be between 1 and 12".into()));
    }
    if year <= 0 {
        return Err(AppError::Validation("year must be a positive number".into()));
    }
    Ok(())
}

#[instrument(skip(store, employee), fields(employee_id = employee.id))]
pub async fn run_payroll<S>(
    store: &S,
    employee: &Employee,
    month: u32,
    year: i32,
) -> Result<PayrollRecord, AppError>
where
    S: AttendanceStore + PayrollStore + ?Sized,
{
    validate_period(month, year)?;
    employee.salary_structure.validate()?;

    let (first_day, last_day) = dates::month_bounds(year, month)
        .ok_or_else(|| AppError::Validation(format!("{year}-{month:02} is not a valid period")))?;
    let total_days = last_day.day();

    let records = store
        .attendance_in_range(employee.id, first_day, last_day)
        .await?;

    let attendance_summary = summarize_attendance(&records, total_days);
    let breakdown = compute_breakdown(&employee.salary_structure, &attendance_summary);

    let draft = PayrollDraft {
        employee_id: employee.id,
        month,
        year,
        attendance_summary,
        breakdown,
    };

    store.upsert_payroll(&draft).await
}

/// Looks the employee up by id, then runs [`run_payroll`].
pub async fn run_payroll_for<S>(
    store: &S,
    employee_id: u64,
    month: u32,
    year: i32,
) -> Result<PayrollRecord, AppError>
where
    S: EmployeeDirectory + AttendanceStore + PayrollStore + ?Sized,
{
    let employee = store
        .find_employee(employee_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Employee not found".into()))?;

    run_payroll(store, &employee, month, year).await
}

/// Runs payroll for every ACTIVE employee. A failing employee is logged and
/// reported in the outcome; it never stops the rest of the batch.
#[instrument(skip(store))]
pub async fn generate_payroll<S>(store: &S, month: u32, year: i32) -> Result<BatchOutcome, AppError>
where
    S: EmployeeDirectory + AttendanceStore + PayrollStore + ?Sized,
{
    validate_period(month, year)?;

    let employees = store.find_by_status(EmployeeStatus::Active).await?;
    let candidates = employees.len();

    let outcome = stream::iter(employees)
        .map(|employee| async move {
            let result = run_payroll(store, &employee, month, year).await;
            (employee, result)
        })
        .buffer_unordered(BATCH_CONCURRENCY)
        .fold(BatchOutcome::default(), |mut acc, (employee, result)| async move {
            match result {
                Ok(record) => acc.generated.push(record),
                Err(e) => {
                    error!(error = %e, employee_id = employee.id, name = %employee.name, "Payroll generation failed");
                    acc.failures.push(BatchFailure {
                        employee_id: employee.id,
                        message: e.to_string(),
                    });
                }
            }
            acc
        })
        .await;

    info!(
        candidates,
        generated = outcome.generated.len(),
        failed = outcome.failures.len(),
        "Payroll generation completed"
    );

    Ok(outcome)
}

pub async fn employee_payroll_history<S>(
    store: &S,
    employee_id: u64,
) -> Result<Vec<PayrollRecord>, AppError>
where
    S: PayrollStore + ?Sized,
{
    store.payrolls_for_employee(employee_id).await
}

pub async fn all_payroll_history<S>(store: &S) -> Result<Vec<PayrollHistoryEntry>, AppError>
where
    S: PayrollStore + ?Sized,
{
    store.payroll_history().await
}

pub async fn update_salary_structure<S>(
    store: &S,
    employee_id: u64,
    structure: SalaryStructure,
) -> Result<SalaryStructure, AppError>
where
    S: EmployeeDirectory + ?Sized,
{
    structure.validate()?;

    if !store.update_salary_structure(employee_id, &structure).await? {
        return Err(AppError::NotFound("Employee not found".into()));
    }

    info!(employee_id, "Salary structure updated");
    Ok(structure)
}
