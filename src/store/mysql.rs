use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::mysql::MySqlQueryResult;
use sqlx::{FromRow, MySqlPool};

use super::{AttendanceStore, EmployeeDirectory, LeaveStore, PayrollStore};
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, DailyAttendance};
use crate::model::employee::{Employee, EmployeeStatus, SalaryComponent, SalaryStructure};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::payroll::{
    AttendanceSummary, EmployeeSummary, PayrollBreakdown, PayrollDraft, PayrollHistoryEntry,
    PayrollRecord, PayrollStatus,
};

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn parse_column<T: std::str::FromStr>(column: &str, raw: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::Persistence(format!("unexpected {column} value '{raw}'")))
}

/// Only a unique-key collision means the row already exists; foreign-key and
/// data errors stay failures.
fn created_unless_duplicate(
    result: Result<MySqlQueryResult, sqlx::Error>,
) -> Result<bool, AppError> {
    match result {
        Ok(done) => Ok(done.rows_affected() == 1),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    employee_code: String,
    name: String,
    department: String,
    designation: String,
    status: String,
    basic: f64,
    hra: f64,
    allowances: Json<Vec<SalaryComponent>>,
    deductions: Json<Vec<SalaryComponent>>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = AppError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(Employee {
            id: row.id,
            employee_code: row.employee_code,
            name: row.name,
            department: row.department,
            designation: row.designation,
            status: parse_column("employee status", &row.status)?,
            salary_structure: SalaryStructure {
                basic: row.basic,
                hra: row.hra,
                allowances: row.allowances.0,
                deductions: row.deductions.0,
            },
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    status: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = AppError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            status: parse_column("attendance status", &row.status)?,
        })
    }
}

#[derive(FromRow)]
struct DailyAttendanceRow {
    #[sqlx(flatten)]
    record: AttendanceRow,
    employee_name: String,
    department: String,
    designation: String,
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
}

#[derive(FromRow)]
struct PayrollRow {
    id: u64,
    employee_id: u64,
    month: u32,
    year: i32,
    total_days: u32,
    present_days: f64,
    lop_days: f64,
    basic: f64,
    hra: f64,
    allowances: f64,
    gross: f64,
    deductions: f64,
    lop_deduction: f64,
    net_salary: f64,
    status: String,
}

impl TryFrom<PayrollRow> for PayrollRecord {
    type Error = AppError;

    fn try_from(row: PayrollRow) -> Result<Self, Self::Error> {
        Ok(PayrollRecord {
            id: row.id,
            employee_id: row.employee_id,
            month: row.month,
            year: row.year,
            attendance_summary: AttendanceSummary {
                total_days: row.total_days,
                present_days: row.present_days,
                lop_days: row.lop_days,
            },
            breakdown: PayrollBreakdown {
                basic: row.basic,
                hra: row.hra,
                allowances: row.allowances,
                gross: row.gross,
                deductions: row.deductions,
                lop_deduction: row.lop_deduction,
                net_salary: row.net_salary,
            },
            status: parse_column::<PayrollStatus>("payroll status", &row.status)?,
        })
    }
}

#[derive(FromRow)]
struct PayrollHistoryRow {
    #[sqlx(flatten)]
    payroll: PayrollRow,
    employee_name: String,
    department: String,
    designation: String,
}

const EMPLOYEE_COLUMNS: &str = r#"
    id, employee_code, name, department, designation, status,
    basic, hra, allowances, deductions
"#;

const PAYROLL_COLUMNS: &str = r#"
    p.id, p.employee_id, p.month, p.year,
    p.total_days, p.present_days, p.lop_days,
    p.basic, p.hra, p.allowances, p.gross, p.deductions, p.lop_deduction, p.net_salary,
    p.status
"#;

#[async_trait]
impl EmployeeDirectory for MySqlStore {
    async fn find_by_status(&self, status: EmployeeStatus) -> Result<Vec<Employee>, AppError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE status = ? ORDER BY id");

        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(status.as_ref())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Employee::try_from)
            .collect()
    }

    async fn find_employee(&self, id: u64) -> Result<Option<Employee>, AppError> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");

        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn update_salary_structure(
        &self,
        id: u64,
        structure: &SalaryStructure,
    ) -> Result<bool, AppError> {
        // Rows whose values don't change are not a reliable existence signal.
        let matches = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        if matches == 0 {
            return Ok(false);
        }

        sqlx::query(
            r#"
            UPDATE employees
            SET basic = ?, hra = ?, allowances = ?, deductions = ?
            WHERE id = ?
            "#,
        )
        .bind(structure.basic)
        .bind(structure.hra)
        .bind(Json(&structure.allowances))
        .bind(Json(&structure.deductions))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn upsert_attendance(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError> {
        sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, status)
            VALUES (?, ?, ?)
            ON DUPLICATE KEY UPDATE status = VALUES(status)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(status.as_ref())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, employee_id, date, status
            FROM attendance
            WHERE employee_id = ? AND date = ?
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        AttendanceRecord::try_from(row)
    }

    async fn insert_attendance_if_absent(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<bool, AppError> {
        // A concurrent duplicate hits the unique (employee_id, date) key.
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, status)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(status.as_ref())
        .execute(&self.pool)
        .await;

        created_unless_duplicate(result)
    }

    async fn attendance_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, employee_id, date, status
            FROM attendance
            WHERE employee_id = ? AND date BETWEEN ? AND ?
            "#,
        )
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(AttendanceRecord::try_from)
        .collect()
    }

    async fn attendance_for_employee(
        &self,
        employee_id: u64,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, employee_id, date, status
            FROM attendance
            WHERE employee_id = ?
            ORDER BY date DESC
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(AttendanceRecord::try_from)
        .collect()
    }

    async fn attendance_on(&self, date: NaiveDate) -> Result<Vec<DailyAttendance>, AppError> {
        let rows = sqlx::query_as::<_, DailyAttendanceRow>(
            r#"
            SELECT a.id, a.employee_id, a.date, a.status,
                   e.name AS employee_name, e.department, e.designation
            FROM attendance a
            JOIN employees e ON e.id = a.employee_id
            WHERE a.date = ?
            ORDER BY a.employee_id
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(DailyAttendance {
                    record: AttendanceRecord::try_from(row.record)?,
                    employee_name: row.employee_name,
                    department: row.department,
                    designation: row.designation,
                })
            })
            .collect()
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn approved_leaves_covering(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let rows = sqlx::query_as::<_, LeaveRow>(
            r#"
            SELECT id, employee_id, start_date, end_date, status
            FROM leave_requests
            WHERE status = ?
            AND start_date <= ?
            AND end_date >= ?
            "#,
        )
        .bind(LeaveStatus::Approved.as_ref())
        .bind(date)
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(LeaveRequest {
                    id: row.id,
                    employee_id: row.employee_id,
                    start_date: row.start_date,
                    end_date: row.end_date,
                    status: parse_column("leave status", &row.status)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl PayrollStore for MySqlStore {
    async fn upsert_payroll(&self, draft: &PayrollDraft) -> Result<PayrollRecord, AppError> {
        let summary = &draft.attendance_summary;
        let b = &draft.breakdown;

        sqlx::query(
            r#"
            INSERT INTO payroll
                (employee_id, month, year, total_days, present_days, lop_days,
                 basic, hra, allowances, gross, deductions, lop_deduction, net_salary, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                total_days = VALUES(total_days),
                present_days = VALUES(present_days),
                lop_days = VALUES(lop_days),
                basic = VALUES(basic),
                hra = VALUES(hra),
                allowances = VALUES(allowances),
                gross = VALUES(gross),
                deductions = VALUES(deductions),
                lop_deduction = VALUES(lop_deduction),
                net_salary = VALUES(net_salary),
                status = VALUES(status)
            "#,
        )
        .bind(draft.employee_id)
        .bind(draft.month)
        .bind(draft.year)
        .bind(summary.total_days)
        .bind(summary.present_days)
        .bind(summary.lop_days)
        .bind(b.basic)
        .bind(b.hra)
        .bind(b.allowances)
        .bind(b.gross)
        .bind(b.deductions)
        .bind(b.lop_deduction)
        .bind(b.net_salary)
        .bind(PayrollStatus::Generated.as_ref())
        .execute(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {PAYROLL_COLUMNS} FROM payroll p WHERE p.employee_id = ? AND p.month = ? AND p.year = ?"
        );
        let row = sqlx::query_as::<_, PayrollRow>(&sql)
            .bind(draft.employee_id)
            .bind(draft.month)
            .bind(draft.year)
            .fetch_one(&self.pool)
            .await?;

        PayrollRecord::try_from(row)
    }

    async fn payrolls_for_employee(
        &self,
        employee_id: u64,
    ) -> Result<Vec<PayrollRecord>, AppError> {
        let sql = format!(
            "SELECT {PAYROLL_COLUMNS} FROM payroll p WHERE p.employee_id = ? ORDER BY p.year DESC, p.month DESC"
        );

        sqlx::query_as::<_, PayrollRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(PayrollRecord::try_from)
            .collect()
    }

    async fn payroll_history(&self) -> Result<Vec<PayrollHistoryEntry>, AppError> {
        let sql = format!(
            r#"
            SELECT {PAYROLL_COLUMNS},
                   e.name AS employee_name, e.department, e.designation
            FROM payroll p
            JOIN employees e ON e.id = p.employee_id
            ORDER BY p.year DESC, p.month DESC
            "#
        );

        let rows = sqlx::query_as::<_, PayrollHistoryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(PayrollHistoryEntry {
                    payroll: PayrollRecord::try_from(row.payroll)?,
                    employee: EmployeeSummary {
                        name: row.employee_name,
                        department: row.department,
                        designation: row.designation,
                    },
                })
            })
            .collect()
    }
}
