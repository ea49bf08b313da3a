use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::{AttendanceStore, EmployeeDirectory, LeaveStore, PayrollStore};
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, DailyAttendance};
use crate::model::employee::{Employee, EmployeeStatus, SalaryStructure};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::payroll::{
    EmployeeSummary, PayrollDraft, PayrollHistoryEntry, PayrollRecord, PayrollStatus,
};

#[derive(Default)]
struct Tables {
    employees: BTreeMap<u64, Employee>,
    attendance: BTreeMap<(u64, NaiveDate), AttendanceRecord>,
    leaves: Vec<LeaveRequest>,
    payrolls: BTreeMap<(u64, i32, u32), PayrollRecord>,
    next_id: u64,
    failing_employees: HashSet<u64>,
}

impl Tables {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_writable(&self, employee_id: u64) -> Result<(), AppError> {
        if self.failing_employees.contains(&employee_id) {
            return Err(AppError::Persistence(format!(
                "write rejected for employee {employee_id}"
            )));
        }
        Ok(())
    }

    /// `None` for records whose employee is gone, matching the SQL inner joins.
    fn summary_of(&self, employee_id: u64) -> Option<EmployeeSummary> {
        self.employees.get(&employee_id).map(|e| EmployeeSummary {
            name: e.name.clone(),
            department: e.department.clone(),
            designation: e.designation.clone(),
        })
    }
}

/// Employees and leave requests preloaded into a fresh store.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub leaves: Vec<LeaveRequest>,
}

/// Process-local store. Each operation runs under one lock, so conditional
/// inserts and upserts are atomic with respect to each other.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: Seed) -> Self {
        let mut tables = Tables::default();
        for employee in seed.employees {
            tables.next_id = tables.next_id.max(employee.id);
            tables.employees.insert(employee.id, employee);
        }
        for leave in seed.leaves {
            tables.next_id = tables.next_id.max(leave.id);
            tables.leaves.push(leave);
        }

        Self {
            tables: Mutex::new(tables),
        }
    }

    #[cfg(test)]
    pub async fn insert_employee(&self, employee: Employee) {
        let mut t = self.tables.lock().await;
        t.next_id = t.next_id.max(employee.id);
        t.employees.insert(employee.id, employee);
    }

    #[cfg(test)]
    pub async fn insert_leave(
        &self,
        employee_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        status: LeaveStatus,
    ) -> LeaveRequest {
        let mut t = self.tables.lock().await;
        let leave = LeaveRequest {
            id: t.allocate_id(),
            employee_id,
            start_date,
            end_date,
            status,
        };
        t.leaves.push(leave.clone());
        leave
    }

    /// Makes every ledger write for `employee_id` fail with a persistence error.
    #[cfg(test)]
    pub async fn fail_writes_for(&self, employee_id: u64) {
        self.tables.lock().await.failing_employees.insert(employee_id);
    }

    #[cfg(test)]
    pub async fn attendance_count(&self) -> usize {
        self.tables.lock().await.attendance.len()
    }

    #[cfg(test)]
    pub async fn payroll_count(&self) -> usize {
        self.tables.lock().await.payrolls.len()
    }

    #[cfg(test)]
    pub async fn mark_paid(&self, employee_id: u64, month: u32, year: i32) {
        if let Some(p) = self
            .tables
            .lock()
            .await
            .payrolls
            .get_mut(&(employee_id, year, month))
        {
            p.status = PayrollStatus::Paid;
        }
    }
}

#[async_trait]
impl EmployeeDirectory for MemoryStore {
    async fn find_by_status(&self, status: EmployeeStatus) -> Result<Vec<Employee>, AppError> {
        let t = self.tables.lock().await;
        Ok(t.employees
            .values()
            .filter(|e| e.status == status)
            .cloned()
            .collect())
    }

    async fn find_employee(&self, id: u64) -> Result<Option<Employee>, AppError> {
        Ok(self.tables.lock().await.employees.get(&id).cloned())
    }

    async fn update_salary_structure(
        &self,
        id: u64,
        structure: &SalaryStructure,
    ) -> Result<bool, AppError> {
        let mut t = self.tables.lock().await;
        match t.employees.get_mut(&id) {
            Some(e) => {
                e.salary_structure = structure.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn upsert_attendance(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord, AppError> {
        let mut t = self.tables.lock().await;
        t.check_writable(employee_id)?;

        if let Some(existing) = t.attendance.get_mut(&(employee_id, date)) {
            existing.status = status;
            return Ok(existing.clone());
        }

        let record = AttendanceRecord {
            id: t.allocate_id(),
            employee_id,
            date,
            status,
        };
        t.attendance.insert((employee_id, date), record.clone());
        Ok(record)
    }

    async fn insert_attendance_if_absent(
        &self,
        employee_id: u64,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<bool, AppError> {
        let mut t = self.tables.lock().await;
        t.check_writable(employee_id)?;

        if t.attendance.contains_key(&(employee_id, date)) {
            return Ok(false);
        }

        let record = AttendanceRecord {
            id: t.allocate_id(),
            employee_id,
            date,
            status,
        };
        t.attendance.insert((employee_id, date), record);
        Ok(true)
    }

    async fn attendance_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        if from > to {
            return Ok(Vec::new());
        }
        let t = self.tables.lock().await;
        Ok(t.attendance
            .range((employee_id, from)..=(employee_id, to))
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn attendance_for_employee(
        &self,
        employee_id: u64,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let t = self.tables.lock().await;
        Ok(t.attendance
            .range((employee_id, NaiveDate::MIN)..=(employee_id, NaiveDate::MAX))
            .rev()
            .map(|(_, r)| r.clone())
            .collect())
    }

    async fn attendance_on(&self, date: NaiveDate) -> Result<Vec<DailyAttendance>, AppError> {
        let t = self.tables.lock().await;
        Ok(t.attendance
            .values()
            .filter(|r| r.date == date)
            .filter_map(|r| {
                let who = t.summary_of(r.employee_id)?;
                Some(DailyAttendance {
                    record: r.clone(),
                    employee_name: who.name,
                    department: who.department,
                    designation: who.designation,
                })
            })
            .collect())
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn approved_leaves_covering(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let t = self.tables.lock().await;
        Ok(t.leaves
            .iter()
            .filter(|l| l.status == LeaveStatus::Approved && l.covers(date))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PayrollStore for MemoryStore {
    async fn upsert_payroll(&self, draft: &PayrollDraft) -> Result<PayrollRecord, AppError> {
        let mut t = self.tables.lock().await;
        t.check_writable(draft.employee_id)?;

        let key = (draft.employee_id, draft.year, draft.month);
        let id = match t.payrolls.get(&key) {
            Some(existing) => existing.id,
            None => t.allocate_id(),
        };

        let record = PayrollRecord {
            id,
            employee_id: draft.employee_id,
            month: draft.month,
            year: draft.year,
            attendance_summary: draft.attendance_summary.clone(),
            breakdown: draft.breakdown.clone(),
            status: PayrollStatus::Generated,
        };
        t.payrolls.insert(key, record.clone());
        Ok(record)
    }

    async fn payrolls_for_employee(
        &self,
        employee_id: u64,
    ) -> Result<Vec<PayrollRecord>, AppError> {
        let t = self.tables.lock().await;
        let mut records: Vec<PayrollRecord> = t
            .payrolls
            .values()
            .filter(|p| p.employee_id == employee_id)
            .cloned()
            .collect();
        records.sort_by_key(|p| Reverse((p.year, p.month)));
        Ok(records)
    }

    async fn payroll_history(&self) -> Result<Vec<PayrollHistoryEntry>, AppError> {
        let t = self.tables.lock().await;
        let mut entries: Vec<PayrollHistoryEntry> = t
            .payrolls
            .values()
            .filter_map(|p| {
                Some(PayrollHistoryEntry {
                    payroll: p.clone(),
                    employee: t.summary_of(p.employee_id)?,
                })
            })
            .collect();
        entries.sort_by_key(|e| Reverse((e.payroll.year, e.payroll.month)));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::payroll::{AttendanceSummary, PayrollBreakdown};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn draft(employee_id: u64, month: u32, year: i32, net: f64) -> PayrollDraft {
        PayrollDraft {
            employee_id,
            month,
            year,
            attendance_summary: AttendanceSummary {
                total_days: 30,
                present_days: 30.0,
                lop_days: 0.0,
            },
            breakdown: PayrollBreakdown {
                basic: net,
                hra: 0.0,
                allowances: 0.0,
                gross: net,
                deductions: 0.0,
                lop_deduction: 0.0,
                net_salary: net,
            },
        }
    }

    #[actix_web::test]
    async fn conditional_insert_never_overwrites() {
        let store = MemoryStore::new();
        let day = d(2026, 4, 2);

        store
            .upsert_attendance(1, day, AttendanceStatus::Present)
            .await
            .unwrap();
        let created = store
            .insert_attendance_if_absent(1, day, AttendanceStatus::Absent)
            .await
            .unwrap();
        assert!(!created);

        let records = store.attendance_for_employee(1).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, AttendanceStatus::Present);
    }

    #[actix_web::test]
    async fn upsert_overwrites_in_place() {
        let store = MemoryStore::new();
        let day = d(2026, 4, 2);

        let first = store
            .upsert_attendance(1, day, AttendanceStatus::Absent)
            .await
            .unwrap();
        let second = store
            .upsert_attendance(1, day, AttendanceStatus::HalfDay)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, AttendanceStatus::HalfDay);
        assert_eq!(store.attendance_count().await, 1);
    }

    #[actix_web::test]
    async fn range_query_is_inclusive_and_per_employee() {
        let store = MemoryStore::new();
        for day in [d(2026, 3, 31), d(2026, 4, 1), d(2026, 4, 30), d(2026, 5, 1)] {
            store
                .upsert_attendance(1, day, AttendanceStatus::Present)
                .await
                .unwrap();
        }
        store
            .upsert_attendance(2, d(2026, 4, 10), AttendanceStatus::Present)
            .await
            .unwrap();

        let april = store
            .attendance_in_range(1, d(2026, 4, 1), d(2026, 4, 30))
            .await
            .unwrap();
        let dates: Vec<NaiveDate> = april.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2026, 4, 1), d(2026, 4, 30)]);
    }

    #[actix_web::test]
    async fn only_approved_covering_leaves_are_returned() {
        let store = MemoryStore::new();
        store
            .insert_leave(1, d(2026, 4, 1), d(2026, 4, 3), LeaveStatus::Approved)
            .await;
        store
            .insert_leave(2, d(2026, 4, 1), d(2026, 4, 3), LeaveStatus::Pending)
            .await;
        store
            .insert_leave(3, d(2026, 4, 4), d(2026, 4, 5), LeaveStatus::Approved)
            .await;

        let covering = store.approved_leaves_covering(d(2026, 4, 3)).await.unwrap();
        assert_eq!(covering.len(), 1);
        assert_eq!(covering[0].employee_id, 1);
    }

    #[actix_web::test]
    async fn payroll_upsert_keeps_identity_and_resets_status() {
        let store = MemoryStore::new();
        let first = store.upsert_payroll(&draft(1, 6, 2026, 100.0)).await.unwrap();
        store.mark_paid(1, 6, 2026).await;

        let second = store.upsert_payroll(&draft(1, 6, 2026, 90.0)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.status, PayrollStatus::Generated);
        assert_eq!(second.breakdown.net_salary, 90.0);
        assert_eq!(store.payroll_count().await, 1);
    }

    fn employee(id: u64) -> Employee {
        Employee {
            id,
            employee_code: format!("EMP-{id:03}"),
            name: format!("Employee {id}"),
            department: "Ops".into(),
            designation: "Analyst".into(),
            status: EmployeeStatus::Active,
            salary_structure: SalaryStructure::default(),
        }
    }

    #[actix_web::test]
    async fn employee_attendance_is_newest_first() {
        let store = MemoryStore::new();
        for day in [d(2026, 4, 2), d(2026, 4, 30), d(2026, 4, 1)] {
            store
                .upsert_attendance(1, day, AttendanceStatus::Present)
                .await
                .unwrap();
        }
        store
            .upsert_attendance(2, d(2026, 5, 1), AttendanceStatus::Absent)
            .await
            .unwrap();

        let dates: Vec<NaiveDate> = store
            .attendance_for_employee(1)
            .await
            .unwrap()
            .iter()
            .map(|r| r.date)
            .collect();
        assert_eq!(dates, vec![d(2026, 4, 30), d(2026, 4, 2), d(2026, 4, 1)]);
    }

    #[actix_web::test]
    async fn joined_views_skip_records_without_an_employee() {
        let store = MemoryStore::new();
        store.insert_employee(employee(1)).await;
        let day = d(2026, 4, 2);
        store
            .upsert_attendance(1, day, AttendanceStatus::Present)
            .await
            .unwrap();
        store
            .upsert_attendance(9, day, AttendanceStatus::Absent)
            .await
            .unwrap();
        store.upsert_payroll(&draft(1, 4, 2026, 1.0)).await.unwrap();
        store.upsert_payroll(&draft(9, 4, 2026, 1.0)).await.unwrap();

        let daily = store.attendance_on(day).await.unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].employee_name, "Employee 1");

        let history = store.payroll_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].payroll.employee_id, 1);
    }

    #[actix_web::test]
    async fn history_is_newest_period_first() {
        let store = MemoryStore::new();
        store.insert_employee(employee(1)).await;
        store.insert_employee(employee(2)).await;
        store.upsert_payroll(&draft(1, 12, 2025, 1.0)).await.unwrap();
        store.upsert_payroll(&draft(1, 2, 2026, 1.0)).await.unwrap();
        store.upsert_payroll(&draft(1, 11, 2026, 1.0)).await.unwrap();
        store.upsert_payroll(&draft(2, 1, 2026, 1.0)).await.unwrap();

        let periods: Vec<(i32, u32)> = store
            .payrolls_for_employee(1)
            .await
            .unwrap()
            .iter()
            .map(|p| (p.year, p.month))
            .collect();
        assert_eq!(periods, vec![(2026, 11), (2026, 2), (2025, 12)]);

        let all = store.payroll_history().await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!((all[0].payroll.year, all[0].payroll.month), (2026, 11));
        assert_eq!((all[3].payroll.year, all[3].payroll.month), (2025, 12));
    }

    #[actix_web::test]
    async fn seed_loads_employees_and_leaves_and_advances_ids() {
        let seed: Seed = serde_json::from_value(serde_json::json!({
            "employees": [{
                "id": 4,
                "employee_code": "EMP-004",
                "name": "Dana",
                "department": "Ops",
                "designation": "Lead",
                "status": "ACTIVE",
                "salary_structure": { "basic": 1000.0, "hra": 0.0 }
            }],
            "leaves": [{
                "id": 9,
                "employee_id": 4,
                "start_date": "2026-04-01",
                "end_date": "2026-04-02",
                "status": "APPROVED"
            }]
        }))
        .unwrap();
        let store = MemoryStore::from_seed(seed);

        assert!(store.find_employee(4).await.unwrap().is_some());
        assert_eq!(store.approved_leaves_covering(d(2026, 4, 2)).await.unwrap().len(), 1);

        let record = store
            .upsert_attendance(4, d(2026, 4, 3), AttendanceStatus::Present)
            .await
            .unwrap();
        assert!(record.id > 9);
    }
}
