//! Daily attendance reset.
//!
//! Once a day every ACTIVE employee without a record for the day gets one:
//! LEAVE when an approved leave covers the day, ABSENT otherwise. Existing
//! records (manual PRESENT/HALF_DAY marks, or a previous run) are never
//! touched, so the run is safe to repeat.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::error::AppError;
use crate::model::attendance::AttendanceStatus;
use crate::model::employee::EmployeeStatus;
use crate::store::{AttendanceStore, EmployeeDirectory, LeaveStore, SharedStore};
use crate::utils::dates;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetFailure {
    pub employee_id: u64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetSummary {
    pub date: chrono::NaiveDate,
    pub active_employees: usize,
    pub absent: usize,
    pub on_leave: usize,
    pub already_marked: usize,
    pub failures: Vec<ResetFailure>,
}

enum Backfill {
    Created(AttendanceStatus),
    AlreadyMarked,
}

/// Backfills the day containing `now`. Per-employee failures are collected
/// in the summary; only failures to load employees or leaves end the run.
#[instrument(skip(store))]
pub async fn reset_attendance<S>(store: &S, now: NaiveDateTime) -> Result<ResetSummary, AppError>
where
    S: EmployeeDirectory + AttendanceStore + LeaveStore + ?Sized,
{
    let today = dates::start_of_day(now).date();
    let tomorrow = dates::next_day(today)
        .ok_or_else(|| AppError::Validation(format!("no calendar day follows {today}")))?;

    let mut summary = ResetSummary {
        date: today,
        active_employees: 0,
        absent: 0,
        on_leave: 0,
        already_marked: 0,
        failures: Vec::new(),
    };

    let employees = store.find_by_status(EmployeeStatus::Active).await?;
    if employees.is_empty() {
        info!("No active employees found. Skipping attendance reset.");
        return Ok(summary);
    }
    summary.active_employees = employees.len();

    info!(
        active = employees.len(),
        window_start = %today,
        window_end = %tomorrow,
        "Processing attendance reset"
    );

    let on_leave: HashSet<u64> = store
        .approved_leaves_covering(today)
        .await?
        .into_iter()
        .map(|l| l.employee_id)
        .collect();

    let summary = stream::iter(&employees)
        .then(|employee| {
            let status = if on_leave.contains(&employee.id) {
                AttendanceStatus::Leave
            } else {
                AttendanceStatus::Absent
            };
            async move {
                let outcome = store
                    .insert_attendance_if_absent(employee.id, today, status)
                    .await
                    .map(|created| {
                        if created {
                            Backfill::Created(status)
                        } else {
                            Backfill::AlreadyMarked
                        }
                    });
                (employee.id, outcome)
            }
        })
        .fold(summary, |mut acc, (employee_id, outcome)| async move {
            match outcome {
                Ok(Backfill::Created(AttendanceStatus::Leave)) => acc.on_leave += 1,
                Ok(Backfill::Created(_)) => acc.absent += 1,
                Ok(Backfill::AlreadyMarked) => acc.already_marked += 1,
                Err(e) => {
                    warn!(error = %e, employee_id, "Attendance reset failed for employee");
                    acc.failures.push(ResetFailure {
                        employee_id,
                        message: e.to_string(),
                    });
                }
            }
            acc
        })
        .await;

    info!(
        absent = summary.absent,
        on_leave = summary.on_leave,
        already_marked = summary.already_marked,
        failed = summary.failures.len(),
        "Daily attendance reset complete"
    );

    Ok(summary)
}

/// Unattended entry point: errors are logged, never returned.
pub async fn run_daily_reset<S>(store: &S, now: NaiveDateTime) -> Option<ResetSummary>
where
    S: EmployeeDirectory + AttendanceStore + LeaveStore + ?Sized,
{
    info!("Running daily attendance reset job");
    match reset_attendance(store, now).await {
        Ok(summary) => Some(summary),
        Err(e) => {
            error!(error = %e, "Error in attendance reset job");
            None
        }
    }
}

/// Time to sleep from `now` until the next wall-clock occurrence of `at`.
/// Exactly at `at` the next occurrence is a day later.
pub fn until_next_run(now: NaiveDateTime, at: NaiveTime) -> Duration {
    let today_at = now.date().and_time(at);
    let next = if today_at > now {
        today_at
    } else {
        today_at + chrono::Duration::days(1)
    };

    (next - now).to_std().unwrap_or(Duration::ZERO)
}

/// Runs the reset every day at local time `at`. Runs never overlap.
pub fn spawn_scheduler(store: SharedStore, at: NaiveTime) {
    info!(%at, "Initializing daily attendance reset job");

    actix_web::rt::spawn(async move {
        loop {
            let wait = until_next_run(Local::now().naive_local(), at);
            tokio::time::sleep(wait).await;
            run_daily_reset(store.as_ref(), Local::now().naive_local()).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::{Employee, SalaryStructure};
    use crate::model::leave_request::LeaveStatus;
    use crate::service::attendance::mark_attendance;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(day: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        day.and_hms_opt(h, m, 0).unwrap()
    }

    async fn seed(store: &MemoryStore, id: u64, status: EmployeeStatus) {
        store
            .insert_employee(Employee {
                id,
                employee_code: format!("EMP-{id:03}"),
                name: format!("Employee {id}"),
                department: "Operations".into(),
                designation: "Associate".into(),
                status,
                salary_structure: SalaryStructure::default(),
            })
            .await;
    }

    #[actix_web::test]
    async fn backfills_absent_and_leave() {
        let store = MemoryStore::new();
        let day = d(2026, 3, 16);
        for id in 1..=3 {
            seed(&store, id, EmployeeStatus::Active).await;
        }
        store
            .insert_leave(2, d(2026, 3, 14), d(2026, 3, 16), LeaveStatus::Approved)
            .await;
        store
            .insert_leave(3, d(2026, 3, 16), d(2026, 3, 16), LeaveStatus::Rejected)
            .await;

        let summary = reset_attendance(&store, at(day, 0, 0)).await.unwrap();

        assert_eq!(summary.date, day);
        assert_eq!(summary.active_employees, 3);
        assert_eq!(summary.absent, 2);
        assert_eq!(summary.on_leave, 1);
        assert!(summary.failures.is_empty());

        let two = store.attendance_for_employee(2).await.unwrap();
        assert_eq!(two.len(), 1);
        assert_eq!(two[0].status, AttendanceStatus::Leave);
        assert_eq!(two[0].date, day);
        let three = store.attendance_for_employee(3).await.unwrap();
        assert_eq!(three[0].status, AttendanceStatus::Absent);
    }

    #[actix_web::test]
    async fn second_run_same_day_changes_nothing() {
        let store = MemoryStore::new();
        let day = d(2026, 3, 16);
        seed(&store, 1, EmployeeStatus::Active).await;
        seed(&store, 2, EmployeeStatus::Active).await;

        reset_attendance(&store, at(day, 0, 0)).await.unwrap();
        let before = store.attendance_for_employee(1).await.unwrap();

        let again = reset_attendance(&store, at(day, 13, 30)).await.unwrap();
        assert_eq!(again.absent, 0);
        assert_eq!(again.on_leave, 0);
        assert_eq!(again.already_marked, 2);
        assert_eq!(store.attendance_count().await, 2);
        assert_eq!(store.attendance_for_employee(1).await.unwrap(), before);
    }

    #[actix_web::test]
    async fn overlapping_runs_create_one_record_per_employee() {
        let store = MemoryStore::new();
        let day = d(2026, 3, 16);
        for id in 1..=50 {
            seed(&store, id, EmployeeStatus::Active).await;
        }

        let (first, second) = futures::join!(
            reset_attendance(&store, at(day, 0, 0)),
            reset_attendance(&store, at(day, 0, 0))
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_eq!(first.absent + second.absent, 50);
        assert_eq!(first.already_marked + second.already_marked, 50);
        assert!(first.failures.is_empty() && second.failures.is_empty());
        assert_eq!(store.attendance_count().await, 50);
        for id in 1..=50 {
            assert_eq!(store.attendance_for_employee(id).await.unwrap().len(), 1);
        }
    }

    #[actix_web::test]
    async fn manual_marks_are_preserved() {
        let store = MemoryStore::new();
        let day = d(2026, 3, 16);
        seed(&store, 1, EmployeeStatus::Active).await;
        seed(&store, 2, EmployeeStatus::Active).await;
        mark_attendance(&store, 1, day, AttendanceStatus::Present)
            .await
            .unwrap();
        mark_attendance(&store, 2, day, AttendanceStatus::HalfDay)
            .await
            .unwrap();

        let summary = reset_attendance(&store, at(day, 0, 0)).await.unwrap();
        assert_eq!(summary.already_marked, 2);
        assert_eq!(summary.absent, 0);

        let one = store.attendance_for_employee(1).await.unwrap();
        assert_eq!(one[0].status, AttendanceStatus::Present);
        let two = store.attendance_for_employee(2).await.unwrap();
        assert_eq!(two[0].status, AttendanceStatus::HalfDay);
    }

    #[actix_web::test]
    async fn inactive_and_terminated_are_skipped() {
        let store = MemoryStore::new();
        seed(&store, 1, EmployeeStatus::Inactive).await;
        seed(&store, 2, EmployeeStatus::Terminated).await;
        seed(&store, 3, EmployeeStatus::Active).await;

        let summary = reset_attendance(&store, at(d(2026, 3, 16), 0, 0))
            .await
            .unwrap();
        assert_eq!(summary.active_employees, 1);
        assert!(store.attendance_for_employee(1).await.unwrap().is_empty());
        assert!(store.attendance_for_employee(2).await.unwrap().is_empty());
        assert_eq!(store.attendance_for_employee(3).await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn no_active_employees_is_a_no_op() {
        let store = MemoryStore::new();
        seed(&store, 1, EmployeeStatus::Inactive).await;

        let summary = run_daily_reset(&store, at(d(2026, 3, 16), 0, 0))
            .await
            .unwrap();
        assert_eq!(summary.active_employees, 0);
        assert_eq!(store.attendance_count().await, 0);
    }

    #[actix_web::test]
    async fn one_failing_employee_does_not_stop_the_rest() {
        let store = MemoryStore::new();
        for id in 1..=3 {
            seed(&store, id, EmployeeStatus::Active).await;
        }
        store.fail_writes_for(2).await;

        let summary = run_daily_reset(&store, at(d(2026, 3, 16), 0, 0))
            .await
            .unwrap();
        assert_eq!(summary.absent, 2);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].employee_id, 2);
        assert_eq!(store.attendance_count().await, 2);
    }

    #[test]
    fn next_run_is_later_today_or_tomorrow() {
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        let day = d(2026, 3, 16);

        assert_eq!(
            until_next_run(at(day, 23, 0), midnight),
            Duration::from_secs(3600)
        );
        assert_eq!(
            until_next_run(at(day, 0, 0), midnight),
            Duration::from_secs(86_400)
        );

        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(
            until_next_run(at(day, 8, 30), nine),
            Duration::from_secs(1800)
        );
    }
}
