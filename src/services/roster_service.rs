// src/services/roster_service.rs

use chrono::{Days, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, RosterRepository},
    models::{
        roster::{prepare_roster, validate_roster, EmployeeSnapshot, RosterQuery, Shift, ShiftInput},
        staff::Employee,
    },
};

const SHIFT_NOT_FOUND: &str = "Shift not found";
pub const DEFAULT_UPCOMING_DAYS: i64 = 7;

pub fn ensure_can_edit_rosters(actor: &Employee) -> Result<(), AppError> {
    if actor.role.is_management() {
        Ok(())
    } else {
        Err(AppError::forbidden("Only administrators and managers can manage rosters"))
    }
}

/// `today` through the last of `days` days, both included. Fewer than one
/// day is treated as one.
pub fn upcoming_window(today: NaiveDate, days: Option<i64>) -> (NaiveDate, NaiveDate) {
    let days = days.unwrap_or(DEFAULT_UPCOMING_DAYS).clamp(1, 366) as u64;
    let end = today.checked_add_days(Days::new(days - 1)).unwrap_or(today);
    (today, end)
}

#[derive(Clone)]
pub struct RosterService {
    roster_repo: RosterRepository,
    employee_repo: EmployeeRepository,
    pool: PgPool,
}

impl RosterService {
    pub fn new(roster_repo: RosterRepository, employee_repo: EmployeeRepository, pool: PgPool) -> Self {
        Self { roster_repo, employee_repo, pool }
    }

    async fn snapshot_of(&self, employee_id: Uuid) -> Result<EmployeeSnapshot, AppError> {
        let employee = self
            .employee_repo
            .find_by_id(&self.pool, employee_id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found"))?;
        Ok(EmployeeSnapshot::from(&employee))
    }

    pub async fn create_shift(&self, actor: &Employee, input: ShiftInput) -> Result<Shift, AppError> {
        ensure_can_edit_rosters(actor)?;
        let doc = prepare_roster(input);
        validate_roster(&doc).into_result()?;

        let (Some(date), Some(start), Some(end), Some(employee_id)) =
            (doc.date, doc.start_time.as_deref(), doc.end_time.as_deref(), doc.employee_id)
        else {
            return Err(AppError::bad_request("date, startTime, endTime and employeeId are required"));
        };

        let snapshot = self.snapshot_of(employee_id).await?;
        let shift = self
            .roster_repo
            .create(&self.pool, date, start, end, employee_id, &snapshot, doc.shift_note.as_deref())
            .await?;

        tracing::info!("Shift {} created for {} on {}", shift.id, snapshot.username, date);
        Ok(shift)
    }

    pub async fn list_shifts(&self, query: &RosterQuery) -> Result<Vec<Shift>, AppError> {
        self.roster_repo.list(query).await
    }

    pub async fn shifts_on(&self, date: Option<NaiveDate>) -> Result<Vec<Shift>, AppError> {
        let date = date.ok_or_else(|| AppError::bad_request("Date parameter is required"))?;
        self.roster_repo
            .list(&RosterQuery { date: Some(date), ..Default::default() })
            .await
    }

    pub async fn upcoming(&self, actor: &Employee, staff_id: Uuid, days: Option<i64>) -> Result<Vec<Shift>, AppError> {
        if actor.id != staff_id && !actor.role.is_management() {
            return Err(AppError::forbidden("You can only view your own upcoming shifts"));
        }
        let (start, end) = upcoming_window(Utc::now().date_naive(), days);
        self.roster_repo
            .list(&RosterQuery {
                start_date: Some(start),
                end_date: Some(end),
                employee_id: Some(staff_id),
                ..Default::default()
            })
            .await
    }

    pub async fn update_shift(&self, actor: &Employee, id: Uuid, patch: ShiftInput) -> Result<Shift, AppError> {
        ensure_can_edit_rosters(actor)?;
        let stored = self
            .roster_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(SHIFT_NOT_FOUND))?;

        let reassigned = patch.employee_id.is_some_and(|e| e != stored.employee_id);
        let doc = prepare_roster(ShiftInput::from(&stored).merge(patch));
        validate_roster(&doc).into_result()?;

        let (Some(date), Some(start), Some(end), Some(employee_id)) =
            (doc.date, doc.start_time.as_deref(), doc.end_time.as_deref(), doc.employee_id)
        else {
            return Err(AppError::bad_request("date, startTime, endTime and employeeId are required"));
        };

        let snapshot = if reassigned {
            self.snapshot_of(employee_id).await?
        } else {
            stored.employee.0.clone()
        };

        self.roster_repo
            .update(&self.pool, id, date, start, end, employee_id, &snapshot, doc.shift_note.as_deref())
            .await?
            .ok_or_else(|| AppError::not_found(SHIFT_NOT_FOUND))
    }

    pub async fn delete_shift(&self, actor: &Employee, id: Uuid) -> Result<(), AppError> {
        ensure_can_edit_rosters(actor)?;
        if !self.roster_repo.delete(id).await? {
            return Err(AppError::not_found(SHIFT_NOT_FOUND));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use crate::models::staff::fixtures::employee;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn upcoming_defaults_to_a_week() {
        assert_eq!(upcoming_window(d(4), None), (d(4), d(10)));
        assert_eq!(upcoming_window(d(4), Some(1)), (d(4), d(4)));
        assert_eq!(upcoming_window(d(4), Some(0)), (d(4), d(4)));
    }

    #[test]
    fn only_management_edits_rosters() {
        assert!(ensure_can_edit_rosters(&employee(Role::Manager)).is_ok());
        assert!(ensure_can_edit_rosters(&employee(Role::Staff)).is_err());
    }
}
