// src/models/roster.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validation::{clock_time, parse_clock_time, schema_error, ValidationReport};
use crate::models::staff::Employee;

/// Denormalized copy of the employee a shift belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSnapshot {
    pub uid: Uuid,
    pub username: String,
    pub profile_picture: Option<String>,
}

impl From<&Employee> for EmployeeSnapshot {
    fn from(e: &Employee) -> Self {
        Self {
            uid: e.id,
            username: e.full_name(),
            profile_picture: e.profile_picture.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: Uuid,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    #[serde(skip_serializing)]
    pub employee_id: Uuid,
    #[schema(value_type = EmployeeSnapshot)]
    pub employee: Json<EmployeeSnapshot>,
    pub shift_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shift {
    pub fn hours(&self) -> f64 {
        shift_hours(&self.start_time, &self.end_time)
    }
}

/// Length of a shift in hours; 0 when either time is malformed or the
/// shift does not end after it starts.
pub fn shift_hours(start: &str, end: &str) -> f64 {
    match (parse_clock_time(start), parse_clock_time(end)) {
        (Some(s), Some(e)) if e > s => (e - s).num_minutes() as f64 / 60.0,
        _ => 0.0,
    }
}

fn validate_shift_window(doc: &ShiftInput) -> Result<(), ValidationError> {
    if let (Some(start), Some(end)) = (&doc.start_time, &doc.end_time) {
        if let (Some(s), Some(e)) = (parse_clock_time(start), parse_clock_time(end)) {
            if e <= s {
                return Err(schema_error("shift_window", "endTime must be after startTime"));
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_shift_window"))]
pub struct ShiftInput {
    #[validate(required(message = "date is required"))]
    pub date: Option<NaiveDate>,
    #[validate(
        required(message = "startTime is required"),
        custom(function = "clock_time", message = "startTime must be in HH:MM format")
    )]
    pub start_time: Option<String>,
    #[validate(
        required(message = "endTime is required"),
        custom(function = "clock_time", message = "endTime must be in HH:MM format")
    )]
    pub end_time: Option<String>,
    #[validate(required(message = "employeeId is required"))]
    pub employee_id: Option<Uuid>,
    pub shift_note: Option<String>,
}

impl From<&Shift> for ShiftInput {
    fn from(s: &Shift) -> Self {
        Self {
            date: Some(s.date),
            start_time: Some(s.start_time.clone()),
            end_time: Some(s.end_time.clone()),
            employee_id: Some(s.employee_id),
            shift_note: s.shift_note.clone(),
        }
    }
}

impl ShiftInput {
    pub fn merge(self, patch: ShiftInput) -> Self {
        Self {
            date: patch.date.or(self.date),
            start_time: patch.start_time.or(self.start_time),
            end_time: patch.end_time.or(self.end_time),
            employee_id: patch.employee_id.or(self.employee_id),
            shift_note: patch.shift_note.or(self.shift_note),
        }
    }
}

pub fn prepare_roster(input: ShiftInput) -> ShiftInput {
    ShiftInput {
        start_time: input.start_time.map(|t| t.trim().to_string()),
        end_time: input.end_time.map(|t| t.trim().to_string()),
        shift_note: input.shift_note.filter(|n| !n.trim().is_empty()),
        ..input
    }
}

pub fn validate_roster(doc: &ShiftInput) -> ValidationReport {
    ValidationReport::of(doc)
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RosterQuery {
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct UpcomingQuery {
    pub days: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shift(start: &str, end: &str) -> ShiftInput {
        ShiftInput {
            date: NaiveDate::from_ymd_opt(2024, 3, 4),
            start_time: Some(start.into()),
            end_time: Some(end.into()),
            employee_id: Some(Uuid::new_v4()),
            shift_note: Some("  ".into()),
        }
    }

    #[test]
    fn prepare_trims_times_and_drops_blank_notes() {
        let doc = prepare_roster(shift(" 09:00 ", "17:00"));
        assert_eq!(doc.start_time.as_deref(), Some("09:00"));
        assert!(doc.shift_note.is_none());
        assert!(validate_roster(&doc).valid);
    }

    #[test]
    fn end_must_follow_start() {
        let report = validate_roster(&prepare_roster(shift("17:00", "09:00")));
        assert_eq!(report.errors, vec!["endTime must be after startTime".to_string()]);
    }

    #[test]
    fn malformed_times_and_missing_date() {
        let mut doc = shift("9am", "17:00");
        doc.date = None;
        let report = validate_roster(&prepare_roster(doc));
        assert!(report.errors.contains(&"date is required".to_string()));
        assert!(report.errors.contains(&"startTime must be in HH:MM format".to_string()));
    }

    #[test]
    fn hours_between_clock_times() {
        assert_eq!(shift_hours("09:00", "17:30"), 8.5);
        assert_eq!(shift_hours("18:00", "10:00"), 0.0);
        assert_eq!(shift_hours("bad", "10:00"), 0.0);
    }
}
