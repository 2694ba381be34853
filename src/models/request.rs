// src/models/request.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::error::AppError;
use crate::common::validation::{clock_time, schema_error, ValidationReport};
use crate::models::auth::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "request_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    DayOff,
    SickLeave,
    HolidayLeave,
    MultipleShiftAssignment,
}

impl RequestType {
    pub fn display_name(self) -> &'static str {
        match self {
            RequestType::DayOff => "Day Off",
            RequestType::SickLeave => "Sick Leave",
            RequestType::HolidayLeave => "Holiday Leave",
            RequestType::MultipleShiftAssignment => "Multiple Shift Assignment",
        }
    }

    pub fn is_leave(self) -> bool {
        !matches!(self, RequestType::MultipleShiftAssignment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffAssignment {
    pub staff_id: Uuid,
    #[serde(default)]
    pub staff_name: String,
    pub staff_email: Option<String>,
    pub date: NaiveDate,
    #[validate(custom(function = "clock_time", message = "startTime must be in HH:MM format"))]
    pub start_time: String,
    #[validate(custom(function = "clock_time", message = "endTime must be in HH:MM format"))]
    pub end_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ProcessedBy {
    pub uid: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestComment {
    pub author_id: Uuid,
    pub author_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffRequest {
    pub id: Uuid,
    pub request_type: RequestType,
    pub requester_id: Uuid,
    pub requester_name: String,
    pub requester_role: Role,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub store_id: Option<String>,
    pub store_name: Option<String>,
    pub leave_reason: Option<String>,
    #[schema(value_type = Vec<StaffAssignment>)]
    pub staff_assignments: Json<Vec<StaffAssignment>>,
    pub status: RequestStatus,
    #[schema(value_type = Option<ProcessedBy>)]
    pub processed_by: Option<Json<ProcessedBy>>,
    pub processed_date: Option<DateTime<Utc>>,
    #[schema(value_type = Vec<RequestComment>)]
    pub comments: Json<Vec<RequestComment>>,
    pub decision_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StaffRequest {
    /// Only pending requests can be decided.
    pub fn ensure_pending(&self) -> Result<(), AppError> {
        if self.status != RequestStatus::Pending {
            return Err(AppError::BadRequest(format!(
                "This request is already {}",
                self.status.as_str()
            )));
        }
        Ok(())
    }

    /// Staff see their own requests, managers also see staff requests,
    /// admins see everything.
    pub fn is_visible_to(&self, viewer_id: Uuid, viewer_role: Role) -> bool {
        RequestScope::for_viewer(viewer_id, viewer_role).includes(self)
    }

    /// `from 2024-03-04` or `from 2024-03-04 to 2024-03-06`.
    pub fn date_span(&self) -> String {
        if self.start_date == self.end_date {
            format!("from {}", self.start_date)
        } else {
            format!("from {} to {}", self.start_date, self.end_date)
        }
    }
}

fn validate_request_rules(doc: &RequestInput) -> Result<(), ValidationError> {
    if doc.request_type == Some(RequestType::MultipleShiftAssignment)
        && doc.staff_assignments.as_ref().is_none_or(|a| a.is_empty())
    {
        return Err(schema_error(
            "assignments_required",
            "Staff assignments are required for multiple shift assignments",
        ));
    }
    if let (Some(start), Some(end)) = (doc.start_date, doc.end_date) {
        if end < start {
            return Err(schema_error("date_order", "endDate cannot be before startDate"));
        }
    }
    Ok(())
}

/// Requester fields are never taken from the body; the service fills them
/// from the authenticated employee before preparing.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_request_rules"))]
pub struct RequestInput {
    #[validate(required(message = "requestType is required"))]
    pub request_type: Option<RequestType>,
    #[serde(skip_deserializing)]
    #[validate(required(message = "requesterId is required"))]
    pub requester_id: Option<Uuid>,
    #[serde(skip_deserializing)]
    #[validate(
        required(message = "requesterName is required"),
        length(min = 1, message = "requesterName is required")
    )]
    pub requester_name: Option<String>,
    #[serde(skip_deserializing)]
    #[validate(required(message = "requesterRole is required"))]
    pub requester_role: Option<Role>,
    #[validate(required(message = "startDate is required"))]
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub store_id: Option<String>,
    pub store_name: Option<String>,
    pub leave_reason: Option<String>,
    #[validate(nested)]
    pub staff_assignments: Option<Vec<StaffAssignment>>,
}

pub fn prepare_request(input: RequestInput) -> RequestInput {
    RequestInput {
        end_date: input.end_date.or(input.start_date),
        staff_assignments: Some(input.staff_assignments.unwrap_or_default()),
        leave_reason: input.leave_reason.filter(|r| !r.trim().is_empty()),
        ..input
    }
}

pub fn validate_request(doc: &RequestInput) -> ValidationReport {
    ValidationReport::of(doc)
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub status: RequestStatus,
    pub comment: Option<String>,
    pub decision_notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CommentPayload {
    #[validate(length(min = 1, message = "Comment text is required"))]
    pub text: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct RequestQuery {
    pub status: Option<RequestStatus>,
    #[serde(rename = "type")]
    pub request_type: Option<RequestType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Which requests a viewer may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    All,
    Own(Uuid),
    OwnAndStaff(Uuid),
    StaffOnly,
}

impl RequestScope {
    pub fn for_viewer(viewer_id: Uuid, role: Role) -> Self {
        match role {
            Role::Admin => RequestScope::All,
            Role::StoreManager | Role::Manager => RequestScope::OwnAndStaff(viewer_id),
            Role::Staff => RequestScope::Own(viewer_id),
        }
    }

    pub fn includes(self, request: &StaffRequest) -> bool {
        match self {
            RequestScope::All => true,
            RequestScope::Own(id) => request.requester_id == id,
            RequestScope::OwnAndStaff(id) => {
                request.requester_id == id || request.requester_role == Role::Staff
            }
            RequestScope::StaffOnly => request.requester_role == Role::Staff,
        }
    }

    /// Whose pending requests a viewer may review, or `None` if they may not.
    pub fn for_review(role: Role) -> Option<Self> {
        match role {
            Role::Admin => Some(RequestScope::All),
            Role::StoreManager | Role::Manager => Some(RequestScope::StaffOnly),
            Role::Staff => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn leave() -> RequestInput {
        RequestInput {
            request_type: Some(RequestType::DayOff),
            requester_id: Some(Uuid::new_v4()),
            requester_name: Some("Sam Reyes".into()),
            requester_role: Some(Role::Staff),
            start_date: Some(d(10)),
            ..Default::default()
        }
    }

    fn stored(status: RequestStatus) -> StaffRequest {
        StaffRequest {
            id: Uuid::new_v4(),
            request_type: RequestType::SickLeave,
            requester_id: Uuid::new_v4(),
            requester_name: "Sam Reyes".into(),
            requester_role: Role::Staff,
            start_date: d(10),
            end_date: d(12),
            store_id: None,
            store_name: None,
            leave_reason: None,
            staff_assignments: Json(Vec::new()),
            status,
            processed_by: None,
            processed_date: None,
            comments: Json(Vec::new()),
            decision_notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn end_date_defaults_to_start_date() {
        let doc = prepare_request(leave());
        assert_eq!(doc.end_date, Some(d(10)));
        assert!(validate_request(&doc).valid);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let doc = prepare_request(RequestInput { end_date: Some(d(9)), ..leave() });
        assert_eq!(
            validate_request(&doc).errors,
            vec!["endDate cannot be before startDate".to_string()]
        );
    }

    #[test]
    fn shift_assignment_requests_need_assignments() {
        let doc = prepare_request(RequestInput {
            request_type: Some(RequestType::MultipleShiftAssignment),
            ..leave()
        });
        let report = validate_request(&doc);
        assert!(report
            .errors
            .contains(&"Staff assignments are required for multiple shift assignments".to_string()));
    }

    #[test]
    fn nested_assignment_errors_are_prefixed() {
        let doc = prepare_request(RequestInput {
            request_type: Some(RequestType::MultipleShiftAssignment),
            staff_assignments: Some(vec![StaffAssignment {
                staff_id: Uuid::new_v4(),
                staff_name: "Kim".into(),
                staff_email: None,
                date: d(11),
                start_time: "late".into(),
                end_time: "18:00".into(),
            }]),
            ..leave()
        });
        let report = validate_request(&doc);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("staff_assignments"));
        assert!(report.errors[0].ends_with("startTime must be in HH:MM format"));
    }

    #[test]
    fn requester_fields_are_not_read_from_the_body() {
        let doc: RequestInput = serde_json::from_value(serde_json::json!({
            "requestType": "holiday_leave",
            "requesterId": "00000000-0000-0000-0000-000000000001",
            "startDate": "2024-06-10"
        }))
        .unwrap();
        assert!(doc.requester_id.is_none());
        assert_eq!(doc.request_type, Some(RequestType::HolidayLeave));
    }

    #[test]
    fn decided_requests_cannot_change_again() {
        assert!(stored(RequestStatus::Pending).ensure_pending().is_ok());
        match stored(RequestStatus::Approved).ensure_pending() {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "This request is already approved"),
            _ => panic!("expected bad request"),
        }
    }

    #[test]
    fn request_visibility_by_role() {
        let request = stored(RequestStatus::Pending);
        let stranger = Uuid::new_v4();
        assert!(request.is_visible_to(request.requester_id, Role::Staff));
        assert!(!request.is_visible_to(stranger, Role::Staff));
        assert!(request.is_visible_to(stranger, Role::StoreManager));
        assert!(request.is_visible_to(stranger, Role::Admin));

        let from_manager = StaffRequest { requester_role: Role::StoreManager, ..request };
        assert!(!from_manager.is_visible_to(stranger, Role::Manager));
        assert!(from_manager.is_visible_to(from_manager.requester_id, Role::StoreManager));
    }

    #[test]
    fn reviewers_of_pending_requests() {
        assert_eq!(RequestScope::for_review(Role::Admin), Some(RequestScope::All));
        assert_eq!(RequestScope::for_review(Role::StoreManager), Some(RequestScope::StaffOnly));
        assert_eq!(RequestScope::for_review(Role::Staff), None);
        let from_manager = StaffRequest { requester_role: Role::Manager, ..stored(RequestStatus::Pending) };
        assert!(!RequestScope::StaffOnly.includes(&from_manager));
    }

    #[test]
    fn date_span_names_both_ends() {
        assert_eq!(stored(RequestStatus::Pending).date_span(), "from 2024-06-10 to 2024-06-12");
    }
}
