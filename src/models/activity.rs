// src/models/activity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::Role;
use crate::models::staff::{Employee, EmployeeStatus};

pub const ACTIVITY_LOGIN: &str = "login";
pub const ACTIVITY_PROFILE_UPDATE: &str = "profile_update";
pub const ACTIVITY_STAFF_ADD: &str = "staff_add";
pub const ACTIVITY_STAFF_DELETE: &str = "staff_delete";
pub const ACTIVITY_REQUEST_CREATE: &str = "request_create";
pub const ACTIVITY_REQUEST_STATUS: &str = "request_status_update";
pub const ACTIVITY_REQUEST_COMMENT: &str = "request_comment";
pub const ACTIVITY_REQUEST_DELETE: &str = "request_delete";
pub const ACTIVITY_REPORT_VIEW: &str = "reports_view";

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserActivity {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub title: String,
    pub description: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub activity_type: &'static str,
    pub title: String,
    pub description: String,
    pub metadata: serde_json::Value,
}

impl NewActivity {
    pub fn new(user_id: Uuid, activity_type: &'static str, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            user_id,
            activity_type,
            title: title.into(),
            description: description.into(),
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_metadata(self, metadata: serde_json::Value) -> Self {
        Self { metadata, ..self }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ActivityQuery {
    pub limit: Option<i64>,
    pub page: Option<i64>,
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
}

impl ActivityQuery {
    /// (limit, page, offset) with limit clamped to 1..=100 and page >= 1.
    pub fn paging(&self) -> (i64, i64, i64) {
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        let page = self.page.unwrap_or(1).max(1);
        (limit, page, (page - 1) * limit)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self { page, limit, total, total_pages }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActivityPage {
    pub activities: Vec<UserActivity>,
    pub pagination: Pagination,
}

/// Profile fields an employee may change on themselves. The last four are
/// honoured only when an admin makes the change.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdatePayload {
    #[validate(length(min = 1, message = "firstName cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "lastName cannot be empty"))]
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    pub role: Option<Role>,
    pub store_id: Option<String>,
    pub employee_status: Option<EmployeeStatus>,
    pub department_type: Option<String>,
}

impl ProfileUpdatePayload {
    pub fn without_admin_fields(self) -> Self {
        Self {
            role: None,
            store_id: None,
            employee_status: None,
            department_type: None,
            ..self
        }
    }

    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.first_name.is_some() { fields.push("firstName"); }
        if self.last_name.is_some() { fields.push("lastName"); }
        if self.phone.is_some() { fields.push("phone"); }
        if self.address.is_some() { fields.push("address"); }
        if self.profile_picture.is_some() { fields.push("profilePicture"); }
        if self.role.is_some() { fields.push("role"); }
        if self.store_id.is_some() { fields.push("storeId"); }
        if self.employee_status.is_some() { fields.push("employeeStatus"); }
        if self.department_type.is_some() { fields.push("departmentType"); }
        fields
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileUpdated {
    pub message: String,
    pub employee: Employee,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_defaults_and_clamps() {
        assert_eq!(ActivityQuery::default().paging(), (20, 1, 0));
        let q = ActivityQuery { limit: Some(500), page: Some(3), activity_type: None };
        assert_eq!(q.paging(), (100, 3, 200));
        let q = ActivityQuery { limit: Some(0), page: Some(-2), activity_type: None };
        assert_eq!(q.paging(), (1, 1, 0));
    }

    #[test]
    fn total_pages_round_up() {
        assert_eq!(Pagination::new(1, 20, 41).total_pages, 3);
        assert_eq!(Pagination::new(1, 20, 0).total_pages, 0);
    }

    #[test]
    fn non_admins_cannot_touch_admin_fields() {
        let payload = ProfileUpdatePayload {
            phone: Some("555".into()),
            role: Some(Role::Admin),
            ..Default::default()
        }
        .without_admin_fields();
        assert!(payload.role.is_none());
        assert_eq!(payload.changed_fields(), vec!["phone"]);
    }
}
