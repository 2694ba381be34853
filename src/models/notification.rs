// src/models/notification.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validation::{schema_error, ValidationReport};
use crate::models::auth::Role;
use crate::models::staff::Employee;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "notification_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    #[default]
    System,
    Admin,
    #[serde(rename = "store manager")]
    #[sqlx(rename = "store manager")]
    StoreManager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "notification_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "target_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TargetRole {
    Admin,
    #[serde(rename = "store manager")]
    #[sqlx(rename = "store manager")]
    StoreManager,
    Staff,
    #[default]
    All,
    Specific,
}

impl TargetRole {
    /// The role-targeted audience an employee belongs to. Plain managers read
    /// what is addressed to store managers.
    pub fn for_role(role: Role) -> TargetRole {
        match role {
            Role::Admin => TargetRole::Admin,
            Role::StoreManager | Role::Manager => TargetRole::StoreManager,
            Role::Staff => TargetRole::Staff,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetRole::Admin => "admin",
            TargetRole::StoreManager => "store manager",
            TargetRole::Staff => "staff",
            TargetRole::All => "all",
            TargetRole::Specific => "specific",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    #[default]
    Link,
    Button,
    Form,
}

fn default_action_label() -> String {
    "View".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct NotificationAction {
    #[serde(rename = "type", default)]
    pub action_type: ActionType,
    #[serde(default)]
    pub destination: String,
    #[serde(default = "default_action_label")]
    pub label: String,
}

impl NotificationAction {
    pub fn link(destination: &str, label: &str) -> Self {
        Self {
            action_type: ActionType::Link,
            destination: destination.to_string(),
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub priority: Priority,
    pub target_role: TargetRole,
    pub target_users: Vec<Uuid>,
    pub target_stores: Vec<String>,
    #[schema(value_type = HashMap<String, bool>)]
    pub read: Json<HashMap<String, bool>>,
    #[schema(value_type = Option<NotificationAction>)]
    pub action: Option<Json<NotificationAction>>,
    pub details: Option<serde_json::Value>,
    pub created_by: Option<Uuid>,
    pub created_by_name: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Who is reading: used to decide visibility and read state.
#[derive(Debug, Clone)]
pub struct Audience {
    pub user_id: Uuid,
    pub role: Role,
    pub store_id: Option<String>,
}

impl From<&Employee> for Audience {
    fn from(e: &Employee) -> Self {
        Self {
            user_id: e.id,
            role: e.role,
            store_id: e.store_id.clone(),
        }
    }
}

impl Notification {
    pub fn is_read_by(&self, user_id: Uuid) -> bool {
        self.read.0.get(&user_id.to_string()).copied().unwrap_or(false)
    }

    pub fn is_visible_to(&self, audience: &Audience, now: DateTime<Utc>) -> bool {
        if self.expires_at.is_some_and(|at| at <= now) {
            return false;
        }
        self.target_role == TargetRole::All
            || self.target_role == TargetRole::for_role(audience.role)
            || self.target_users.contains(&audience.user_id)
            || audience
                .store_id
                .as_ref()
                .is_some_and(|store| self.target_stores.contains(store))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub is_read: bool,
}

impl NotificationView {
    pub fn for_user(notification: Notification, user_id: Uuid) -> Self {
        let is_read = notification.is_read_by(user_id);
        Self { notification, is_read }
    }
}

fn validate_targets(doc: &NotificationInput) -> Result<(), ValidationError> {
    if doc.target_role == Some(TargetRole::Specific)
        && doc.target_users.as_ref().is_none_or(|u| u.is_empty())
    {
        return Err(schema_error(
            "target_users_required",
            "targetUsers must contain at least one user when targetRole is specific",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_targets"))]
pub struct NotificationInput {
    #[validate(
        required(message = "title is required"),
        length(min = 1, message = "title is required")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "message is required"),
        length(min = 1, message = "message is required")
    )]
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
    pub priority: Option<Priority>,
    pub target_role: Option<TargetRole>,
    pub target_users: Option<Vec<Uuid>>,
    pub target_stores: Option<Vec<String>>,
    pub action: Option<NotificationAction>,
    pub details: Option<serde_json::Value>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_deserializing)]
    pub created_by: Option<Uuid>,
    #[serde(skip_deserializing)]
    pub created_by_name: Option<String>,
}

pub fn prepare_notification(input: NotificationInput) -> NotificationInput {
    NotificationInput {
        notification_type: Some(input.notification_type.unwrap_or_default()),
        priority: Some(input.priority.unwrap_or_default()),
        target_role: Some(input.target_role.unwrap_or_default()),
        target_users: Some(input.target_users.unwrap_or_default()),
        target_stores: Some(input.target_stores.unwrap_or_default()),
        created_by_name: Some(input.created_by_name.unwrap_or_else(|| "system".to_string())),
        ..input
    }
}

pub fn validate_notification(doc: &NotificationInput) -> ValidationReport {
    ValidationReport::of(doc)
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    pub notifications: Vec<NotificationView>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSummary {
    pub unread_count: usize,
    pub unread_notifications: Vec<NotificationView>,
    pub new_count: usize,
    pub new_notifications: Vec<NotificationView>,
    pub last_checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkedRead {
    pub message: String,
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(target_role: TargetRole) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            title: "Low stock".into(),
            message: "Restock soon".into(),
            notification_type: NotificationType::System,
            priority: Priority::High,
            target_role,
            target_users: Vec::new(),
            target_stores: Vec::new(),
            read: Json(HashMap::new()),
            action: None,
            details: None,
            created_by: None,
            created_by_name: "system".into(),
            expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn audience(role: Role) -> Audience {
        Audience { user_id: Uuid::new_v4(), role, store_id: Some("S1".into()) }
    }

    #[test]
    fn role_targeting() {
        let now = Utc::now();
        let for_managers = notification(TargetRole::StoreManager);
        assert!(for_managers.is_visible_to(&audience(Role::StoreManager), now));
        assert!(for_managers.is_visible_to(&audience(Role::Manager), now));
        assert!(!for_managers.is_visible_to(&audience(Role::Staff), now));
        assert!(notification(TargetRole::All).is_visible_to(&audience(Role::Staff), now));
    }

    #[test]
    fn specific_users_and_stores() {
        let now = Utc::now();
        let reader = audience(Role::Staff);

        let mut direct = notification(TargetRole::Specific);
        assert!(!direct.is_visible_to(&reader, now));
        direct.target_users.push(reader.user_id);
        assert!(direct.is_visible_to(&reader, now));

        let mut store = notification(TargetRole::Specific);
        store.target_stores.push("S1".into());
        assert!(store.is_visible_to(&reader, now));
    }

    #[test]
    fn expired_notifications_are_hidden() {
        let now = Utc::now();
        let mut expired = notification(TargetRole::All);
        expired.expires_at = Some(now - chrono::Duration::minutes(1));
        assert!(!expired.is_visible_to(&audience(Role::Admin), now));
    }

    #[test]
    fn read_state_is_per_user() {
        let reader = Uuid::new_v4();
        let mut n = notification(TargetRole::All);
        n.read.0.insert(reader.to_string(), true);
        assert!(NotificationView::for_user(n.clone(), reader).is_read);
        assert!(!NotificationView::for_user(n, Uuid::new_v4()).is_read);
    }

    #[test]
    fn prepare_defaults_and_specific_rule() {
        let doc = prepare_notification(NotificationInput {
            title: Some("Hi".into()),
            message: Some("There".into()),
            ..Default::default()
        });
        assert_eq!(doc.priority, Some(Priority::Medium));
        assert_eq!(doc.target_role, Some(TargetRole::All));
        assert_eq!(doc.notification_type, Some(NotificationType::System));
        assert!(validate_notification(&doc).valid);

        let specific = prepare_notification(NotificationInput {
            target_role: Some(TargetRole::Specific),
            ..doc
        });
        assert!(!validate_notification(&specific).valid);
    }

    #[test]
    fn action_label_defaults_to_view() {
        let action: NotificationAction =
            serde_json::from_value(serde_json::json!({ "type": "button", "destination": "/x" })).unwrap();
        assert_eq!(action.label, "View");
        assert_eq!(action.action_type, ActionType::Button);
    }
}
