// src/services/notification_service.rs

use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, NotificationRepository},
    models::{
        auth::Role,
        inventory::InventoryItem,
        notification::{
            prepare_notification, validate_notification, Audience, MarkedRead, Notification,
            NotificationAction, NotificationInput, NotificationList, NotificationSummary,
            NotificationType, NotificationView, Priority, TargetRole,
        },
        request::{RequestStatus, RequestType, StaffRequest},
        staff::Employee,
    },
};

const NOTIFICATION_NOT_FOUND: &str = "Notification not found";

// ---
// Alert builders
// ---

fn alert(title: &str, message: String, priority: Priority, target_role: TargetRole) -> NotificationInput {
    NotificationInput {
        title: Some(title.to_string()),
        message: Some(message),
        notification_type: Some(NotificationType::System),
        priority: Some(priority),
        target_role: Some(target_role),
        ..Default::default()
    }
}

fn to_user(title: &str, message: String, user: Uuid) -> NotificationInput {
    NotificationInput {
        target_users: Some(vec![user]),
        ..alert(title, message, Priority::Medium, TargetRole::Specific)
    }
}

/// One alert for admins and one for store managers listing every item at or
/// below its reorder point.
pub fn low_stock_alerts(items: &[InventoryItem]) -> Vec<NotificationInput> {
    let details = json!(items
        .iter()
        .map(|i| json!({
            "productName": i.product_name,
            "currentStock": i.current_stock,
            "reorderPoint": i.reorder_point,
        }))
        .collect::<Vec<_>>());
    let action = NotificationAction::link("../../inventory/stockUpdates", "View Low Stock Items");
    let count = items.len();

    [
        (
            TargetRole::Admin,
            format!("{} inventory items are below the reorder point and need immediate attention.", count),
        ),
        (
            TargetRole::StoreManager,
            format!("{} inventory items are below the reorder point and need immediate restocking.", count),
        ),
    ]
    .into_iter()
    .map(|(role, message)| NotificationInput {
        action: Some(action.clone()),
        details: Some(details.clone()),
        ..alert("Low Stock Alert", message, Priority::High, role)
    })
    .collect()
}

pub fn missing_shift_alerts(date: NaiveDate) -> Vec<NotificationInput> {
    let action = NotificationAction::link("../../rosters/manageRosters", "Create Shifts");
    let details = json!({ "date": date.to_string() });

    [
        (TargetRole::Admin, "No shifts have been scheduled. Please create shifts immediately."),
        (
            TargetRole::StoreManager,
            "No shifts have been scheduled for tomorrow. Create shifts immediately.",
        ),
    ]
    .into_iter()
    .map(|(role, message)| NotificationInput {
        action: Some(action.clone()),
        details: Some(details.clone()),
        ..alert("Missing Shifts Alert", message.to_string(), Priority::High, role)
    })
    .collect()
}

/// Admins always hear about a new request; store managers too when a staff
/// member asks for leave.
pub fn request_created_alerts(request: &StaffRequest) -> Vec<NotificationInput> {
    let display = request.request_type.display_name();
    let message = format!(
        "{} ({}) has requested {} {}.",
        request.requester_name,
        request.requester_role.as_str(),
        display,
        request.date_span()
    );
    let priority = if request.request_type == RequestType::SickLeave {
        Priority::High
    } else {
        Priority::Medium
    };
    let title = format!("New {} Request", display);
    let action = NotificationAction::link("more/requests", "Review Request");

    let mut targets = vec![TargetRole::Admin];
    if request.requester_role == Role::Staff && request.request_type.is_leave() {
        targets.push(TargetRole::StoreManager);
    }

    targets
        .into_iter()
        .map(|role| NotificationInput {
            action: Some(action.clone()),
            details: Some(json!({ "requestId": request.id })),
            ..alert(&title, message.clone(), priority, role)
        })
        .collect()
}

pub fn status_changed_alert(request: &StaffRequest, decided_by: &Employee) -> NotificationInput {
    let display = request.request_type.display_name();
    let outcome = if request.status == RequestStatus::Approved { "Approved" } else { "Rejected" };
    NotificationInput {
        action: Some(NotificationAction::link("more/requests/", "View Details")),
        details: Some(json!({ "requestId": request.id })),
        created_by: Some(decided_by.id),
        created_by_name: Some(decided_by.full_name()),
        ..to_user(
            &format!("{} Request {}", display, outcome),
            format!(
                "Your request for {} {} has been {}.",
                display,
                request.date_span(),
                request.status.as_str()
            ),
            request.requester_id,
        )
    }
}

/// Tells the requester and store managers how many shifts an approved leave
/// cleared from the roster.
pub fn shifts_removed_alerts(request: &StaffRequest, removed: usize) -> Vec<NotificationInput> {
    let display = request.request_type.display_name();
    let span = request.date_span();

    let employee = NotificationInput {
        action: Some(NotificationAction::link("more/requests", "View Details")),
        ..to_user(
            "Scheduled Shifts Removed",
            format!(
                "{} scheduled shift(s) have been automatically removed due to your approved {} {}.",
                removed, display, span
            ),
            request.requester_id,
        )
    };
    let managers = NotificationInput {
        action: Some(NotificationAction::link("/scheduling", "View Schedule")),
        ..alert(
            "Staff Shifts Removed",
            format!(
                "{} scheduled shift(s) for {} have been automatically removed due to approved {} {}.",
                removed, request.requester_name, display, span
            ),
            Priority::Medium,
            TargetRole::StoreManager,
        )
    };
    vec![employee, managers]
}

fn views(notifications: Vec<Notification>, user_id: Uuid) -> Vec<NotificationView> {
    notifications
        .into_iter()
        .map(|n| NotificationView::for_user(n, user_id))
        .collect()
}

#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    employee_repo: EmployeeRepository,
}

impl NotificationService {
    pub fn new(notification_repo: NotificationRepository, employee_repo: EmployeeRepository) -> Self {
        Self { notification_repo, employee_repo }
    }

    pub async fn list(&self, user: &Employee, limit: Option<i64>) -> Result<NotificationList, AppError> {
        let audience = Audience::from(user);
        let limit = limit.map(|l| l.clamp(1, 200));
        let rows = self
            .notification_repo
            .visible_to(&audience, Utc::now(), false, None, limit)
            .await?;
        let notifications = views(rows, user.id);
        Ok(NotificationList { count: notifications.len(), notifications })
    }

    pub async fn unread(&self, user: &Employee) -> Result<NotificationList, AppError> {
        let audience = Audience::from(user);
        let rows = self
            .notification_repo
            .visible_to(&audience, Utc::now(), true, None, None)
            .await?;
        let notifications = views(rows, user.id);
        Ok(NotificationList { count: notifications.len(), notifications })
    }

    /// Notifications created since the user last checked. Moves the check
    /// marker forward.
    pub async fn new_since_last_check(&self, user: &Employee) -> Result<NotificationList, AppError> {
        let now = Utc::now();
        let audience = Audience::from(user);
        let rows = self
            .notification_repo
            .visible_to(&audience, now, false, user.last_notification_check, None)
            .await?;
        self.employee_repo.touch_notification_check(user.id, now).await?;

        let notifications = views(rows, user.id);
        Ok(NotificationList { count: notifications.len(), notifications })
    }

    pub async fn summary(&self, user: &Employee) -> Result<NotificationSummary, AppError> {
        let now = Utc::now();
        let audience = Audience::from(user);
        let unread = self
            .notification_repo
            .visible_to(&audience, now, true, None, None)
            .await?;
        let fresh = self
            .notification_repo
            .visible_to(&audience, now, false, user.last_notification_check, None)
            .await?;
        self.employee_repo.touch_notification_check(user.id, now).await?;

        let unread_notifications = views(unread, user.id);
        let new_notifications = views(fresh, user.id);
        Ok(NotificationSummary {
            unread_count: unread_notifications.len(),
            unread_notifications,
            new_count: new_notifications.len(),
            new_notifications,
            last_checked_at: now,
        })
    }

    pub async fn mark_read(&self, user: &Employee, id: Uuid) -> Result<NotificationView, AppError> {
        let notification = self
            .notification_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(NOTIFICATION_NOT_FOUND))?;
        if !notification.is_visible_to(&Audience::from(user), Utc::now()) {
            return Err(AppError::not_found(NOTIFICATION_NOT_FOUND));
        }

        let updated = self
            .notification_repo
            .mark_read(id, user.id)
            .await?
            .ok_or_else(|| AppError::not_found(NOTIFICATION_NOT_FOUND))?;
        Ok(NotificationView::for_user(updated, user.id))
    }

    pub async fn mark_all_read(&self, user: &Employee) -> Result<MarkedRead, AppError> {
        let count = self
            .notification_repo
            .mark_all_read(&Audience::from(user), Utc::now())
            .await?;
        Ok(MarkedRead {
            message: "All notifications marked as read".to_string(),
            count,
        })
    }

    pub async fn create(&self, author: &Employee, input: NotificationInput) -> Result<Notification, AppError> {
        if !matches!(author.role, Role::Admin | Role::StoreManager) {
            return Err(AppError::forbidden(
                "Only administrators and managers can create notifications",
            ));
        }

        let notification_type = if author.role.is_admin() {
            NotificationType::Admin
        } else {
            NotificationType::StoreManager
        };
        let doc = prepare_notification(NotificationInput {
            notification_type: Some(notification_type),
            created_by: Some(author.id),
            created_by_name: Some(author.full_name()),
            ..input
        });
        validate_notification(&doc).into_result()?;

        self.notification_repo.create(&doc).await
    }

    pub async fn delete(&self, user: &Employee, id: Uuid) -> Result<(), AppError> {
        let notification = self
            .notification_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(NOTIFICATION_NOT_FOUND))?;

        if !user.role.is_admin() && notification.created_by != Some(user.id) {
            return Err(AppError::forbidden(
                "You do not have permission to delete this notification",
            ));
        }

        if !self.notification_repo.delete(id).await? {
            return Err(AppError::not_found(NOTIFICATION_NOT_FOUND));
        }
        Ok(())
    }

    /// Writes system notifications. Failures are logged and swallowed so a
    /// notification problem never undoes the change that caused it.
    pub async fn dispatch(&self, alerts: Vec<NotificationInput>) -> usize {
        let mut sent = 0;
        for input in alerts {
            let doc = prepare_notification(input);
            if let Err(e) = validate_notification(&doc).into_result() {
                tracing::warn!("Dropping invalid system notification: {}", e);
                continue;
            }
            match self.notification_repo.create(&doc).await {
                Ok(_) => sent += 1,
                Err(e) => tracing::warn!("Could not create notification: {}", e),
            }
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventory::fixtures::item;
    use crate::models::staff::fixtures::employee;
    use sqlx::types::Json;

    fn request(request_type: RequestType, role: Role) -> StaffRequest {
        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        StaffRequest {
            id: Uuid::new_v4(),
            request_type,
            requester_id: Uuid::new_v4(),
            requester_name: "Sam Reyes".into(),
            requester_role: role,
            start_date: day,
            end_date: day,
            store_id: None,
            store_name: None,
            leave_reason: None,
            staff_assignments: Json(Vec::new()),
            status: RequestStatus::Pending,
            processed_by: None,
            processed_date: None,
            comments: Json(Vec::new()),
            decision_notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn low_stock_alerts_go_to_admins_and_managers() {
        let alerts = low_stock_alerts(&[item("Pixel 8", 2, 5), item("Galaxy Tab", 0, 3)]);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].target_role, Some(TargetRole::Admin));
        assert_eq!(
            alerts[0].message.as_deref(),
            Some("2 inventory items are below the reorder point and need immediate attention.")
        );
        assert_eq!(alerts[1].target_role, Some(TargetRole::StoreManager));
        assert!(alerts.iter().all(|a| a.priority == Some(Priority::High)));

        let details = alerts[0].details.as_ref().unwrap();
        assert_eq!(details[1]["productName"], "Galaxy Tab");
        assert_eq!(details[0]["reorderPoint"], 5);
    }

    #[test]
    fn missing_shift_alerts_link_to_rosters() {
        let alerts = missing_shift_alerts(NaiveDate::from_ymd_opt(2024, 6, 11).unwrap());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].title.as_deref(), Some("Missing Shifts Alert"));
        assert_eq!(alerts[1].action.as_ref().unwrap().label, "Create Shifts");
    }

    #[test]
    fn staff_leave_requests_also_alert_store_managers() {
        let alerts = request_created_alerts(&request(RequestType::SickLeave, Role::Staff));
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].title.as_deref(), Some("New Sick Leave Request"));
        assert_eq!(
            alerts[0].message.as_deref(),
            Some("Sam Reyes (staff) has requested Sick Leave from 2024-06-10.")
        );
        assert_eq!(alerts[0].priority, Some(Priority::High));

        let from_manager = request_created_alerts(&request(RequestType::DayOff, Role::StoreManager));
        assert_eq!(from_manager.len(), 1);
        assert_eq!(from_manager[0].priority, Some(Priority::Medium));

        let assignment = request_created_alerts(&request(RequestType::MultipleShiftAssignment, Role::Staff));
        assert_eq!(assignment.len(), 1);
    }

    #[test]
    fn status_alert_targets_the_requester() {
        let mut decided = request(RequestType::HolidayLeave, Role::Staff);
        decided.status = RequestStatus::Rejected;
        let alert = status_changed_alert(&decided, &employee(Role::Admin));

        assert_eq!(alert.title.as_deref(), Some("Holiday Leave Request Rejected"));
        assert_eq!(alert.target_role, Some(TargetRole::Specific));
        assert_eq!(alert.target_users, Some(vec![decided.requester_id]));
        assert!(validate_notification(&prepare_notification(alert)).valid);
    }

    #[test]
    fn shift_removal_alerts_count_the_shifts() {
        let alerts = shifts_removed_alerts(&request(RequestType::DayOff, Role::Staff), 2);
        assert_eq!(
            alerts[0].message.as_deref(),
            Some("2 scheduled shift(s) have been automatically removed due to your approved Day Off from 2024-06-10.")
        );
        assert_eq!(alerts[1].target_role, Some(TargetRole::StoreManager));
    }
}
