// src/services/request_service.rs

use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{EmployeeRepository, RequestRepository, RosterRepository},
    models::{
        activity::{
            NewActivity, ACTIVITY_REQUEST_COMMENT, ACTIVITY_REQUEST_CREATE, ACTIVITY_REQUEST_DELETE,
            ACTIVITY_REQUEST_STATUS,
        },
        auth::Role,
        request::{
            prepare_request, validate_request, CommentPayload, ProcessedBy, RequestComment,
            RequestInput, RequestQuery, RequestScope, RequestStatus, StaffRequest,
            UpdateStatusPayload,
        },
        roster::EmployeeSnapshot,
        staff::Employee,
    },
    services::{
        activity_service::ActivityService,
        notification_service::{
            request_created_alerts, shifts_removed_alerts, status_changed_alert, NotificationService,
        },
    },
};

const REQUEST_NOT_FOUND: &str = "Request not found";

/// What an approval changed on the roster.
#[derive(Debug, Default)]
struct RosterEffect {
    removed: usize,
    created: usize,
}

/// Only the requester or an admin may delete, and a non-admin only while the
/// request is still pending.
pub fn ensure_can_delete(request: &StaffRequest, actor: &Employee) -> Result<(), AppError> {
    let is_admin = actor.role.is_admin();
    if request.requester_id != actor.id && !is_admin {
        return Err(AppError::forbidden("You do not have permission to delete this request"));
    }
    if !is_admin && request.status != RequestStatus::Pending {
        return Err(AppError::bad_request(format!(
            "Cannot delete a request that is already {}",
            request.status.as_str()
        )));
    }
    Ok(())
}

/// Staff may only comment on their own requests; managers on whatever they can see.
pub fn ensure_can_comment(request: &StaffRequest, actor: &Employee) -> Result<(), AppError> {
    if request.is_visible_to(actor.id, actor.role) {
        Ok(())
    } else {
        Err(AppError::forbidden("You do not have permission to comment on this request"))
    }
}

#[derive(Clone)]
pub struct RequestService {
    request_repo: RequestRepository,
    employee_repo: EmployeeRepository,
    roster_repo: RosterRepository,
    notifications: NotificationService,
    activity: ActivityService,
    pool: PgPool,
}

impl RequestService {
    pub fn new(
        request_repo: RequestRepository,
        employee_repo: EmployeeRepository,
        roster_repo: RosterRepository,
        notifications: NotificationService,
        activity: ActivityService,
        pool: PgPool,
    ) -> Self {
        Self { request_repo, employee_repo, roster_repo, notifications, activity, pool }
    }

    // --- CREATE ---
    pub async fn create_request(&self, actor: &Employee, input: RequestInput) -> Result<StaffRequest, AppError> {
        let doc = prepare_request(RequestInput {
            requester_id: Some(actor.id),
            requester_name: Some(actor.full_name()),
            requester_role: Some(actor.role),
            store_id: input.store_id.clone().or_else(|| actor.store_id.clone()),
            ..input
        });
        validate_request(&doc).into_result()?;
        let doc = self.fill_assignments(doc).await?;

        let request = self.request_repo.create(&doc).await?;

        self.notifications.dispatch(request_created_alerts(&request)).await;
        self.activity
            .track(
                NewActivity::new(
                    actor.id,
                    ACTIVITY_REQUEST_CREATE,
                    format!("New {} request", request.request_type.display_name()),
                    format!("Requested {} {}", request.request_type.display_name(), request.date_span()),
                )
                .with_metadata(json!({ "requestId": request.id })),
            )
            .await;

        tracing::info!("Request {} created by {}", request.id, actor.email);
        Ok(request)
    }

    /// Copies each assigned employee's name and email onto the assignment.
    async fn fill_assignments(&self, mut doc: RequestInput) -> Result<RequestInput, AppError> {
        let ids: Vec<Uuid> = doc.staff_assignments.iter().flatten().map(|a| a.staff_id).collect();
        if ids.is_empty() {
            return Ok(doc);
        }

        let staff: HashMap<Uuid, Employee> = self
            .employee_repo
            .list_by_ids(&ids)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        for assignment in doc.staff_assignments.iter_mut().flatten() {
            let employee = staff.get(&assignment.staff_id).ok_or_else(|| {
                AppError::not_found(format!("Staff with ID {} not found", assignment.staff_id))
            })?;
            assignment.staff_name = employee.full_name();
            assignment.staff_email = Some(employee.email.clone());
        }
        Ok(doc)
    }

    // --- READ ---
    pub async fn list_requests(&self, actor: &Employee, query: &RequestQuery) -> Result<Vec<StaffRequest>, AppError> {
        self.request_repo
            .list(query, RequestScope::for_viewer(actor.id, actor.role))
            .await
    }

    pub async fn my_requests(&self, actor: &Employee, query: &RequestQuery) -> Result<Vec<StaffRequest>, AppError> {
        self.request_repo.list(query, RequestScope::Own(actor.id)).await
    }

    pub async fn pending_requests(&self, actor: &Employee) -> Result<Vec<StaffRequest>, AppError> {
        let scope = RequestScope::for_review(actor.role).ok_or_else(|| {
            AppError::forbidden("Only administrators and managers can view pending requests")
        })?;
        let query = RequestQuery { status: Some(RequestStatus::Pending), ..Default::default() };
        self.request_repo.list(&query, scope).await
    }

    pub async fn get_request(&self, actor: &Employee, id: Uuid) -> Result<StaffRequest, AppError> {
        let request = self
            .request_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(REQUEST_NOT_FOUND))?;
        if !request.is_visible_to(actor.id, actor.role) {
            return Err(AppError::forbidden("You do not have permission to view this request"));
        }
        Ok(request)
    }

    // --- DECIDE ---
    // Status, roster changes and the decision comment commit together;
    // notifications follow once the decision is stored.
    pub async fn update_status(
        &self,
        actor: &Employee,
        id: Uuid,
        payload: UpdateStatusPayload,
    ) -> Result<StaffRequest, AppError> {
        if actor.role != Role::Admin {
            return Err(AppError::forbidden("Only administrators can approve or reject requests"));
        }
        if payload.status == RequestStatus::Pending {
            return Err(AppError::bad_request("Status must be approved or rejected"));
        }

        let now = Utc::now();
        let processed_by = ProcessedBy { uid: actor.id, name: actor.full_name() };
        let comment = payload
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|text| RequestComment {
                author_id: actor.id,
                author_name: actor.full_name(),
                text: text.to_string(),
                timestamp: now,
            });

        let mut tx = self.pool.begin().await?;
        let request = self
            .request_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(REQUEST_NOT_FOUND))?;
        request.ensure_pending()?;

        let effect = if payload.status == RequestStatus::Approved {
            self.apply_to_roster(&mut tx, &request).await?
        } else {
            RosterEffect::default()
        };

        let updated = self
            .request_repo
            .set_status(
                &mut *tx,
                id,
                payload.status,
                &processed_by,
                now,
                payload.decision_notes.as_deref(),
                comment.as_ref(),
            )
            .await?;
        tx.commit().await?;

        let mut alerts = vec![status_changed_alert(&updated, actor)];
        if effect.removed > 0 {
            alerts.extend(shifts_removed_alerts(&updated, effect.removed));
        }
        self.notifications.dispatch(alerts).await;

        self.activity
            .track(
                NewActivity::new(
                    actor.id,
                    ACTIVITY_REQUEST_STATUS,
                    format!("Request {}", updated.status.as_str()),
                    format!(
                        "{} {}'s {} request",
                        if updated.status == RequestStatus::Approved { "Approved" } else { "Rejected" },
                        updated.requester_name,
                        updated.request_type.display_name()
                    ),
                )
                .with_metadata(json!({
                    "requestId": updated.id,
                    "status": updated.status.as_str(),
                    "shiftsRemoved": effect.removed,
                    "shiftsCreated": effect.created,
                })),
            )
            .await;

        tracing::info!(
            "Request {} {} by {} ({} shifts removed, {} created)",
            updated.id,
            updated.status.as_str(),
            actor.email,
            effect.removed,
            effect.created
        );
        Ok(updated)
    }

    /// Approved leave clears the requester's shifts over the leave; an
    /// approved assignment request puts every assignment on the roster.
    async fn apply_to_roster(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        request: &StaffRequest,
    ) -> Result<RosterEffect, AppError> {
        if request.request_type.is_leave() {
            let removed = self
                .roster_repo
                .delete_for_employee_between(&mut **tx, request.requester_id, request.start_date, request.end_date)
                .await?;
            return Ok(RosterEffect { removed: removed.len(), created: 0 });
        }

        let note = format!("Auto-generated from approved request #{}", request.id);
        let mut created = 0;
        for assignment in request.staff_assignments.iter() {
            let employee = self
                .employee_repo
                .find_by_id(&mut **tx, assignment.staff_id)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!("Staff with ID {} not found", assignment.staff_id))
                })?;
            self.roster_repo
                .create(
                    &mut **tx,
                    assignment.date,
                    &assignment.start_time,
                    &assignment.end_time,
                    employee.id,
                    &EmployeeSnapshot::from(&employee),
                    Some(&note),
                )
                .await?;
            created += 1;
        }
        Ok(RosterEffect { removed: 0, created })
    }

    // --- COMMENT ---
    pub async fn add_comment(
        &self,
        actor: &Employee,
        id: Uuid,
        payload: CommentPayload,
    ) -> Result<StaffRequest, AppError> {
        payload.validate()?;
        let request = self
            .request_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(REQUEST_NOT_FOUND))?;
        ensure_can_comment(&request, actor)?;

        let comment = RequestComment {
            author_id: actor.id,
            author_name: actor.full_name(),
            text: payload.text.trim().to_string(),
            timestamp: Utc::now(),
        };
        let updated = self
            .request_repo
            .add_comment(id, &comment)
            .await?
            .ok_or_else(|| AppError::not_found(REQUEST_NOT_FOUND))?;

        self.activity
            .track(
                NewActivity::new(
                    actor.id,
                    ACTIVITY_REQUEST_COMMENT,
                    "Commented on a request",
                    format!("Commented on {}'s {} request", updated.requester_name, updated.request_type.display_name()),
                )
                .with_metadata(json!({ "requestId": updated.id })),
            )
            .await;
        Ok(updated)
    }

    // --- DELETE ---
    pub async fn delete_request(&self, actor: &Employee, id: Uuid) -> Result<(), AppError> {
        let request = self
            .request_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(REQUEST_NOT_FOUND))?;
        ensure_can_delete(&request, actor)?;

        if !self.request_repo.delete(id).await? {
            return Err(AppError::not_found(REQUEST_NOT_FOUND));
        }

        self.activity
            .track(
                NewActivity::new(
                    actor.id,
                    ACTIVITY_REQUEST_DELETE,
                    "Deleted a request",
                    format!("Deleted {}'s {} request", request.requester_name, request.request_type.display_name()),
                )
                .with_metadata(json!({ "requestId": request.id })),
            )
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::RequestType;
    use crate::models::staff::fixtures::employee;
    use chrono::NaiveDate;
    use sqlx::types::Json;

    fn request_by(requester: &Employee, status: RequestStatus) -> StaffRequest {
        let day = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        StaffRequest {
            id: Uuid::new_v4(),
            request_type: RequestType::DayOff,
            requester_id: requester.id,
            requester_name: requester.full_name(),
            requester_role: requester.role,
            start_date: day,
            end_date: day,
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
    fn requesters_delete_only_pending_requests() {
        let staff = employee(Role::Staff);
        assert!(ensure_can_delete(&request_by(&staff, RequestStatus::Pending), &staff).is_ok());

        match ensure_can_delete(&request_by(&staff, RequestStatus::Approved), &staff) {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Cannot delete a request that is already approved"),
            _ => panic!("expected bad request"),
        }
    }

    #[test]
    fn admins_delete_anything_others_nothing_foreign() {
        let staff = employee(Role::Staff);
        let decided = request_by(&staff, RequestStatus::Rejected);
        assert!(ensure_can_delete(&decided, &employee(Role::Admin)).is_ok());
        assert!(matches!(
            ensure_can_delete(&decided, &employee(Role::StoreManager)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn staff_comment_only_on_their_own_requests() {
        let owner = employee(Role::Staff);
        let request = request_by(&owner, RequestStatus::Pending);
        assert!(ensure_can_comment(&request, &owner).is_ok());
        assert!(ensure_can_comment(&request, &employee(Role::Staff)).is_err());
        assert!(ensure_can_comment(&request, &employee(Role::StoreManager)).is_ok());
    }
}
