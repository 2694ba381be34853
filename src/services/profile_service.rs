// src/services/profile_service.rs

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::EmployeeRepository,
    models::{
        activity::{ActivityPage, ActivityQuery, NewActivity, ProfileUpdatePayload, ProfileUpdated, ACTIVITY_PROFILE_UPDATE},
        staff::Employee,
    },
    services::activity_service::ActivityService,
};

/// Employees reach their own profile; admins reach everyone's.
pub fn ensure_own_profile(actor: &Employee, id: Uuid, action: &str) -> Result<(), AppError> {
    if actor.id == id || actor.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Unauthorized access. You can only {action}."
        )))
    }
}

#[derive(Clone)]
pub struct ProfileService {
    employee_repo: EmployeeRepository,
    activity: ActivityService,
    pool: PgPool,
}

impl ProfileService {
    pub fn new(employee_repo: EmployeeRepository, activity: ActivityService, pool: PgPool) -> Self {
        Self { employee_repo, activity, pool }
    }

    pub async fn get_profile(&self, actor: &Employee, id: Uuid) -> Result<Employee, AppError> {
        ensure_own_profile(actor, id, "access your own profile")?;
        self.employee_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found"))
    }

    pub async fn update_profile(
        &self,
        actor: &Employee,
        id: Uuid,
        payload: ProfileUpdatePayload,
    ) -> Result<ProfileUpdated, AppError> {
        ensure_own_profile(actor, id, "update your own profile")?;
        payload.validate()?;

        let payload = if actor.role.is_admin() { payload } else { payload.without_admin_fields() };
        let changed = payload.changed_fields();

        let employee = self
            .employee_repo
            .update_profile(&self.pool, id, &payload)
            .await?
            .ok_or_else(|| AppError::not_found("Employee not found"))?;

        self.activity
            .track(
                NewActivity::new(
                    id,
                    ACTIVITY_PROFILE_UPDATE,
                    "Profile updated",
                    format!("Updated {}", changed.join(", ")),
                )
                .with_metadata(json!({ "changedFields": changed, "updatedBy": actor.id })),
            )
            .await;

        Ok(ProfileUpdated {
            message: "Profile updated successfully".to_string(),
            employee,
        })
    }

    pub async fn activities(&self, actor: &Employee, id: Uuid, query: &ActivityQuery) -> Result<ActivityPage, AppError> {
        ensure_own_profile(actor, id, "view your own activities")?;
        self.activity.page(id, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::Role;
    use crate::models::staff::fixtures::employee;

    #[test]
    fn profiles_are_private_except_to_admins() {
        let staff = employee(Role::Staff);
        let manager = employee(Role::StoreManager);

        assert!(ensure_own_profile(&staff, staff.id, "x").is_ok());
        assert!(ensure_own_profile(&employee(Role::Admin), staff.id, "x").is_ok());

        let denied = ensure_own_profile(&manager, staff.id, "update your own profile");
        match denied {
            Err(AppError::Forbidden(msg)) => {
                assert_eq!(msg, "Unauthorized access. You can only update your own profile.")
            }
            other => panic!("expected forbidden, got {other:?}"),
        }
    }
}
