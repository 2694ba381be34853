// src/services/staff_service.rs

use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::EmployeeRepository,
    models::{
        activity::{NewActivity, ACTIVITY_STAFF_ADD, ACTIVITY_STAFF_DELETE},
        auth::Role,
        staff::{prepare_staff, validate_staff, Employee, EmployeeFilter, EmployeeInput},
    },
    services::{activity_service::ActivityService, auth::hash_password},
};

const EMPLOYEE_NOT_FOUND: &str = "Employee not found";

/// Managers run the staff directory; only admins may hand out the admin role.
pub fn ensure_can_assign(actor: &Employee, role: Option<Role>) -> Result<(), AppError> {
    if !actor.role.is_management() {
        return Err(AppError::forbidden("Only administrators and managers can manage staff"));
    }
    if role == Some(Role::Admin) && !actor.role.is_admin() {
        return Err(AppError::forbidden("Only administrators can assign the admin role"));
    }
    Ok(())
}

#[derive(Clone)]
pub struct StaffService {
    employee_repo: EmployeeRepository,
    activity: ActivityService,
    pool: PgPool,
}

impl StaffService {
    pub fn new(employee_repo: EmployeeRepository, activity: ActivityService, pool: PgPool) -> Self {
        Self { employee_repo, activity, pool }
    }

    pub async fn create_employee(&self, actor: &Employee, input: EmployeeInput) -> Result<Employee, AppError> {
        let doc = prepare_staff(input);
        ensure_can_assign(actor, doc.role)?;
        validate_staff(&doc).into_result()?;

        let password_hash = match doc.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let employee = self
            .employee_repo
            .create(&self.pool, &doc, password_hash.as_deref())
            .await?;

        self.activity
            .track(
                NewActivity::new(
                    actor.id,
                    ACTIVITY_STAFF_ADD,
                    "Added staff member",
                    format!("Added {} as {}", employee.full_name(), employee.role.as_str()),
                )
                .with_metadata(json!({ "staffId": employee.id, "empId": employee.emp_id })),
            )
            .await;

        tracing::info!("Employee created: {} ({})", employee.email, employee.id);
        Ok(employee)
    }

    pub async fn list_employees(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, AppError> {
        self.employee_repo.list(filter).await
    }

    pub async fn get_employee(&self, id: Uuid) -> Result<Employee, AppError> {
        self.employee_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(EMPLOYEE_NOT_FOUND))
    }

    pub async fn update_employee(
        &self,
        actor: &Employee,
        id: Uuid,
        patch: EmployeeInput,
    ) -> Result<Employee, AppError> {
        ensure_can_assign(actor, patch.role)?;

        let mut tx = self.pool.begin().await?;
        let stored = self
            .employee_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(EMPLOYEE_NOT_FOUND))?;

        if stored.role.is_admin() && !actor.role.is_admin() {
            return Err(AppError::forbidden("Only administrators can modify an administrator"));
        }

        let doc = prepare_staff(EmployeeInput::from(&stored).merge(patch));
        validate_staff(&doc).into_result()?;

        let password_hash = match doc.password.as_deref() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let updated = self
            .employee_repo
            .update(&mut *tx, id, &doc, password_hash.as_deref())
            .await?
            .ok_or_else(|| AppError::not_found(EMPLOYEE_NOT_FOUND))?;
        tx.commit().await?;

        Ok(updated)
    }

    pub async fn delete_employee(&self, actor: &Employee, id: Uuid) -> Result<(), AppError> {
        ensure_can_assign(actor, None)?;
        if actor.id == id {
            return Err(AppError::bad_request("You cannot delete your own account"));
        }

        let employee = self.get_employee(id).await?;
        if employee.role.is_admin() && !actor.role.is_admin() {
            return Err(AppError::forbidden("Only administrators can delete an administrator"));
        }

        if !self.employee_repo.delete(id).await? {
            return Err(AppError::not_found(EMPLOYEE_NOT_FOUND));
        }

        self.activity
            .track(
                NewActivity::new(
                    actor.id,
                    ACTIVITY_STAFF_DELETE,
                    "Removed staff member",
                    format!("Removed {}", employee.full_name()),
                )
                .with_metadata(json!({ "staffId": employee.id, "empId": employee.emp_id })),
            )
            .await;

        tracing::info!("Employee deleted: {} ({})", employee.email, employee.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::staff::fixtures::employee;

    #[test]
    fn staff_cannot_manage_the_directory() {
        let result = ensure_can_assign(&employee(Role::Staff), Some(Role::Staff));
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn only_admins_grant_admin() {
        assert!(ensure_can_assign(&employee(Role::StoreManager), Some(Role::Staff)).is_ok());
        assert!(matches!(
            ensure_can_assign(&employee(Role::StoreManager), Some(Role::Admin)),
            Err(AppError::Forbidden(_))
        ));
        assert!(ensure_can_assign(&employee(Role::Admin), Some(Role::Admin)).is_ok());
    }
}
