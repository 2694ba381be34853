// src/db/employee_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::{
        activity::ProfileUpdatePayload,
        auth::Role,
        staff::{Employee, EmployeeFilter, EmployeeInput},
    },
};

#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

fn employee_conflict(e: sqlx::Error) -> AppError {
    let constraint = match &e {
        sqlx::Error::Database(db_err) => db_err.constraint().unwrap_or_default().to_string(),
        _ => String::new(),
    };
    match constraint.as_str() {
        "employees_emp_id_key" => map_unique_violation(e, "An employee with this empId already exists"),
        _ => map_unique_violation(e, "An employee with this email already exists"),
    }
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, AppError> {
        let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE email = $1")
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(employee)
    }

    pub async fn list(&self, filter: &EmployeeFilter) -> Result<Vec<Employee>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM employees WHERE TRUE");
        if let Some(role) = filter.role {
            qb.push(" AND role = ").push_bind(role);
        }
        if let Some(status) = filter.employee_status {
            qb.push(" AND employee_status = ").push_bind(status);
        }
        if let Some(store) = &filter.store_id {
            qb.push(" AND store_id = ").push_bind(store.clone());
        }
        if let Some(department) = &filter.department_type {
            qb.push(" AND department_type = ").push_bind(department.clone());
        }
        qb.push(" ORDER BY last_name ASC, first_name ASC");

        let employees = qb.build_query_as::<Employee>().fetch_all(&self.pool).await?;
        Ok(employees)
    }

    pub async fn list_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Employee>, AppError> {
        let employees = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    pub async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Inserts a prepared and validated document.
    pub async fn create<'e, E>(
        &self,
        executor: E,
        doc: &EmployeeInput,
        password_hash: Option<&str>,
    ) -> Result<Employee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees (
                id, first_name, last_name, email, emp_id, password_hash, role, store_id,
                employee_status, employee_type, classification_type, department_type,
                division, job_function_description, supervisor, current_employee_rating,
                date_of_birth, gender_code, marital_status, location_code, pay_zone, state,
                performance_score, feedback, start_date, exit_date, termination_type,
                termination_description, phone, address, profile_picture
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31
            )
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(doc.first_name.as_deref())
        .bind(doc.last_name.as_deref())
        .bind(doc.email.as_deref())
        .bind(doc.emp_id.as_deref())
        .bind(password_hash)
        .bind(doc.role.unwrap_or(Role::Staff))
        .bind(doc.store_id.as_deref())
        .bind(doc.employee_status.unwrap_or_default())
        .bind(doc.employee_type.unwrap_or_default())
        .bind(doc.classification_type.unwrap_or_default())
        .bind(doc.department_type.as_deref())
        .bind(doc.division.as_deref())
        .bind(doc.job_function_description.as_deref())
        .bind(doc.supervisor.as_deref())
        .bind(doc.current_employee_rating)
        .bind(doc.date_of_birth)
        .bind(doc.gender_code)
        .bind(doc.marital_status)
        .bind(doc.location_code.as_deref())
        .bind(doc.pay_zone.as_deref())
        .bind(doc.state.as_deref())
        .bind(doc.performance_score.as_deref())
        .bind(doc.feedback.as_deref())
        .bind(doc.start_date)
        .bind(doc.exit_date)
        .bind(doc.termination_type.unwrap_or_default())
        .bind(doc.termination_description.as_deref())
        .bind(doc.phone.as_deref())
        .bind(doc.address.as_deref())
        .bind(doc.profile_picture.as_deref())
        .fetch_one(executor)
        .await
        .map_err(employee_conflict)
    }

    /// Rewrites every column from a merged document. The password hash is
    /// only replaced when a new one is given.
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        doc: &EmployeeInput,
        password_hash: Option<&str>,
    ) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Employee>(
            r#"
            UPDATE employees SET
                first_name = $2, last_name = $3, email = $4, emp_id = $5,
                password_hash = COALESCE($6, password_hash), role = $7, store_id = $8,
                employee_status = $9, employee_type = $10, classification_type = $11,
                department_type = $12, division = $13, job_function_description = $14,
                supervisor = $15, current_employee_rating = $16, date_of_birth = $17,
                gender_code = $18, marital_status = $19, location_code = $20, pay_zone = $21,
                state = $22, performance_score = $23, feedback = $24, start_date = $25,
                exit_date = $26, termination_type = $27, termination_description = $28,
                phone = $29, address = $30, profile_picture = $31, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(doc.first_name.as_deref())
        .bind(doc.last_name.as_deref())
        .bind(doc.email.as_deref())
        .bind(doc.emp_id.as_deref())
        .bind(password_hash)
        .bind(doc.role.unwrap_or(Role::Staff))
        .bind(doc.store_id.as_deref())
        .bind(doc.employee_status.unwrap_or_default())
        .bind(doc.employee_type.unwrap_or_default())
        .bind(doc.classification_type.unwrap_or_default())
        .bind(doc.department_type.as_deref())
        .bind(doc.division.as_deref())
        .bind(doc.job_function_description.as_deref())
        .bind(doc.supervisor.as_deref())
        .bind(doc.current_employee_rating)
        .bind(doc.date_of_birth)
        .bind(doc.gender_code)
        .bind(doc.marital_status)
        .bind(doc.location_code.as_deref())
        .bind(doc.pay_zone.as_deref())
        .bind(doc.state.as_deref())
        .bind(doc.performance_score.as_deref())
        .bind(doc.feedback.as_deref())
        .bind(doc.start_date)
        .bind(doc.exit_date)
        .bind(doc.termination_type.unwrap_or_default())
        .bind(doc.termination_description.as_deref())
        .bind(doc.phone.as_deref())
        .bind(doc.address.as_deref())
        .bind(doc.profile_picture.as_deref())
        .fetch_optional(executor)
        .await
        .map_err(employee_conflict)
    }

    /// Applies only the profile fields present in the payload.
    pub async fn update_profile<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        payload: &ProfileUpdatePayload,
    ) -> Result<Option<Employee>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            UPDATE employees SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                profile_picture = COALESCE($6, profile_picture),
                role = COALESCE($7, role),
                store_id = COALESCE($8, store_id),
                employee_status = COALESCE($9, employee_status),
                department_type = COALESCE($10, department_type),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.first_name.as_deref())
        .bind(payload.last_name.as_deref())
        .bind(payload.phone.as_deref())
        .bind(payload.address.as_deref())
        .bind(payload.profile_picture.as_deref())
        .bind(payload.role)
        .bind(payload.store_id.as_deref())
        .bind(payload.employee_status)
        .bind(payload.department_type.as_deref())
        .fetch_optional(executor)
        .await?;
        Ok(employee)
    }

    pub async fn touch_notification_check(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE employees SET last_notification_check = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
