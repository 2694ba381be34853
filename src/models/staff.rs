// src/models/staff.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::validation::{schema_error, ValidationReport};
use crate::models::auth::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "employee_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
    #[serde(rename = "on leave")]
    #[sqlx(rename = "on leave")]
    OnLeave,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "employee_type", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum EmployeeType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Intern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "classification_type", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationType {
    #[default]
    FullTime,
    PartTime,
    Temporary,
    Seasonal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "gender_code", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GenderCode {
    Male,
    Female,
    Other,
    #[serde(rename = "prefer not to say")]
    #[sqlx(rename = "prefer not to say")]
    PreferNotToSay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "marital_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MaritalStatus {
    Single,
    Married,
    Divorced,
    Widowed,
    Separated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "termination_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TerminationType {
    Voluntary,
    Involuntary,
    Retirement,
    #[default]
    #[serde(rename = "n/a")]
    #[sqlx(rename = "n/a")]
    NotApplicable,
    Unk,
}

pub const DEFAULT_TERMINATION_DESCRIPTION: &str = "not applicable";

// An employee as stored in `employees`.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub emp_id: String,

    #[serde(skip_serializing)]
    pub password_hash: Option<String>,

    pub role: Role,
    pub store_id: Option<String>,
    pub employee_status: EmployeeStatus,
    pub employee_type: EmployeeType,
    pub classification_type: ClassificationType,
    pub department_type: String,
    pub division: Option<String>,
    pub job_function_description: Option<String>,
    pub supervisor: Option<String>,
    pub current_employee_rating: Option<i32>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender_code: Option<GenderCode>,
    pub marital_status: Option<MaritalStatus>,
    pub location_code: Option<String>,
    pub pay_zone: Option<String>,
    pub state: Option<String>,
    pub performance_score: Option<String>,
    pub feedback: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub exit_date: Option<NaiveDate>,
    pub termination_type: TerminationType,
    pub termination_description: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
    pub last_notification_check: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

fn validate_employment_dates(doc: &EmployeeInput) -> Result<(), ValidationError> {
    if let (Some(start), Some(exit)) = (doc.start_date, doc.exit_date) {
        if exit < start {
            return Err(schema_error("date_order", "exitDate cannot be before startDate"));
        }
    }
    Ok(())
}

/// Create/update document for an employee. Every field is optional on the wire;
/// `prepare_staff` fills defaults and `validate_staff` enforces the rest.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_employment_dates"))]
pub struct EmployeeInput {
    #[validate(
        required(message = "firstName is required"),
        length(min = 1, message = "firstName is required")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "lastName is required"),
        length(min = 1, message = "lastName is required")
    )]
    pub last_name: Option<String>,
    #[validate(
        required(message = "email is required"),
        email(message = "email must be a valid email address")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "empId is required"),
        length(min = 1, message = "empId is required")
    )]
    pub emp_id: Option<String>,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
    pub store_id: Option<String>,
    pub employee_status: Option<EmployeeStatus>,
    pub employee_type: Option<EmployeeType>,
    pub classification_type: Option<ClassificationType>,
    #[validate(
        required(message = "departmentType is required"),
        length(min = 1, message = "departmentType is required")
    )]
    pub department_type: Option<String>,
    pub division: Option<String>,
    pub job_function_description: Option<String>,
    pub supervisor: Option<String>,
    #[validate(range(min = 0, max = 5, message = "currentEmployeeRating must be between 0 and 5"))]
    pub current_employee_rating: Option<i32>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender_code: Option<GenderCode>,
    pub marital_status: Option<MaritalStatus>,
    pub location_code: Option<String>,
    pub pay_zone: Option<String>,
    pub state: Option<String>,
    pub performance_score: Option<String>,
    pub feedback: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub exit_date: Option<NaiveDate>,
    pub termination_type: Option<TerminationType>,
    pub termination_description: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_picture: Option<String>,
}

impl From<&Employee> for EmployeeInput {
    fn from(e: &Employee) -> Self {
        Self {
            first_name: Some(e.first_name.clone()),
            last_name: Some(e.last_name.clone()),
            email: Some(e.email.clone()),
            emp_id: Some(e.emp_id.clone()),
            password: None,
            role: Some(e.role),
            store_id: e.store_id.clone(),
            employee_status: Some(e.employee_status),
            employee_type: Some(e.employee_type),
            classification_type: Some(e.classification_type),
            department_type: Some(e.department_type.clone()),
            division: e.division.clone(),
            job_function_description: e.job_function_description.clone(),
            supervisor: e.supervisor.clone(),
            current_employee_rating: e.current_employee_rating,
            date_of_birth: e.date_of_birth,
            gender_code: e.gender_code,
            marital_status: e.marital_status,
            location_code: e.location_code.clone(),
            pay_zone: e.pay_zone.clone(),
            state: e.state.clone(),
            performance_score: e.performance_score.clone(),
            feedback: e.feedback.clone(),
            start_date: e.start_date,
            exit_date: e.exit_date,
            termination_type: Some(e.termination_type),
            termination_description: Some(e.termination_description.clone()),
            phone: e.phone.clone(),
            address: e.address.clone(),
            profile_picture: e.profile_picture.clone(),
        }
    }
}

impl EmployeeInput {
    /// Overlays the fields present in `patch` on top of `self`.
    pub fn merge(self, patch: EmployeeInput) -> Self {
        Self {
            first_name: patch.first_name.or(self.first_name),
            last_name: patch.last_name.or(self.last_name),
            email: patch.email.or(self.email),
            emp_id: patch.emp_id.or(self.emp_id),
            password: patch.password,
            role: patch.role.or(self.role),
            store_id: patch.store_id.or(self.store_id),
            employee_status: patch.employee_status.or(self.employee_status),
            employee_type: patch.employee_type.or(self.employee_type),
            classification_type: patch.classification_type.or(self.classification_type),
            department_type: patch.department_type.or(self.department_type),
            division: patch.division.or(self.division),
            job_function_description: patch.job_function_description.or(self.job_function_description),
            supervisor: patch.supervisor.or(self.supervisor),
            current_employee_rating: patch.current_employee_rating.or(self.current_employee_rating),
            date_of_birth: patch.date_of_birth.or(self.date_of_birth),
            gender_code: patch.gender_code.or(self.gender_code),
            marital_status: patch.marital_status.or(self.marital_status),
            location_code: patch.location_code.or(self.location_code),
            pay_zone: patch.pay_zone.or(self.pay_zone),
            state: patch.state.or(self.state),
            performance_score: patch.performance_score.or(self.performance_score),
            feedback: patch.feedback.or(self.feedback),
            start_date: patch.start_date.or(self.start_date),
            exit_date: patch.exit_date.or(self.exit_date),
            termination_type: patch.termination_type.or(self.termination_type),
            termination_description: patch.termination_description.or(self.termination_description),
            phone: patch.phone.or(self.phone),
            address: patch.address.or(self.address),
            profile_picture: patch.profile_picture.or(self.profile_picture),
        }
    }
}

pub fn prepare_staff(input: EmployeeInput) -> EmployeeInput {
    EmployeeInput {
        email: input.email.map(|e| e.trim().to_lowercase()),
        role: Some(input.role.unwrap_or(Role::Staff)),
        employee_status: Some(input.employee_status.unwrap_or_default()),
        employee_type: Some(input.employee_type.unwrap_or_default()),
        classification_type: Some(input.classification_type.unwrap_or_default()),
        termination_type: Some(input.termination_type.unwrap_or_default()),
        termination_description: Some(
            input
                .termination_description
                .unwrap_or_else(|| DEFAULT_TERMINATION_DESCRIPTION.to_string()),
        ),
        ..input
    }
}

pub fn validate_staff(doc: &EmployeeInput) -> ValidationReport {
    ValidationReport::of(doc)
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeFilter {
    pub role: Option<Role>,
    pub employee_status: Option<EmployeeStatus>,
    pub store_id: Option<String>,
    pub department_type: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn employee(role: Role) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            first_name: "Ana".into(),
            last_name: "Lopes".into(),
            email: "ana@example.com".into(),
            emp_id: "E-1".into(),
            password_hash: None,
            role,
            store_id: None,
            employee_status: EmployeeStatus::Active,
            employee_type: EmployeeType::FullTime,
            classification_type: ClassificationType::FullTime,
            department_type: "Sales".into(),
            division: None,
            job_function_description: None,
            supervisor: None,
            current_employee_rating: None,
            date_of_birth: None,
            gender_code: None,
            marital_status: None,
            location_code: None,
            pay_zone: None,
            state: None,
            performance_score: None,
            feedback: None,
            start_date: None,
            exit_date: None,
            termination_type: TerminationType::NotApplicable,
            termination_description: DEFAULT_TERMINATION_DESCRIPTION.into(),
            phone: None,
            address: None,
            profile_picture: None,
            last_notification_check: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> EmployeeInput {
        EmployeeInput {
            first_name: Some("Ana".into()),
            last_name: Some("Lopes".into()),
            email: Some("Ana@Example.com ".into()),
            emp_id: Some("E-100".into()),
            department_type: Some("Sales".into()),
            ..Default::default()
        }
    }

    #[test]
    fn prepare_fills_employment_defaults() {
        let doc = prepare_staff(complete());
        assert_eq!(doc.role, Some(Role::Staff));
        assert_eq!(doc.employee_status, Some(EmployeeStatus::Active));
        assert_eq!(doc.employee_type, Some(EmployeeType::FullTime));
        assert_eq!(doc.classification_type, Some(ClassificationType::FullTime));
        assert_eq!(doc.termination_type, Some(TerminationType::NotApplicable));
        assert_eq!(doc.termination_description.as_deref(), Some("not applicable"));
        assert_eq!(doc.email.as_deref(), Some("ana@example.com"));
        assert!(validate_staff(&doc).valid);
    }

    #[test]
    fn missing_and_blank_required_fields_are_reported() {
        let doc = prepare_staff(EmployeeInput {
            first_name: Some(String::new()),
            department_type: None,
            ..complete()
        });
        let report = validate_staff(&doc);
        assert!(!report.valid);
        assert!(report.errors.contains(&"firstName is required".to_string()));
        assert!(report.errors.contains(&"departmentType is required".to_string()));
    }

    #[test]
    fn exit_before_start_is_invalid() {
        let doc = prepare_staff(EmployeeInput {
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            exit_date: NaiveDate::from_ymd_opt(2024, 4, 1),
            ..complete()
        });
        let report = validate_staff(&doc);
        assert_eq!(report.errors, vec!["exitDate cannot be before startDate".to_string()]);
    }

    #[test]
    fn employment_enums_use_original_spelling() {
        let doc: EmployeeInput = serde_json::from_value(serde_json::json!({
            "employeeStatus": "on leave",
            "employeeType": "part-time",
            "terminationType": "n/a",
            "genderCode": "prefer not to say"
        }))
        .unwrap();
        assert_eq!(doc.employee_status, Some(EmployeeStatus::OnLeave));
        assert_eq!(doc.employee_type, Some(EmployeeType::PartTime));
        assert_eq!(doc.gender_code, Some(GenderCode::PreferNotToSay));

        let bad = serde_json::from_value::<EmployeeInput>(serde_json::json!({ "employeeStatus": "retired" }));
        assert!(bad.is_err());
    }

    #[test]
    fn merge_keeps_stored_values_not_in_patch() {
        let stored = prepare_staff(complete());
        let patch = EmployeeInput { phone: Some("555-0101".into()), ..Default::default() };
        let merged = stored.merge(patch);
        assert_eq!(merged.first_name.as_deref(), Some("Ana"));
        assert_eq!(merged.phone.as_deref(), Some("555-0101"));
    }
}
