// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::staff::Employee;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(rename = "store manager")]
    #[sqlx(rename = "store manager")]
    StoreManager,
    Manager,
    Staff,
}

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Admins and both manager flavours.
    pub fn is_management(self) -> bool {
        matches!(self, Role::Admin | Role::StoreManager | Role::Manager)
    }

    pub fn is_store_manager(self) -> bool {
        matches!(self, Role::StoreManager | Role::Manager)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::StoreManager => "store manager",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: Employee,
}

// JWT payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_manager_uses_spaced_name() {
        let json = serde_json::to_string(&Role::StoreManager).unwrap();
        assert_eq!(json, "\"store manager\"");

        let parsed: Role = serde_json::from_str("\"store manager\"").unwrap();
        assert_eq!(parsed, Role::StoreManager);
    }

    #[test]
    fn unknown_roles_are_rejected() {
        assert!(serde_json::from_str::<Role>("\"owner\"").is_err());
    }

    #[test]
    fn management_roles() {
        assert!(Role::Admin.is_management());
        assert!(Role::Manager.is_management());
        assert!(Role::StoreManager.is_store_manager());
        assert!(!Role::Staff.is_management());
    }
}
