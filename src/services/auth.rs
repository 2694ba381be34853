// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::EmployeeRepository,
    models::{
        activity::{NewActivity, ACTIVITY_LOGIN},
        auth::{AuthResponse, Claims, Role},
        staff::{prepare_staff, validate_staff, Employee, EmployeeInput},
    },
    services::activity_service::ActivityService,
};

/// Hashes off the async runtime; bcrypt is deliberately slow.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("password hashing task failed: {}", e))??;
    Ok(hashed)
}

async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {}", e))??;
    Ok(valid)
}

/// Signs and checks HS256 tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl_days: i64,
}

impl TokenIssuer {
    pub fn new(secret: String, ttl_days: i64) -> Self {
        Self { secret, ttl_days }
    }

    pub fn issue(&self, employee: &Employee) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(self.ttl_days);

        let claims = Claims {
            sub: employee.id,
            email: employee.email.clone(),
            role: employee.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AppError::InvalidToken)
    }
}

#[derive(Clone)]
pub struct AuthService {
    employee_repo: EmployeeRepository,
    activity: ActivityService,
    tokens: TokenIssuer,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        employee_repo: EmployeeRepository,
        activity: ActivityService,
        tokens: TokenIssuer,
        pool: PgPool,
    ) -> Self {
        Self { employee_repo, activity, tokens, pool }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AppError> {
        let employee = self
            .employee_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_hash = employee
            .password_hash
            .as_deref()
            .ok_or(AppError::InvalidCredentials)?;
        if !verify_password(password, password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }

        self.activity
            .track(
                NewActivity::new(
                    employee.id,
                    ACTIVITY_LOGIN,
                    "Signed in",
                    format!("{} signed in", employee.full_name()),
                )
                .with_metadata(json!({ "role": employee.role.as_str() })),
            )
            .await;

        let token = self.tokens.issue(&employee)?;
        Ok(AuthResponse { token, user: employee })
    }

    /// Resolves a bearer token to the employee it was issued for.
    pub async fn validate_token(&self, token: &str) -> Result<Employee, AppError> {
        let claims = self.tokens.decode(token)?;
        self.employee_repo
            .find_by_id(&self.pool, claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    /// Creates the first admin account when the employees table is empty.
    pub async fn ensure_bootstrap_admin(&self, email: &str, password: &str) -> Result<(), AppError> {
        if self.employee_repo.count().await? > 0 {
            return Ok(());
        }

        let doc = prepare_staff(EmployeeInput {
            first_name: Some("System".to_string()),
            last_name: Some("Administrator".to_string()),
            email: Some(email.to_string()),
            emp_id: Some("ADMIN-001".to_string()),
            department_type: Some("Administration".to_string()),
            role: Some(Role::Admin),
            password: Some(password.to_string()),
            ..Default::default()
        });
        validate_staff(&doc).into_result()?;

        let password_hash = hash_password(password).await?;
        let admin = self
            .employee_repo
            .create(&self.pool, &doc, Some(&password_hash))
            .await?;
        tracing::info!("✅ Bootstrap admin created: {}", admin.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::staff::fixtures::employee;

    #[test]
    fn issued_tokens_decode_to_the_same_employee() {
        let issuer = TokenIssuer::new("test-secret".into(), 30);
        let staff = employee(Role::StoreManager);
        let claims = issuer.decode(&issuer.issue(&staff).unwrap()).unwrap();
        assert_eq!(claims.sub, staff.id);
        assert_eq!(claims.role, Role::StoreManager);
        assert_eq!(claims.email, "ana@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let token = TokenIssuer::new("one".into(), 1).issue(&employee(Role::Admin)).unwrap();
        let result = TokenIssuer::new("two".into(), 1).decode(&token);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let issuer = TokenIssuer::new("secret".into(), -2);
        let token = issuer.issue(&employee(Role::Staff)).unwrap();
        assert!(matches!(issuer.decode(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn hashed_passwords_verify() {
        let hashed = hash_password("s3cret!").await.unwrap();
        assert!(verify_password("s3cret!", &hashed).await.unwrap());
        assert!(!verify_password("wrong", &hashed).await.unwrap());
    }
}
