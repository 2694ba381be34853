// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        ActivityRepository, AggregationRepository, EmployeeRepository, InventoryRepository,
        NotificationRepository, ReportRepository, RequestRepository, RosterRepository,
        SalesRepository, TargetRepository,
    },
    services::{
        activity_service::ActivityService,
        aggregation_service::AggregationService,
        auth::{AuthService, TokenIssuer},
        inventory_service::InventoryService,
        jobs::{InventoryCheckJob, JobRegistry, RosterCheckJob},
        notification_service::NotificationService,
        profile_service::ProfileService,
        report_service::ReportService,
        request_service::RequestService,
        roster_service::RosterService,
        sales_service::SalesService,
        staff_service::StaffService,
    },
};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expires_in_days: i64,
    pub port: u16,
    pub db_max_connections: u32,
    pub log_dir: Option<PathBuf>,
    pub enable_inventory_check: bool,
    pub enable_roster_check: bool,
    /// Seeds the first admin when both are set and no employee exists yet.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T: FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match optional(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{name} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

/// `false`, `0`, `no` and `off` switch a flag off; anything else keeps it on.
pub fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => false,
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => true,
        _ => default,
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_expires_in_days: parsed_or("JWT_EXPIRES_IN_DAYS", 30)?,
            port: parsed_or("PORT", 5000)?,
            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", 10)?,
            log_dir: optional("LOG_DIR").map(PathBuf::from),
            enable_inventory_check: parse_flag(optional("ENABLE_INVENTORY_CHECK").as_deref(), true),
            enable_roster_check: parse_flag(optional("ENABLE_ROSTER_CHECK").as_deref(), true),
            admin_email: optional("ADMIN_EMAIL"),
            admin_password: optional("ADMIN_PASSWORD"),
        })
    }
}

// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub staff_service: StaffService,
    pub roster_service: RosterService,
    pub inventory_service: InventoryService,
    pub sales_service: SalesService,
    pub notification_service: NotificationService,
    pub request_service: RequestService,
    pub profile_service: ProfileService,
    pub report_service: ReportService,
    pub jobs: Arc<JobRegistry>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("could not connect to the database")?;

        tracing::info!("✅ Database connection established");

        // --- Repositories ---
        let employee_repo = EmployeeRepository::new(db_pool.clone());
        let roster_repo = RosterRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let sales_repo = SalesRepository::new(db_pool.clone());
        let aggregation_repo = AggregationRepository::new(db_pool.clone());
        let target_repo = TargetRepository::new(db_pool.clone());
        let notification_repo = NotificationRepository::new(db_pool.clone());
        let request_repo = RequestRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());
        let activity_repo = ActivityRepository::new(db_pool.clone());

        // --- Services ---
        let activity = ActivityService::new(activity_repo);
        let tokens = TokenIssuer::new(config.jwt_secret.clone(), config.jwt_expires_in_days);
        let auth_service = AuthService::new(employee_repo.clone(), activity.clone(), tokens, db_pool.clone());
        let staff_service = StaffService::new(employee_repo.clone(), activity.clone(), db_pool.clone());
        let roster_service = RosterService::new(roster_repo.clone(), employee_repo.clone(), db_pool.clone());
        let inventory_service = InventoryService::new(inventory_repo.clone(), db_pool.clone());
        let aggregation = AggregationService::new(aggregation_repo.clone(), db_pool.clone());
        let sales_service = SalesService::new(
            sales_repo,
            aggregation_repo.clone(),
            target_repo,
            inventory_service.clone(),
            aggregation,
            db_pool.clone(),
        );
        let notification_service = NotificationService::new(notification_repo, employee_repo.clone());
        let request_service = RequestService::new(
            request_repo,
            employee_repo.clone(),
            roster_repo.clone(),
            notification_service.clone(),
            activity.clone(),
            db_pool.clone(),
        );
        let profile_service = ProfileService::new(employee_repo.clone(), activity.clone(), db_pool.clone());
        let report_service = ReportService::new(
            report_repo,
            aggregation_repo,
            employee_repo,
            roster_repo.clone(),
            inventory_repo,
            activity,
        );

        // --- Manual jobs ---
        let mut jobs = JobRegistry::new();
        if config.enable_inventory_check {
            jobs = jobs.register(Arc::new(InventoryCheckJob::new(
                inventory_service.clone(),
                notification_service.clone(),
            )));
        }
        if config.enable_roster_check {
            jobs = jobs.register(Arc::new(RosterCheckJob::new(roster_repo, notification_service.clone())));
        }

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            staff_service,
            roster_service,
            inventory_service,
            sales_service,
            notification_service,
            request_service,
            profile_service,
            report_service,
            jobs: Arc::new(jobs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_default_when_unset_or_unknown() {
        assert!(parse_flag(None, true));
        assert!(!parse_flag(Some("FALSE"), true));
        assert!(!parse_flag(Some(" off "), true));
        assert!(parse_flag(Some("1"), false));
        assert!(parse_flag(Some("maybe"), true));
    }
}
