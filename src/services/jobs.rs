// src/services/jobs.rs

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{Days, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::{error::AppError, telemetry::JOB_LOG_TARGET},
    db::RosterRepository,
    services::{
        inventory_service::InventoryService,
        notification_service::{low_stock_alerts, missing_shift_alerts, NotificationService},
    },
};

pub const INVENTORY_CHECK: &str = "inventory_check";
pub const ROSTER_CHECK: &str = "roster_check";

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct JobOutcome {
    pub success: bool,
    pub message: String,
}

impl JobOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// A periodic check that can also be triggered by hand.
#[async_trait]
pub trait ManualJob: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self) -> Result<JobOutcome, AppError>;
}

/// Jobs enabled at startup, looked up by name.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: HashMap<&'static str, Arc<dyn ManualJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, job: Arc<dyn ManualJob>) -> Self {
        tracing::info!(target: JOB_LOG_TARGET, "Manual job registered: {}", job.name());
        self.jobs.insert(job.name(), job);
        self
    }

    /// Runs the named job. A job that errors is reported as a failed
    /// outcome; only an unknown name is an error.
    pub async fn run(&self, name: &str) -> Result<JobOutcome, AppError> {
        let job = self
            .jobs
            .get(name)
            .ok_or_else(|| AppError::JobUnavailable(name.to_string()))?;

        match job.run().await {
            Ok(outcome) => {
                tracing::info!(target: JOB_LOG_TARGET, "Job {} finished: {}", name, outcome.message);
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(target: JOB_LOG_TARGET, "Job {} failed: {}", name, e);
                Ok(JobOutcome::failed(format!("Failed to perform manual check: {e}")))
            }
        }
    }
}

/// Notifies management about every item at or below its reorder point.
pub struct InventoryCheckJob {
    inventory: InventoryService,
    notifications: NotificationService,
}

impl InventoryCheckJob {
    pub fn new(inventory: InventoryService, notifications: NotificationService) -> Self {
        Self { inventory, notifications }
    }
}

#[async_trait]
impl ManualJob for InventoryCheckJob {
    fn name(&self) -> &'static str {
        INVENTORY_CHECK
    }

    async fn run(&self) -> Result<JobOutcome, AppError> {
        let items = self.inventory.low_stock().await?;
        if items.is_empty() {
            return Ok(JobOutcome::ok("No low stock items found"));
        }
        self.notifications.dispatch(low_stock_alerts(&items)).await;
        Ok(JobOutcome::ok(format!("Created notifications for {} low stock items", items.len())))
    }
}

/// Warns management when nobody is rostered for tomorrow.
pub struct RosterCheckJob {
    roster_repo: RosterRepository,
    notifications: NotificationService,
}

impl RosterCheckJob {
    pub fn new(roster_repo: RosterRepository, notifications: NotificationService) -> Self {
        Self { roster_repo, notifications }
    }
}

#[async_trait]
impl ManualJob for RosterCheckJob {
    fn name(&self) -> &'static str {
        ROSTER_CHECK
    }

    async fn run(&self) -> Result<JobOutcome, AppError> {
        let today = Utc::now().date_naive();
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);

        if self.roster_repo.count_on(tomorrow).await? > 0 {
            return Ok(JobOutcome::ok("Shifts exist for tomorrow"));
        }
        self.notifications.dispatch(missing_shift_alerts(tomorrow)).await;
        Ok(JobOutcome::ok("Missing shift notifications created for tomorrow"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedJob {
        fail: bool,
    }

    #[async_trait]
    impl ManualJob for FixedJob {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn run(&self) -> Result<JobOutcome, AppError> {
            if self.fail {
                Err(AppError::bad_request("store offline"))
            } else {
                Ok(JobOutcome::ok("done"))
            }
        }
    }

    #[tokio::test]
    async fn registered_jobs_run_by_name() {
        let registry = JobRegistry::new().register(Arc::new(FixedJob { fail: false }));
        assert_eq!(registry.run("fixed").await.unwrap(), JobOutcome::ok("done"));
    }

    #[tokio::test]
    async fn unknown_jobs_are_unavailable() {
        let registry = JobRegistry::new();
        assert!(matches!(registry.run(ROSTER_CHECK).await, Err(AppError::JobUnavailable(_))));
    }

    #[tokio::test]
    async fn failing_jobs_report_a_failed_outcome() {
        let registry = JobRegistry::new().register(Arc::new(FixedJob { fail: true }));
        let outcome = registry.run("fixed").await.unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Failed to perform manual check: store offline");
    }
}
