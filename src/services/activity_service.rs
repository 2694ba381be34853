// src/services/activity_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ActivityRepository,
    models::activity::{ActivityPage, ActivityQuery, NewActivity, Pagination},
};

#[derive(Clone)]
pub struct ActivityService {
    activity_repo: ActivityRepository,
}

impl ActivityService {
    pub fn new(activity_repo: ActivityRepository) -> Self {
        Self { activity_repo }
    }

    /// Records an activity. A failed write is logged and never fails the
    /// operation that triggered it.
    pub async fn track(&self, activity: NewActivity) {
        if let Err(e) = self.activity_repo.record(&activity).await {
            tracing::warn!(
                "could not record {} activity for {}: {}",
                activity.activity_type,
                activity.user_id,
                e
            );
        }
    }

    pub async fn page(&self, user_id: Uuid, query: &ActivityQuery) -> Result<ActivityPage, AppError> {
        let (limit, page, offset) = query.paging();
        let (activities, total) = self
            .activity_repo
            .page_for_user(user_id, query.activity_type.as_deref(), limit, offset)
            .await?;
        Ok(ActivityPage {
            activities,
            pagination: Pagination::new(page, limit, total),
        })
    }
}
