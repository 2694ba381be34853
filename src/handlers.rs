use serde::Serialize;
use utoipa::ToSchema;

pub mod auth;
pub mod inventory;
pub mod notifications;
pub mod profile;
pub mod reports;
pub mod requests;
pub mod roster;
pub mod sales;
pub mod staff;

/// Body of responses that only confirm an action.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
