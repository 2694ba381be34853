pub mod activity_service;
pub mod aggregation_service;
pub mod auth;
pub mod inventory_service;
pub mod jobs;
pub mod notification_service;
pub mod profile_service;
pub mod report_service;
pub mod request_service;
pub mod roster_service;
pub mod sales_service;
pub mod staff_service;
