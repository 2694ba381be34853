pub mod activity;
pub mod aggregation;
pub mod auth;
pub mod inventory;
pub mod notification;
pub mod report;
pub mod request;
pub mod roster;
pub mod sales;
pub mod staff;
pub mod target;
