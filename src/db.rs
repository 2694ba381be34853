pub mod activity_repo;
pub use activity_repo::ActivityRepository;
pub mod aggregation_repo;
pub use aggregation_repo::AggregationRepository;
pub mod employee_repo;
pub use employee_repo::EmployeeRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
pub mod request_repo;
pub use request_repo::RequestRepository;
pub mod roster_repo;
pub use roster_repo::RosterRepository;
pub mod sales_repo;
pub use sales_repo::{SalesDimension, SalesRepository};
pub mod target_repo;
pub use target_repo::TargetRepository;
