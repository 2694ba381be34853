// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Staff ---
        handlers::staff::create_employee,
        handlers::staff::list_employees,
        handlers::staff::get_employee,
        handlers::staff::update_employee,
        handlers::staff::delete_employee,

        // --- Rosters ---
        handlers::roster::list_shifts,
        handlers::roster::shifts_by_date,
        handlers::roster::upcoming_shifts,
        handlers::roster::create_shift,
        handlers::roster::update_shift,
        handlers::roster::delete_shift,

        // --- Inventory ---
        handlers::inventory::inventory_value,
        handlers::inventory::low_stock,
        handlers::inventory::create_item,
        handlers::inventory::get_all_items,
        handlers::inventory::get_item,
        handlers::inventory::update_item,
        handlers::inventory::update_stock,
        handlers::inventory::stock_history,
        handlers::inventory::delete_item,

        // --- Sales ---
        handlers::sales::add_sale,
        handlers::sales::list_sales,
        handlers::sales::get_sale,
        handlers::sales::update_sale,
        handlers::sales::delete_sale,
        handlers::sales::bulk_import,
        handlers::sales::sales_by_minute,
        handlers::sales::sales_by_hour,
        handlers::sales::sales_by_date,
        handlers::sales::sales_for_date,
        handlers::sales::sales_for_hour,
        handlers::sales::hourly_sales,
        handlers::sales::sales_summary,
        handlers::sales::product_ranking,
        handlers::sales::sales_dashboard,
        handlers::sales::get_targets,
        handlers::sales::get_targets_in_range,
        handlers::sales::save_target,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::unread_notifications,
        handlers::notifications::new_notifications,
        handlers::notifications::notification_summary,
        handlers::notifications::create_notification,
        handlers::notifications::mark_all_read,
        handlers::notifications::mark_read,
        handlers::notifications::delete_notification,
        handlers::notifications::manual_inventory_check,
        handlers::notifications::manual_roster_check,

        // --- Requests ---
        handlers::requests::create_request,
        handlers::requests::list_requests,
        handlers::requests::my_requests,
        handlers::requests::pending_requests,
        handlers::requests::get_request,
        handlers::requests::update_status,
        handlers::requests::add_comment,
        handlers::requests::delete_request,

        // --- Profile ---
        handlers::profile::get_profile,
        handlers::profile::update_profile,
        handlers::profile::profile_activity,

        // --- Reports ---
        handlers::reports::recent_reports,
        handlers::reports::sales_report,
        handlers::reports::staff_report,
        handlers::reports::inventory_report,
        handlers::reports::financial_report,
        handlers::reports::operations_report,
        handlers::reports::custom_report,
    ),
    components(
        schemas(
            handlers::MessageResponse,
            services::jobs::JobOutcome,

            // --- Auth / Staff ---
            models::auth::Role,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::staff::EmployeeStatus,
            models::staff::EmployeeType,
            models::staff::ClassificationType,
            models::staff::GenderCode,
            models::staff::MaritalStatus,
            models::staff::TerminationType,
            models::staff::Employee,
            models::staff::EmployeeInput,

            // --- Rosters ---
            models::roster::EmployeeSnapshot,
            models::roster::Shift,
            models::roster::ShiftInput,

            // --- Inventory ---
            models::inventory::ProductCategory,
            models::inventory::ProductStatus,
            models::inventory::Dimensions,
            models::inventory::InventoryItem,
            models::inventory::InventoryInput,
            models::inventory::StockOperation,
            models::inventory::UpdateStockPayload,
            models::inventory::InventoryHistoryEntry,
            models::inventory::CategoryValue,
            models::inventory::InventoryValue,

            // --- Sales ---
            models::sales::PaymentMethod,
            models::sales::Sale,
            models::sales::SaleInput,
            models::sales::SalesListMeta,
            models::sales::SalesListResponse,
            models::sales::BucketDetail,
            models::sales::HourlySales,
            models::sales::SalesBreakdown,
            models::sales::SalesSummary,
            models::sales::ProductRanking,
            models::sales::DaySnapshot,
            models::sales::SalesDashboard,
            models::sales::BulkImportFailure,
            models::sales::BulkImportResult,
            models::sales::BulkImportPayload,
            models::aggregation::BucketEntry,
            models::aggregation::SalesBucket,
            models::aggregation::BucketTotals,
            models::target::TargetType,
            models::target::SalesTarget,
            models::target::SalesTargetPayload,
            models::target::TargetProgress,
            models::target::TargetOverview,
            models::target::TargetSaved,

            // --- Notifications ---
            models::notification::NotificationType,
            models::notification::Priority,
            models::notification::TargetRole,
            models::notification::ActionType,
            models::notification::NotificationAction,
            models::notification::Notification,
            models::notification::NotificationView,
            models::notification::NotificationInput,
            models::notification::NotificationList,
            models::notification::NotificationSummary,
            models::notification::MarkedRead,

            // --- Requests ---
            models::request::RequestType,
            models::request::RequestStatus,
            models::request::StaffAssignment,
            models::request::ProcessedBy,
            models::request::RequestComment,
            models::request::StaffRequest,
            models::request::RequestInput,
            models::request::UpdateStatusPayload,
            models::request::CommentPayload,

            // --- Profile ---
            models::activity::UserActivity,
            models::activity::Pagination,
            models::activity::ActivityPage,
            models::activity::ProfileUpdatePayload,
            models::activity::ProfileUpdated,

            // --- Reports ---
            models::report::GroupBy,
            models::report::Report,
            models::report::ReportResponse,
            models::report::RecentReports,
            models::report::RevenuePeriod,
            models::report::RevenueSummary,
            models::report::StaffHours,
            models::report::StaffSummary,
            models::report::StockStatus,
            models::report::StockLine,
            models::report::StockSummary,
            models::report::FinancialPeriod,
            models::report::FinancialSummary,
            models::report::OperationsDay,
            models::report::OperationsSummary,
            models::report::CustomMetrics,
            models::report::CustomRow,
        )
    ),
    tags(
        (name = "Auth", description = "Login and the current session"),
        (name = "Staff", description = "Employee records"),
        (name = "Rosters", description = "Shift scheduling"),
        (name = "Inventory", description = "Products, stock levels and stock history"),
        (name = "Sales", description = "Sale records and bulk import"),
        (name = "Sales Analytics", description = "Minute, hour and date buckets and dashboards"),
        (name = "Sales Targets", description = "Targets and progress against them"),
        (name = "Notifications", description = "Role and user addressed notifications, manual checks"),
        (name = "Requests", description = "Leave and shift requests"),
        (name = "Profile", description = "Self service profile and activity log"),
        (name = "Reports", description = "Generated and saved reports")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
