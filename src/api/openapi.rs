//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{accounts, auth, catalog, health, loans, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ShelfMaster API",
        version = "1.0.0",
        description = "Library loan management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Catalog
        catalog::list_categories,
        catalog::create_category,
        catalog::create_book,
        catalog::create_copy,
        catalog::available_copies,
        // Loans
        loans::request_loan,
        loans::pending_requests,
        loans::active_loans,
        loans::get_loan,
        loans::issue_loan,
        loans::return_loan,
        loans::reject_request,
        loans::set_due_date,
        loans::get_user_loans,
        // Accounts
        accounts::list_students,
        accounts::create_student,
        accounts::list_clerks,
        accounts::create_clerk,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            crate::services::auth::Principal,
            // Catalog
            crate::models::book::Category,
            crate::models::book::Book,
            crate::models::book::BookCopy,
            crate::models::book::CopyDetails,
            crate::models::book::CreateCategory,
            crate::models::book::CreateBook,
            crate::models::book::CreateCopy,
            crate::models::enums::BookCopyStatus,
            // Loans
            crate::models::transaction::TransactionDetails,
            crate::models::transaction::ReturnRecord,
            crate::models::transaction::CreateLoanRequest,
            crate::models::transaction::ReturnLoanRequest,
            crate::models::transaction::SetDueDateRequest,
            crate::models::enums::TransactionStatus,
            // Accounts
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::ClerkDetails,
            crate::models::user::CreateStudent,
            crate::models::user::CreateStaff,
            crate::models::enums::UserRole,
            // Stats
            crate::models::stats::DashboardStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "catalog", description = "Categories, books and copies"),
        (name = "loans", description = "Loan lifecycle"),
        (name = "accounts", description = "Student and staff accounts"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
