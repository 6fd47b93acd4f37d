//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admins, auth, books, borrow_requests, health, users, verification};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bookademia API",
        version = "1.0.0",
        description = "University library REST API: accounts, catalog and borrowing"
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::check_token,
        // Users
        users::register,
        users::login,
        users::check_email_verification,
        users::profile,
        users::logout,
        users::account_status,
        users::list_all_users,
        users::list_users,
        users::get_id_card,
        users::get_user,
        users::delete_user,
        users::approve_user,
        users::deny_user,
        // Admins
        admins::register,
        admins::login,
        admins::check_email_verification,
        admins::logout,
        admins::list_admins,
        admins::delete_admin,
        // Verification
        verification::send_code,
        verification::verify_email,
        // Books
        books::list_all_books,
        books::list_books,
        books::search_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::rate_book,
        // Borrow requests
        borrow_requests::create_request,
        borrow_requests::check_status,
        borrow_requests::my_requests,
        borrow_requests::get_request,
        borrow_requests::list_all_requests,
        borrow_requests::list_requests,
        borrow_requests::approve_request,
        borrow_requests::return_book,
        borrow_requests::delete_request,
    ),
    components(
        schemas(
            // Shared
            crate::api::MessageResponse,
            crate::models::enums::Role,
            crate::models::enums::AccountStatus,
            crate::models::enums::BorrowStatus,
            crate::models::pagination::DateOrder,
            crate::models::pagination::BookSort,
            crate::models::session::LoginRequest,
            crate::services::auth::TokenStatus,
            // Users
            crate::models::student::Student,
            crate::models::student::RegisterStudent,
            users::EmailVerificationResponse,
            users::AccountStatusResponse,
            // Admins
            crate::models::admin::Admin,
            crate::models::admin::RegisterAdmin,
            // Verification
            verification::VerifyEmailRequest,
            // Books
            crate::models::book::Book,
            crate::models::book::CreateBook,
            crate::models::book::RateBook,
            books::BookCreatedResponse,
            // Borrow requests
            crate::models::borrow_request::BorrowRequest,
            crate::models::borrow_request::CreateBorrowRequest,
            crate::models::borrow_request::BorrowStatusQuery,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Session checks"),
        (name = "users", description = "Student accounts"),
        (name = "admins", description = "Admin accounts"),
        (name = "verification", description = "E-mail verification codes"),
        (name = "books", description = "Catalog management"),
        (name = "borrow-requests", description = "Borrow request lifecycle")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/health",
            "/auth/check-token",
            "/user/register",
            "/admin/login",
            "/verify/verify-email",
            "/books/{book_id}",
            "/borrow-requests/approve-request/{id}",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {}",
                expected
            );
        }
    }
}
