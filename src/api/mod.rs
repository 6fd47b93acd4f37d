//! API handlers for Bookademia REST endpoints

pub mod admins;
pub mod auth;
pub mod books;
pub mod borrow_requests;
pub mod health;
pub mod openapi;
pub mod users;
pub mod verification;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        request::Parts,
        HeaderValue, Method, StatusCode,
    },
    routing::{delete, get, post, put},
    Router,
};
use axum_extra::extract::{
    cookie::{Cookie, CookieJar, SameSite},
    Multipart,
};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::ToSchema;

use crate::{
    config::AuthConfig,
    error::AppError,
    models::{pagination::PageRequest, session::SessionData},
    services::students::IdCardUpload,
    AppState,
};

/// Extractor for the caller's live session
pub struct CurrentSession(pub SessionData);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session_id = session_id(parts, state).await;
        let session = state
            .services
            .auth
            .authenticate(session_id.as_deref())
            .await?;
        Ok(CurrentSession(session))
    }
}

/// Live session with the admin role
pub struct AdminSession(pub SessionData);

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        session.require_admin()?;
        Ok(AdminSession(session))
    }
}

/// Live session with the student role
pub struct StudentSession(pub SessionData);

#[async_trait]
impl FromRequestParts<AppState> for StudentSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        session.require_student()?;
        Ok(StudentSession(session))
    }
}

/// Session if there is one; never rejects for a missing or stale cookie
pub struct OptionalSession(pub Option<SessionData>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session_id = session_id(parts, state).await;
        let session = state
            .services
            .auth
            .find_session(session_id.as_deref())
            .await?;
        Ok(OptionalSession(session))
    }
}

async fn session_id(parts: &mut Parts, state: &AppState) -> Option<String> {
    let jar = CookieJar::from_request_parts(parts, state).await.ok()?;
    jar.get(&state.config.auth.cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// HttpOnly cookie carrying the session id
pub fn session_cookie(config: &AuthConfig, session_id: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

pub fn removal_cookie(config: &AuthConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), "")).path("/").build()
}

/// Plain acknowledgement body
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, message)
    }

    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            status: status.as_u16(),
            message: message.into(),
        }
    }
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Items of the requested page
    pub items: Vec<T>,
    /// Total number of matching items
    pub total: i64,
    /// Current page number (1-based)
    pub page: i64,
    /// Items per page
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, page: PageRequest) -> Self {
        Self {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages(total),
        }
    }
}

/// Parts of a registration form: a `request` JSON part and an optional file
pub struct RegistrationForm<T> {
    pub request: T,
    pub id_card: Option<IdCardUpload>,
}

impl<T: DeserializeOwned> RegistrationForm<T> {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut request = None;
        let mut id_card = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("request") => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Invalid request part: {}", e)))?;
                    let parsed = serde_json::from_slice::<T>(&bytes)
                        .map_err(|e| AppError::BadRequest(format!("Invalid request part: {}", e)))?;
                    request = Some(parsed);
                }
                Some("idCardImage") => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::BadRequest(format!("Invalid ID card upload: {}", e)))?;
                    id_card = Some(IdCardUpload {
                        bytes: bytes.to_vec(),
                        file_name,
                        content_type,
                    });
                }
                _ => {}
            }
        }

        let request = request
            .ok_or_else(|| AppError::BadRequest("Missing 'request' part".to_string()))?;
        Ok(Self { request, id_card })
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT, AUTHORIZATION])
        .allow_credentials(true)
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Session check
        .route("/auth/check-token", get(auth::check_token))
        // Students
        .route("/user/register", post(users::register))
        .route("/user/login", post(users::login))
        .route("/user/check-email-verification", get(users::check_email_verification))
        .route("/user/profile", get(users::profile))
        .route("/user/logout", get(users::logout))
        .route("/user/accountStatus", get(users::account_status))
        .route("/user/allUsers", get(users::list_all_users))
        .route("/user/list", get(users::list_users))
        .route("/user/idcard/:email", get(users::get_id_card))
        .route("/user/delete/:email", delete(users::delete_user))
        .route("/user/approve/:email", put(users::approve_user))
        .route("/user/deny/:email", put(users::deny_user))
        .route("/user/:user_id", get(users::get_user))
        // Admins
        .route("/admin/register", post(admins::register))
        .route("/admin/login", post(admins::login))
        .route("/admin/check-email-verification", get(admins::check_email_verification))
        .route("/admin/logout", get(admins::logout))
        .route("/admin/allAdmins", get(admins::list_admins))
        .route("/admin/delete/:email", delete(admins::delete_admin))
        // Verification
        .route("/verify/send-code", post(verification::send_code))
        .route("/verify/verify-email", post(verification::verify_email))
        // Books
        .route("/books/allBooks", get(books::list_all_books))
        .route("/books/list", get(books::list_books))
        .route("/books/search/:keyword", get(books::search_books))
        .route("/books/createBook", post(books::create_book))
        .route("/books/rating", post(books::rate_book))
        .route(
            "/books/:book_id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        // Borrow requests
        .route("/borrow-requests/create", post(borrow_requests::create_request))
        .route("/borrow-requests/check-status", post(borrow_requests::check_status))
        .route("/borrow-requests/my-borrowed-books", get(borrow_requests::my_requests))
        .route("/borrow-requests/all-borrow-requests", get(borrow_requests::list_all_requests))
        .route("/borrow-requests/list", get(borrow_requests::list_requests))
        .route("/borrow-requests/approve-request/:id", put(borrow_requests::approve_request))
        .route("/borrow-requests/return-book/:id", put(borrow_requests::return_book))
        .route("/borrow-requests/delete-request/:id", delete(borrow_requests::delete_request))
        .route("/borrow-requests/:id", get(borrow_requests::get_request))
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes))
        .with_state(state.clone());

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api", api)
        .merge(openapi)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.server.cors_origins))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::{
        config::AppConfig,
        repository::Repository,
        services::{email::MockMailer, redis::RedisService, Services},
    };

    /// Router whose pool and Redis client never connect unless a handler needs them
    fn test_router() -> Router {
        let config = AppConfig::default();
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&config.database.url)
            .unwrap();
        let redis = RedisService::new(&config.redis.url).unwrap();
        let services = Services::new(
            Repository::new(pool),
            &config,
            redis,
            Arc::new(MockMailer::new()),
        );

        create_router(AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        })
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = test_router()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_protected_route_without_cookie_is_unauthorized() {
        let response = test_router()
            .oneshot(Request::get("/api/user/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["status"], 401);
        assert_eq!(body["error"], "Unauthorized");
        assert_eq!(body["message"], crate::services::auth::NO_SESSION);
    }

    #[tokio::test]
    async fn test_check_token_without_session() {
        let response = test_router()
            .oneshot(
                Request::get("/api/auth/check-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["message"], "User not authenticated");
    }

    #[tokio::test]
    async fn test_empty_cookie_counts_as_missing() {
        let response = test_router()
            .oneshot(
                Request::get("/api/books/allBooks")
                    .header(header::COOKIE, "BOOKADEMIA_SESSION=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_session_cookie_flags() {
        let config = AppConfig::default().auth;
        let cookie = session_cookie(&config, "abc".to_string());
        assert_eq!(cookie.name(), config.cookie_name);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_paginated_response_totals() {
        let page = PageRequest::new(Some(2), Some(7), 7);
        let response = PaginatedResponse::new(vec![crate::models::enums::Role::Student], 15, page);
        assert_eq!(response.page, 2);
        assert_eq!(response.per_page, 7);
        assert_eq!(response.total_pages, 3);
    }
}
