//! Student account endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{CookieJar, Multipart};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::AccountStatus,
        pagination::PageRequest,
        session::LoginRequest,
        student::{RegisterStudent, Student, StudentQuery},
    },
    AppState,
};

use super::{
    removal_cookie, session_cookie, AdminSession, CurrentSession, MessageResponse,
    PaginatedResponse, RegistrationForm,
};

const DEFAULT_PER_PAGE: i64 = 20;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailVerificationResponse {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub message: String,
    pub is_verified: bool,
}

impl EmailVerificationResponse {
    pub fn new(is_verified: bool) -> Self {
        Self {
            timestamp: Utc::now(),
            status: 200,
            message: "Email verification status retrieved successfully".to_string(),
            is_verified,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatusResponse {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub message: String,
    pub account_status: AccountStatus,
}

/// Register a student (multipart: `request` JSON and `idCardImage` file)
#[utoipa::path(
    post,
    path = "/user/register",
    tag = "users",
    request_body(content_type = "multipart/form-data", description = "`request` part with RegisterStudent JSON, `idCardImage` file part"),
    responses(
        (status = 200, description = "User registered, session cookie set", body = MessageResponse),
        (status = 400, description = "Invalid form or missing ID card", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let form = RegistrationForm::<RegisterStudent>::read(multipart).await?;
    let (_, session_id) = state
        .services
        .students
        .register(form.request, form.id_card)
        .await?;

    Ok((
        jar.add(session_cookie(&state.config.auth, session_id)),
        Json(MessageResponse::ok("User registered successfully")),
    ))
}

/// Student login
#[utoipa::path(
    post,
    path = "/user/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = MessageResponse),
        (status = 401, description = "Incorrect password", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let (_, session_id) = state.services.students.login(request).await?;
    Ok((
        jar.add(session_cookie(&state.config.auth, session_id)),
        Json(MessageResponse::ok("Login successful")),
    ))
}

/// Whether the session student's e-mail is verified
#[utoipa::path(
    get,
    path = "/user/check-email-verification",
    tag = "users",
    responses(
        (status = 200, description = "Verification status", body = EmailVerificationResponse),
        (status = 401, description = "No active session", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_email_verification(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<EmailVerificationResponse>> {
    let verified = state.services.students.is_email_verified(&session).await?;
    Ok(Json(EmailVerificationResponse::new(verified)))
}

/// Current student's profile
#[utoipa::path(
    get,
    path = "/user/profile",
    tag = "users",
    responses(
        (status = 200, description = "Student profile", body = Student),
        (status = 401, description = "No active session", body = crate::error::ErrorResponse)
    )
)]
pub async fn profile(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<Student>> {
    let student = state.services.students.profile(&session).await?;
    Ok(Json(student))
}

/// End the current session
#[utoipa::path(
    get,
    path = "/user/logout",
    tag = "users",
    responses(
        (status = 204, description = "Logged out, cookie cleared")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, StatusCode)> {
    if let Some(cookie) = jar.get(&state.config.auth.cookie_name) {
        state.services.auth.close_session(cookie.value()).await?;
    }
    Ok((
        jar.remove(removal_cookie(&state.config.auth)),
        StatusCode::NO_CONTENT,
    ))
}

/// Session student's account status
#[utoipa::path(
    get,
    path = "/user/accountStatus",
    tag = "users",
    responses(
        (status = 200, description = "Account status", body = AccountStatusResponse),
        (status = 401, description = "No active session", body = crate::error::ErrorResponse)
    )
)]
pub async fn account_status(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<AccountStatusResponse>> {
    let account_status = state.services.students.account_status(&session).await?;
    Ok(Json(AccountStatusResponse {
        timestamp: Utc::now(),
        status: 200,
        message: "User status retrieved successfully".to_string(),
        account_status,
    }))
}

/// All students
#[utoipa::path(
    get,
    path = "/user/allUsers",
    tag = "users",
    responses(
        (status = 200, description = "All students, newest first", body = Vec<Student>),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_all_users(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
) -> AppResult<Json<Vec<Student>>> {
    let students = state.services.students.list_all().await?;
    Ok(Json(students))
}

/// Search students with pagination
#[utoipa::path(
    get,
    path = "/user/list",
    tag = "users",
    params(StudentQuery),
    responses(
        (status = 200, description = "Page of students", body = PaginatedResponse<Student>),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Query(query): Query<StudentQuery>,
) -> AppResult<Json<PaginatedResponse<Student>>> {
    let page = PageRequest::new(query.page, query.per_page, DEFAULT_PER_PAGE);
    let (students, total) = state.services.students.search(&query, page).await?;
    Ok(Json(PaginatedResponse::new(students, total, page)))
}

/// Uploaded ID card image of a student
#[utoipa::path(
    get,
    path = "/user/idcard/{email}",
    tag = "users",
    params(("email" = String, Path, description = "Student e-mail")),
    responses(
        (status = 200, description = "Image bytes with the stored content type", content_type = "image/*"),
        (status = 404, description = "Student or ID card not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_id_card(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(email): Path<String>,
) -> AppResult<Response> {
    let card = state.services.students.id_card(&email).await?;
    let content_type = card.content_type().to_string();
    let bytes = card
        .id_card
        .ok_or_else(|| AppError::NotFound(format!("ID card not found for user: {}", email)))?;

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// Get student by ID
#[utoipa::path(
    get,
    path = "/user/{user_id}",
    tag = "users",
    params(("user_id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student", body = Student),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Student>> {
    let student = state.services.students.get_by_id(user_id).await?;
    Ok(Json(student))
}

/// Delete a student account
#[utoipa::path(
    delete,
    path = "/user/delete/{email}",
    tag = "users",
    params(("email" = String, Path, description = "Student e-mail")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Cannot delete user with borrowed books", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(email): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.students.delete(&email).await?;
    Ok(Json(MessageResponse::ok("User deleted successfully")))
}

/// Approve a student's ID card
#[utoipa::path(
    put,
    path = "/user/approve/{email}",
    tag = "users",
    params(("email" = String, Path, description = "Student e-mail")),
    responses(
        (status = 200, description = "User approved", body = MessageResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_user(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(email): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.students.approve(&email).await?;
    Ok(Json(MessageResponse::ok("User approved successfully")))
}

/// Deny a student's ID card
#[utoipa::path(
    put,
    path = "/user/deny/{email}",
    tag = "users",
    params(("email" = String, Path, description = "Student e-mail")),
    responses(
        (status = 200, description = "User denied", body = MessageResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn deny_user(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(email): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.students.deny(&email).await?;
    Ok(Json(MessageResponse::ok("User denied successfully")))
}
