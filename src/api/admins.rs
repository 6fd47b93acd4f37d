//! Admin account endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::{CookieJar, Multipart};

use crate::{
    error::AppResult,
    models::{
        admin::{Admin, RegisterAdmin},
        session::LoginRequest,
    },
    AppState,
};

use super::{
    removal_cookie, session_cookie, users::EmailVerificationResponse, AdminSession,
    CurrentSession, MessageResponse, RegistrationForm,
};

/// Register an admin (multipart: `request` JSON part)
#[utoipa::path(
    post,
    path = "/admin/register",
    tag = "admins",
    request_body(content_type = "multipart/form-data", description = "`request` part with RegisterAdmin JSON"),
    responses(
        (status = 200, description = "Admin registered, session cookie set", body = MessageResponse),
        (status = 409, description = "Email already in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let form = RegistrationForm::<RegisterAdmin>::read(multipart).await?;
    let (_, session_id) = state.services.admins.register(form.request).await?;

    Ok((
        jar.add(session_cookie(&state.config.auth, session_id)),
        Json(MessageResponse::ok("Admin registered successfully")),
    ))
}

/// Admin login
#[utoipa::path(
    post,
    path = "/admin/login",
    tag = "admins",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = MessageResponse),
        (status = 401, description = "Incorrect password", body = crate::error::ErrorResponse),
        (status = 404, description = "Admin not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<MessageResponse>)> {
    let (_, session_id) = state.services.admins.login(request).await?;
    Ok((
        jar.add(session_cookie(&state.config.auth, session_id)),
        Json(MessageResponse::ok("Login successful")),
    ))
}

#[utoipa::path(
    get,
    path = "/admin/check-email-verification",
    tag = "admins",
    responses(
        (status = 200, description = "Verification status", body = EmailVerificationResponse),
        (status = 401, description = "No active session", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_email_verification(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<EmailVerificationResponse>> {
    let verified = state.services.admins.is_email_verified(&session).await?;
    Ok(Json(EmailVerificationResponse::new(verified)))
}

#[utoipa::path(
    get,
    path = "/admin/logout",
    tag = "admins",
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

/// All admins
#[utoipa::path(
    get,
    path = "/admin/allAdmins",
    tag = "admins",
    responses(
        (status = 200, description = "All admin accounts", body = Vec<Admin>),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_admins(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
) -> AppResult<Json<Vec<Admin>>> {
    let admins = state.services.admins.list_all().await?;
    Ok(Json(admins))
}

/// Delete another admin account
#[utoipa::path(
    delete,
    path = "/admin/delete/{email}",
    tag = "admins",
    params(("email" = String, Path, description = "Admin e-mail")),
    responses(
        (status = 200, description = "Admin deleted", body = MessageResponse),
        (status = 404, description = "Admin not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Cannot delete own account", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_admin(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(email): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.services.admins.delete(&admin, &email).await?;
    Ok(Json(MessageResponse::ok("Admin deleted successfully")))
}
