//! E-mail verification endpoints

use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{error::AppResult, AppState};

use super::{CurrentSession, MessageResponse};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct VerifyEmailRequest {
    pub code: Option<String>,
}

/// Mail a fresh 6-digit code to the session's address
#[utoipa::path(
    post,
    path = "/verify/send-code",
    tag = "verification",
    responses(
        (status = 200, description = "Code sent", body = MessageResponse),
        (status = 401, description = "No active session", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn send_code(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<MessageResponse>> {
    state.services.verification.send_code(&session).await?;
    Ok(Json(MessageResponse::ok("Verification code sent")))
}

/// Check a code and mark the account verified
#[utoipa::path(
    post,
    path = "/verify/verify-email",
    tag = "verification",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Missing verification code", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid or expired code", body = crate::error::ErrorResponse)
    )
)]
pub async fn verify_email(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(request): Json<VerifyEmailRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .verification
        .verify_email(&session, request.code.as_deref())
        .await?;
    Ok(Json(MessageResponse::ok("Email verified successfully")))
}
