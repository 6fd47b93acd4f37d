//! Session token check

use axum::{extract::State, Json};

use crate::{error::AppResult, services::auth::TokenStatus, AppState};

use super::OptionalSession;

/// Validate the caller's session, account and token
#[utoipa::path(
    get,
    path = "/auth/check-token",
    tag = "auth",
    responses(
        (status = 200, description = "User is authenticated", body = TokenStatus),
        (status = 401, description = "No session, invalid token or e-mail mismatch", body = crate::error::ErrorResponse),
        (status = 404, description = "Account no longer exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_token(
    State(state): State<AppState>,
    OptionalSession(session): OptionalSession,
) -> AppResult<Json<TokenStatus>> {
    let status = state.services.auth.check_token(session).await?;
    Ok(Json(status))
}
