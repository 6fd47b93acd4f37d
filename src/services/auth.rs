//! Authentication service: password hashing, tokens and sessions

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        enums::Role,
        session::{SessionData, TokenClaims},
    },
    repository::Repository,
};

use super::redis::RedisService;

pub const NO_SESSION: &str = "No active session. Reload the page to login again.";
pub const STALE_SESSION: &str = "Session is invalid or user was deleted.";

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Token check response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub message: String,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub user_id: Uuid,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
    redis: RedisService,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig, redis: RedisService) -> Self {
        Self {
            repository,
            config,
            redis,
        }
    }

    /// Issue a token and open the account's single live session
    pub async fn open_session(
        &self,
        user_id: Uuid,
        email: &str,
        role: Role,
        full_name: &str,
    ) -> AppResult<String> {
        let jwt = TokenClaims::new(email, role, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        let data = SessionData {
            user_id,
            email: email.to_string(),
            role,
            full_name: full_name.to_string(),
            jwt,
        };

        let session_id = self
            .redis
            .create_session(&data, self.config.session_ttl_hours * 3600)
            .await?;

        tracing::info!(email = %email, role = %role, "Session opened");
        Ok(session_id)
    }

    /// Resolve a session cookie to a live session
    pub async fn authenticate(&self, session_id: Option<&str>) -> AppResult<SessionData> {
        let session_id =
            session_id.ok_or_else(|| AppError::Authentication(NO_SESSION.to_string()))?;
        let session = self
            .redis
            .get_session(session_id)
            .await?
            .ok_or_else(|| AppError::Authentication(NO_SESSION.to_string()))?;

        if !self.redis.is_current_session(&session.email, session_id).await? {
            return Err(AppError::Authentication(STALE_SESSION.to_string()));
        }

        Ok(session)
    }

    /// Optional variant used by public endpoints
    pub async fn find_session(&self, session_id: Option<&str>) -> AppResult<Option<SessionData>> {
        match self.authenticate(session_id).await {
            Ok(session) => Ok(Some(session)),
            Err(AppError::Authentication(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn close_session(&self, session_id: &str) -> AppResult<()> {
        self.redis.delete_session(session_id).await
    }

    pub async fn revoke_sessions_for(&self, email: &str) -> AppResult<()> {
        self.redis.purge_sessions_for(email).await
    }

    /// Re-validate a session's account and token
    pub async fn check_token(&self, session: Option<SessionData>) -> AppResult<TokenStatus> {
        let session = session
            .ok_or_else(|| AppError::Authentication("User not authenticated".to_string()))?;

        let exists = match session.role {
            Role::Student => self
                .repository
                .students
                .find_by_email(&session.email)
                .await?
                .is_some(),
            Role::Admin => self
                .repository
                .admins
                .find_by_email(&session.email)
                .await?
                .is_some(),
        };
        if !exists {
            return Err(AppError::NotFound(
                "Account no longer exists. Check with the admin for more details.".to_string(),
            ));
        }

        let claims = TokenClaims::from_token(&session.jwt, &self.config.jwt_secret)
            .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))?;

        if !claims.sub.eq_ignore_ascii_case(&session.email) {
            return Err(AppError::Authentication("Token email mismatch".to_string()));
        }

        Ok(TokenStatus {
            message: "User is authenticated".to_string(),
            email: session.email,
            role: session.role,
            name: session.full_name,
            user_id: session.user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("s3cret!").unwrap();
        assert_ne!(hash, "s3cret!");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "s3cret!").unwrap());
        assert!(!verify_password(&hash, "wrong").unwrap());
    }

    #[test]
    fn test_corrupt_hash_is_an_error() {
        assert!(matches!(
            verify_password("not-a-hash", "x"),
            Err(AppError::Internal(_))
        ));
    }
}
