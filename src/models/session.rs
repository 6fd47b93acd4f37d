//! Session payload and token claims

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

use super::enums::Role;

/// Data kept in Redis for a logged-in account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub full_name: String,
    /// Token issued at login, re-validated by the token check endpoint
    pub jwt: String,
}

impl SessionData {
    pub fn require_admin(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Student => Err(AppError::Authorization(
                "Administrator privileges required".to_string(),
            )),
        }
    }

    pub fn require_student(&self) -> Result<(), AppError> {
        match self.role {
            Role::Student => Ok(()),
            Role::Admin => Err(AppError::Authorization(
                "Only students can perform this action".to_string(),
            )),
        }
    }
}

/// Login request, shared by students and admins
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// JWT claims; the subject is the account e-mail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl TokenClaims {
    pub fn new(email: &str, role: Role, lifetime_hours: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: email.to_string(),
            role,
            iat: now,
            exp: now + lifetime_hours as i64 * 3600,
        }
    }

    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-must-be-at-least-32-chars-long!";

    #[test]
    fn test_token_round_trip() {
        let claims = TokenClaims::new("ada@uni.edu", Role::Student, 24);
        let token = claims.create_token(SECRET).unwrap();
        let decoded = TokenClaims::from_token(&token, SECRET).unwrap();

        assert_eq!(decoded.sub, "ada@uni.edu");
        assert_eq!(decoded.role, Role::Student);
        assert_eq!(decoded.exp - decoded.iat, 24 * 3600);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let token = TokenClaims::new("ada@uni.edu", Role::Admin, 1)
            .create_token(SECRET)
            .unwrap();
        assert!(TokenClaims::from_token(&token, "another-secret").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut claims = TokenClaims::new("ada@uni.edu", Role::Admin, 1);
        claims.iat -= 10 * 3600;
        claims.exp = claims.iat + 3600;
        let token = claims.create_token(SECRET).unwrap();
        assert!(TokenClaims::from_token(&token, SECRET).is_err());
    }

    #[test]
    fn test_role_guards() {
        let session = SessionData {
            user_id: Uuid::new_v4(),
            email: "ada@uni.edu".into(),
            role: Role::Student,
            full_name: "Ada".into(),
            jwt: String::new(),
        };
        assert!(session.require_student().is_ok());
        assert!(matches!(session.require_admin(), Err(AppError::Authorization(_))));
    }
}
