//! Admin account service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        admin::{Admin, RegisterAdmin},
        enums::Role,
        session::{LoginRequest, SessionData},
    },
    repository::Repository,
};

use super::auth::{self, AuthService};

#[derive(Clone)]
pub struct AdminsService {
    repository: Repository,
    auth: AuthService,
}

impl AdminsService {
    pub fn new(repository: Repository, auth: AuthService) -> Self {
        Self { repository, auth }
    }

    pub async fn register(&self, request: RegisterAdmin) -> AppResult<(Admin, String)> {
        request.validate()?;

        if self.repository.admins.email_exists(&request.email).await? {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let password_hash = auth::hash_password(&request.password)?;
        let mobile_number = request
            .mobile_number
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());
        let admin = self
            .repository
            .admins
            .create(
                request.full_name.trim(),
                request.email.trim(),
                &password_hash,
                mobile_number,
            )
            .await?;

        tracing::info!(email = %admin.email, "Admin registered");

        let session_id = self
            .auth
            .open_session(admin.id, &admin.email, Role::Admin, &admin.full_name)
            .await?;
        Ok((admin, session_id))
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<(Admin, String)> {
        request.validate()?;

        let admin = self.repository.admins.get_by_email(&request.email).await?;
        if !auth::verify_password(&admin.password_hash, &request.password)? {
            return Err(AppError::Authentication("Incorrect password".to_string()));
        }

        let session_id = self
            .auth
            .open_session(admin.id, &admin.email, Role::Admin, &admin.full_name)
            .await?;
        Ok((admin, session_id))
    }

    pub async fn is_email_verified(&self, session: &SessionData) -> AppResult<bool> {
        session.require_admin()?;
        let admin = self.repository.admins.get_by_email(&session.email).await?;
        Ok(admin.is_email_verified)
    }

    pub async fn list_all(&self) -> AppResult<Vec<Admin>> {
        self.repository.admins.list_all().await
    }

    /// Delete another admin account and end its session
    pub async fn delete(&self, session: &SessionData, email: &str) -> AppResult<()> {
        let admin = self.repository.admins.get_by_email(email).await?;
        if admin.id == session.user_id {
            return Err(AppError::Conflict(
                "You cannot delete your own admin account".to_string(),
            ));
        }

        self.repository.admins.delete(admin.id).await?;
        self.auth.revoke_sessions_for(&admin.email).await?;

        tracing::info!(email = %admin.email, deleted_by = %session.email, "Admin deleted");
        Ok(())
    }
}
