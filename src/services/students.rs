//! Student account service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{AccountStatus, Role},
        pagination::PageRequest,
        session::{LoginRequest, SessionData},
        student::{IdCard, NewStudent, RegisterStudent, Student, StudentQuery},
    },
    repository::Repository,
};

use super::{
    auth::{self, AuthService},
    notifications::{Notification, NotificationService},
};

/// Uploaded ID card file
#[derive(Debug)]
pub struct IdCardUpload {
    pub bytes: Vec<u8>,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Clone)]
pub struct StudentsService {
    repository: Repository,
    auth: AuthService,
    notifications: NotificationService,
}

impl StudentsService {
    pub fn new(repository: Repository, auth: AuthService, notifications: NotificationService) -> Self {
        Self {
            repository,
            auth,
            notifications,
        }
    }

    /// Register a student awaiting ID card verification and open their session
    pub async fn register(
        &self,
        request: RegisterStudent,
        id_card: Option<IdCardUpload>,
    ) -> AppResult<(Student, String)> {
        request.validate()?;

        let id_card = id_card
            .filter(|card| !card.bytes.is_empty())
            .ok_or_else(|| AppError::BadRequest("ID card image is required".to_string()))?;

        if self.repository.students.email_exists(&request.email).await? {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }

        let student = self
            .repository
            .students
            .create(&NewStudent {
                full_name: request.full_name.trim().to_string(),
                email: request.email.trim().to_string(),
                university_id: request.university_id.trim().to_string(),
                password_hash: auth::hash_password(&request.password)?,
                id_card: id_card.bytes,
                id_card_name: id_card.file_name,
                id_card_type: id_card.content_type,
            })
            .await?;

        tracing::info!(email = %student.email, "Student registered");

        let session_id = self
            .auth
            .open_session(student.id, &student.email, Role::Student, &student.full_name)
            .await?;
        Ok((student, session_id))
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<(Student, String)> {
        request.validate()?;

        let student = self.repository.students.get_by_email(&request.email).await?;
        if !auth::verify_password(&student.password_hash, &request.password)? {
            return Err(AppError::Authentication("Incorrect password".to_string()));
        }

        let session_id = self
            .auth
            .open_session(student.id, &student.email, Role::Student, &student.full_name)
            .await?;
        Ok((student, session_id))
    }

    pub async fn get_by_id(&self, id: uuid::Uuid) -> AppResult<Student> {
        self.repository.students.get_by_id(id).await
    }

    /// The session's own account
    pub async fn profile(&self, session: &SessionData) -> AppResult<Student> {
        session.require_student()?;
        self.repository.students.get_by_id(session.user_id).await
    }

    pub async fn account_status(&self, session: &SessionData) -> AppResult<AccountStatus> {
        Ok(self.profile(session).await?.account_status)
    }

    pub async fn is_email_verified(&self, session: &SessionData) -> AppResult<bool> {
        Ok(self.profile(session).await?.is_email_verified)
    }

    pub async fn id_card(&self, email: &str) -> AppResult<IdCard> {
        let card = self.repository.students.get_id_card(email).await?;
        if card.id_card.as_ref().map_or(true, |bytes| bytes.is_empty()) {
            return Err(AppError::NotFound(format!(
                "ID card not found for user: {}",
                email
            )));
        }
        Ok(card)
    }

    pub async fn list_all(&self) -> AppResult<Vec<Student>> {
        self.repository.students.list_all().await
    }

    pub async fn search(&self, query: &StudentQuery, page: PageRequest) -> AppResult<(Vec<Student>, i64)> {
        self.repository.students.search(query, page).await
    }

    /// Delete a student holding no books, then end their session
    pub async fn delete(&self, email: &str) -> AppResult<()> {
        let student = self.repository.students.get_by_email(email).await?;
        self.repository.students.delete(student.id).await?;
        self.auth.revoke_sessions_for(&student.email).await?;

        tracing::info!(email = %student.email, "Student deleted");
        Ok(())
    }

    pub async fn approve(&self, email: &str) -> AppResult<Student> {
        let student = self.set_status(email, AccountStatus::Verified).await?;
        self.notifications
            .notify(
                &student.email,
                Notification::AccountApproved {
                    name: &student.full_name,
                },
            )
            .await;
        Ok(student)
    }

    pub async fn deny(&self, email: &str) -> AppResult<Student> {
        let student = self.set_status(email, AccountStatus::Denied).await?;
        self.notifications
            .notify(
                &student.email,
                Notification::AccountDenied {
                    name: &student.full_name,
                },
            )
            .await;
        Ok(student)
    }

    async fn set_status(&self, email: &str, status: AccountStatus) -> AppResult<Student> {
        let student = self.repository.students.get_by_email(email).await?;
        let updated = self
            .repository
            .students
            .set_account_status(student.id, status)
            .await?;
        tracing::info!(email = %updated.email, status = %status, "Account status changed");
        Ok(updated)
    }
}
