//! E-mail verification codes

use rand::Rng;

use crate::{
    config::RedisConfig,
    error::{AppError, AppResult},
    models::session::SessionData,
    repository::Repository,
};

use super::{
    notifications::{Notification, NotificationService},
    redis::RedisService,
};

/// Six-digit code in 100000..=999999
pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

#[derive(Clone)]
pub struct VerificationService {
    repository: Repository,
    redis: RedisService,
    notifications: NotificationService,
    code_ttl_seconds: u64,
}

impl VerificationService {
    pub fn new(
        repository: Repository,
        redis: RedisService,
        notifications: NotificationService,
        config: &RedisConfig,
    ) -> Self {
        Self {
            repository,
            redis,
            notifications,
            code_ttl_seconds: config.verification_code_ttl_seconds,
        }
    }

    /// Generate a code for the session's account and mail it
    pub async fn send_code(&self, session: &SessionData) -> AppResult<()> {
        let email = &session.email;
        let student = self.repository.students.find_by_email(email).await?;
        let admin = self.repository.admins.find_by_email(email).await?;

        let name = match (&student, &admin) {
            (Some(student), _) => student.full_name.clone(),
            (None, Some(admin)) => admin.full_name.clone(),
            (None, None) => {
                return Err(AppError::NotFound(format!(
                    "User not found with email: {}",
                    email
                )))
            }
        };

        let code = generate_code();
        self.redis
            .store_verification_code(email, &code, self.code_ttl_seconds)
            .await?;

        tracing::info!(email = %email, "Verification code issued");

        self.notifications
            .notify(
                email,
                Notification::VerificationCode {
                    name: &name,
                    code: &code,
                },
            )
            .await;
        Ok(())
    }

    /// Check a code and mark the account verified
    pub async fn verify_email(&self, session: &SessionData, code: Option<&str>) -> AppResult<()> {
        let code = code
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing verification code".to_string()))?;

        let email = &session.email;
        if !self.redis.verify_code(email, code).await? {
            return Err(AppError::Authentication(
                "Invalid or expired code".to_string(),
            ));
        }

        let student_verified = self.repository.students.mark_email_verified(email).await?;
        self.repository.admins.mark_email_verified(email).await?;

        tracing::info!(email = %email, "Email verified");

        if student_verified {
            if let Some(student) = self.repository.students.find_by_email(email).await? {
                self.notifications
                    .notify(
                        &student.email,
                        Notification::Welcome {
                            name: &student.full_name,
                        },
                    )
                    .await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let value: u32 = code.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }
}
