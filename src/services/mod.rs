//! Business logic services

pub mod admins;
pub mod auth;
pub mod borrowing;
pub mod catalog;
pub mod email;
pub mod notifications;
pub mod redis;
pub mod scheduler;
pub mod students;
pub mod verification;

use std::sync::Arc;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub students: students::StudentsService,
    pub admins: admins::AdminsService,
    pub verification: verification::VerificationService,
    pub catalog: catalog::CatalogService,
    pub borrowing: borrowing::BorrowingService,
    pub redis: redis::RedisService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository and mail transport
    pub fn new(
        repository: Repository,
        config: &AppConfig,
        redis_service: redis::RedisService,
        mailer: Arc<dyn email::Mailer>,
    ) -> Self {
        let notifications =
            notifications::NotificationService::new(mailer, config.email.clone());
        let auth = auth::AuthService::new(
            repository.clone(),
            config.auth.clone(),
            redis_service.clone(),
        );

        Self {
            students: students::StudentsService::new(
                repository.clone(),
                auth.clone(),
                notifications.clone(),
            ),
            admins: admins::AdminsService::new(repository.clone(), auth.clone()),
            verification: verification::VerificationService::new(
                repository.clone(),
                redis_service.clone(),
                notifications.clone(),
                &config.redis,
            ),
            catalog: catalog::CatalogService::new(repository.clone()),
            borrowing: borrowing::BorrowingService::new(
                repository.clone(),
                notifications,
                &config.borrowing,
            ),
            auth,
            redis: redis_service,
            repository,
        }
    }
}
