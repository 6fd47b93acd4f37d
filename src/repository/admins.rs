//! Admins repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::admin::Admin,
};

const ADMIN_COLUMNS: &str =
    "id, full_name, email, password_hash, mobile_number, registration_date, is_email_verified";

#[derive(Clone)]
pub struct AdminsRepository {
    pool: Pool<Postgres>,
}

impl AdminsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Admin>> {
        let query = format!(
            "SELECT {} FROM admins WHERE LOWER(email) = LOWER($1)",
            ADMIN_COLUMNS
        );
        let admin = sqlx::query_as::<_, Admin>(&query)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(admin)
    }

    pub async fn get_by_email(&self, email: &str) -> AppResult<Admin> {
        self.find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Admin not found with email: {}", email)))
    }

    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM admins WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(
        &self,
        full_name: &str,
        email: &str,
        password_hash: &str,
        mobile_number: Option<&str>,
    ) -> AppResult<Admin> {
        let query = format!(
            r#"
            INSERT INTO admins (id, full_name, email, password_hash, mobile_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ADMIN_COLUMNS
        );
        let admin = sqlx::query_as::<_, Admin>(&query)
            .bind(Uuid::new_v4())
            .bind(full_name)
            .bind(email)
            .bind(password_hash)
            .bind(mobile_number)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "Email already in use"))?;
        Ok(admin)
    }

    /// All admins, by name
    pub async fn list_all(&self) -> AppResult<Vec<Admin>> {
        let query = format!(
            "SELECT {} FROM admins ORDER BY LOWER(full_name), id",
            ADMIN_COLUMNS
        );
        let admins = sqlx::query_as::<_, Admin>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(admins)
    }

    pub async fn mark_email_verified(&self, email: &str) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE admins SET is_email_verified = TRUE WHERE LOWER(email) = LOWER($1)")
                .bind(email.trim())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Admin not found with id: {}", id)));
        }
        Ok(())
    }
}
