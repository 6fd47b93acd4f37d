//! Students repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{AccountStatus, BorrowStatus},
        pagination::{like_pattern, PageRequest},
        student::{IdCard, NewStudent, Student, StudentQuery, STUDENT_COLUMNS},
    },
};

#[derive(Clone)]
pub struct StudentsRepository {
    pool: Pool<Postgres>,
}

impl StudentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get student by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Student> {
        let query = format!("SELECT {} FROM students WHERE id = $1", STUDENT_COLUMNS);
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with id: {}", id)))
    }

    /// Find student by e-mail (case-insensitive)
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Student>> {
        let query = format!(
            "SELECT {} FROM students WHERE LOWER(email) = LOWER($1)",
            STUDENT_COLUMNS
        );
        let student = sqlx::query_as::<_, Student>(&query)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(student)
    }

    pub async fn get_by_email(&self, email: &str) -> AppResult<Student> {
        self.find_by_email(email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with email: {}", email)))
    }

    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM students WHERE LOWER(email) = LOWER($1))",
        )
        .bind(email.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a new student awaiting verification
    pub async fn create(&self, student: &NewStudent) -> AppResult<Student> {
        let query = format!(
            r#"
            INSERT INTO students (id, full_name, email, university_id, password_hash,
                                  id_card, id_card_name, id_card_type, account_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            STUDENT_COLUMNS
        );
        let created = sqlx::query_as::<_, Student>(&query)
            .bind(Uuid::new_v4())
            .bind(&student.full_name)
            .bind(&student.email)
            .bind(&student.university_id)
            .bind(&student.password_hash)
            .bind(&student.id_card)
            .bind(&student.id_card_name)
            .bind(&student.id_card_type)
            .bind(AccountStatus::VerificationPending)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "Email already in use"))?;
        Ok(created)
    }

    /// All students, most recent registrations first
    pub async fn list_all(&self) -> AppResult<Vec<Student>> {
        let query = format!(
            "SELECT {} FROM students ORDER BY registration_date DESC, id ASC",
            STUDENT_COLUMNS
        );
        let students = sqlx::query_as::<_, Student>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(students)
    }

    /// Search students with pagination
    pub async fn search(
        &self,
        query: &StudentQuery,
        page: PageRequest,
    ) -> AppResult<(Vec<Student>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
            params.push(like_pattern(q));
            let idx = params.len();
            conditions.push(format!(
                "(LOWER(full_name) LIKE ${idx} OR LOWER(email) LIKE ${idx} \
                 OR LOWER(university_id) LIKE ${idx})"
            ));
        }

        if let Some(status) = query.status {
            params.push(status.as_str().to_string());
            conditions.push(format!("account_status = ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM students {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT {} FROM students
            {}
            ORDER BY registration_date {}, id ASC
            LIMIT {} OFFSET {}
            "#,
            STUDENT_COLUMNS,
            where_clause,
            query.order.unwrap_or_default().as_sql(),
            page.limit(),
            page.offset()
        );
        let mut select_builder = sqlx::query_as::<_, Student>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let students = select_builder.fetch_all(&self.pool).await?;

        Ok((students, total))
    }

    /// Stored ID card image
    pub async fn get_id_card(&self, email: &str) -> AppResult<IdCard> {
        sqlx::query_as::<_, IdCard>(
            "SELECT id_card, id_card_name, id_card_type FROM students WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User not found with email: {}", email)))
    }

    pub async fn set_account_status(&self, id: Uuid, status: AccountStatus) -> AppResult<Student> {
        let query = format!(
            "UPDATE students SET account_status = $2 WHERE id = $1 RETURNING {}",
            STUDENT_COLUMNS
        );
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with id: {}", id)))
    }

    pub async fn mark_email_verified(&self, email: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE students SET is_email_verified = TRUE WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email.trim())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a student and the requests that never became loans.
    ///
    /// Fails when the student still holds a copy; the check runs under a row lock.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let held: Option<i32> =
            sqlx::query_scalar("SELECT no_books_borrowed FROM students WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        match held {
            None => {
                return Err(AppError::NotFound(format!("User not found with id: {}", id)));
            }
            Some(n) if n > 0 => {
                return Err(AppError::Conflict(
                    "Cannot delete user with borrowed books".to_string(),
                ));
            }
            Some(_) => {}
        }

        sqlx::query("DELETE FROM borrow_requests WHERE student_id = $1 AND status = $2")
            .bind(id)
            .bind(BorrowStatus::Pending)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
