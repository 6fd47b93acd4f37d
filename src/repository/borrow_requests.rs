//! Borrow requests repository for database operations

use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::Inventory,
        borrow_request::{
            due_date_from, local_day, BorrowRequest, BorrowRequestQuery, NewBorrowRequest,
        },
        enums::BorrowStatus,
        pagination::{like_pattern, PageRequest},
    },
};

const REQUEST_COLUMNS: &str = "id, book_id, book_title, book_author, book_cover, book_color, \
     student_id, student_full_name, student_email, status, request_date, \
     issue_date, due_date, return_date";

#[derive(Clone)]
pub struct BorrowRequestsRepository {
    pool: Pool<Postgres>,
}

impl BorrowRequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow request by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BorrowRequest> {
        let query = format!("SELECT {} FROM borrow_requests WHERE id = $1", REQUEST_COLUMNS);
        sqlx::query_as::<_, BorrowRequest>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow request not found with id: {}", id)))
    }

    /// Whether the student already has a pending or outstanding request for the book
    pub async fn has_active(&self, student_id: Uuid, book_id: Uuid) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM borrow_requests
                WHERE student_id = $1 AND book_id = $2 AND status IN ($3, $4, $5)
            )
            "#,
        )
        .bind(student_id)
        .bind(book_id)
        .bind(BorrowStatus::Pending)
        .bind(BorrowStatus::Borrowed)
        .bind(BorrowStatus::Overdue)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Create a new pending request
    pub async fn create(&self, request: &NewBorrowRequest) -> AppResult<BorrowRequest> {
        let query = format!(
            r#"
            INSERT INTO borrow_requests (id, book_id, book_title, book_author, book_cover, book_color,
                                         student_id, student_full_name, student_email, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );
        let created = sqlx::query_as::<_, BorrowRequest>(&query)
            .bind(Uuid::new_v4())
            .bind(request.book_id)
            .bind(&request.book_title)
            .bind(&request.book_author)
            .bind(&request.book_cover)
            .bind(&request.book_color)
            .bind(request.student_id)
            .bind(&request.student_full_name)
            .bind(&request.student_email)
            .bind(BorrowStatus::Pending)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::conflict_on_unique(
                    e,
                    format!("You already have an active request for {}", request.book_title),
                )
            })?;
        Ok(created)
    }

    /// Most recent request of a student for a book
    pub async fn latest_for(&self, student_id: Uuid, book_id: Uuid) -> AppResult<Option<BorrowRequest>> {
        let query = format!(
            r#"
            SELECT {} FROM borrow_requests
            WHERE student_id = $1 AND book_id = $2
            ORDER BY request_date DESC, id DESC
            LIMIT 1
            "#,
            REQUEST_COLUMNS
        );
        let request = sqlx::query_as::<_, BorrowRequest>(&query)
            .bind(student_id)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(request)
    }

    /// Requests of one student, most recent first
    pub async fn list_for_student(&self, student_id: Uuid) -> AppResult<Vec<BorrowRequest>> {
        let query = format!(
            "SELECT {} FROM borrow_requests WHERE student_id = $1 ORDER BY request_date DESC, id DESC",
            REQUEST_COLUMNS
        );
        let requests = sqlx::query_as::<_, BorrowRequest>(&query)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(requests)
    }

    /// Every request, most recent first
    pub async fn list_all(&self) -> AppResult<Vec<BorrowRequest>> {
        let query = format!(
            "SELECT {} FROM borrow_requests ORDER BY request_date DESC, id DESC",
            REQUEST_COLUMNS
        );
        let requests = sqlx::query_as::<_, BorrowRequest>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(requests)
    }

    /// Search requests with pagination
    pub async fn search(
        &self,
        query: &BorrowRequestQuery,
        page: PageRequest,
    ) -> AppResult<(Vec<BorrowRequest>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
            params.push(like_pattern(q));
            let idx = params.len();
            conditions.push(format!(
                "(LOWER(book_title) LIKE ${idx} OR LOWER(student_full_name) LIKE ${idx} \
                 OR LOWER(student_email) LIKE ${idx})"
            ));
        }

        if let Some(status) = query.status {
            params.push(status.as_str().to_string());
            conditions.push(format!("status = ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM borrow_requests {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let order = query.order.unwrap_or_default().as_sql();
        let select_query = format!(
            r#"
            SELECT {} FROM borrow_requests
            {}
            ORDER BY request_date {}, id {}
            LIMIT {} OFFSET {}
            "#,
            REQUEST_COLUMNS,
            where_clause,
            order,
            order,
            page.limit(),
            page.offset()
        );
        let mut select_builder = sqlx::query_as::<_, BorrowRequest>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let requests = select_builder.fetch_all(&self.pool).await?;

        Ok((requests, total))
    }

    async fn lock_request(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> AppResult<BorrowRequest> {
        let query = format!(
            "SELECT {} FROM borrow_requests WHERE id = $1 FOR UPDATE",
            REQUEST_COLUMNS
        );
        sqlx::query_as::<_, BorrowRequest>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow request not found with id: {}", id)))
    }

    async fn lock_inventory(
        tx: &mut Transaction<'_, Postgres>,
        book_id: Uuid,
    ) -> AppResult<Option<(Inventory, String)>> {
        let row: Option<(i32, i32, String)> = sqlx::query_as(
            "SELECT total_copies, available_copies, title FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(book_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row.map(|(total, available, title)| (Inventory { total, available }, title)))
    }

    /// Lend a copy: Pending -> Borrowed, one copy off the shelf, student count +1
    pub async fn approve(&self, id: Uuid, loan_duration_days: i64) -> AppResult<BorrowRequest> {
        let mut tx = self.pool.begin().await?;

        let request = Self::lock_request(&mut tx, id).await?;
        let next = request.status.approve()?;

        let (inventory, title) = Self::lock_inventory(&mut tx, request.book_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Book not found with id: {}", request.book_id))
            })?;
        let inventory = inventory.check_out().ok_or_else(|| {
            AppError::Conflict(format!(
                "{} is not available for borrowing. Check the available copies and try again later.",
                title
            ))
        })?;

        sqlx::query("UPDATE books SET available_copies = $2 WHERE id = $1")
            .bind(request.book_id)
            .bind(inventory.available)
            .execute(&mut *tx)
            .await?;

        let student = sqlx::query(
            "UPDATE students SET no_books_borrowed = no_books_borrowed + 1 WHERE id = $1",
        )
        .bind(request.student_id)
        .execute(&mut *tx)
        .await?;
        if student.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "User not found with id: {}",
                request.student_id
            )));
        }

        let issued = Utc::now();
        let query = format!(
            r#"
            UPDATE borrow_requests
            SET status = $2, issue_date = $3, due_date = $4
            WHERE id = $1
            RETURNING {}
            "#,
            REQUEST_COLUMNS
        );
        let approved = sqlx::query_as::<_, BorrowRequest>(&query)
            .bind(id)
            .bind(next)
            .bind(issued)
            .bind(due_date_from(issued, loan_duration_days))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(approved)
    }

    /// Take a copy back: Borrowed/Overdue -> Returned/Late Return
    pub async fn return_book(&self, id: Uuid) -> AppResult<BorrowRequest> {
        let mut tx = self.pool.begin().await?;

        let request = Self::lock_request(&mut tx, id).await?;
        let returned_at = Utc::now();
        let next = request
            .status
            .on_return(request.due_day(), local_day(returned_at))?;

        // The catalog entry may have been removed since the loan started
        if let Some((inventory, _)) = Self::lock_inventory(&mut tx, request.book_id).await? {
            let inventory = inventory.check_in()?;
            sqlx::query("UPDATE books SET available_copies = $2 WHERE id = $1")
                .bind(request.book_id)
                .bind(inventory.available)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            "UPDATE students SET no_books_borrowed = GREATEST(no_books_borrowed - 1, 0) WHERE id = $1",
        )
        .bind(request.student_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE borrow_requests SET status = $2, return_date = $3 WHERE id = $1 RETURNING {}",
            REQUEST_COLUMNS
        );
        let returned = sqlx::query_as::<_, BorrowRequest>(&query)
            .bind(id)
            .bind(next)
            .bind(returned_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(returned)
    }

    /// Delete a request that does not hold a copy
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let request = Self::lock_request(&mut tx, id).await?;
        request.status.ensure_deletable()?;

        sqlx::query("DELETE FROM borrow_requests WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Borrowed loans not yet returned and due on or before `day`
    pub async fn open_loans_due_by(&self, day: NaiveDate) -> AppResult<Vec<BorrowRequest>> {
        // One day of slack covers time zone offsets; the caller compares local days
        let cutoff = day.succ_opt().unwrap_or(day);
        let query = format!(
            r#"
            SELECT {} FROM borrow_requests
            WHERE status = $1 AND return_date IS NULL AND due_date IS NOT NULL
              AND due_date::date <= $2
            ORDER BY due_date ASC
            "#,
            REQUEST_COLUMNS
        );
        let requests = sqlx::query_as::<_, BorrowRequest>(&query)
            .bind(BorrowStatus::Borrowed)
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await?;
        Ok(requests)
    }

    /// Flag a Borrowed loan as Overdue; false if it changed meanwhile
    pub async fn mark_overdue(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE borrow_requests SET status = $2 WHERE id = $1 AND status = $3 AND return_date IS NULL",
        )
        .bind(id)
        .bind(BorrowStatus::Overdue)
        .bind(BorrowStatus::Borrowed)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
