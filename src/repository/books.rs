//! Books repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{average_rating, Book, BookQuery, CreateBook, Inventory, UpdateBook},
        enums::BorrowStatus,
        pagination::{like_pattern, BookSort, PageRequest},
    },
};

const BOOK_COLUMNS: &str = "id, title, author, genre, rating, total_copies, available_copies, \
     color, description, cover, video, summary, created_at";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book not found with id: {}", id)))
    }

    /// Whole catalog by title
    pub async fn list_all(&self) -> AppResult<Vec<Book>> {
        let query = format!(
            "SELECT {} FROM books ORDER BY {}",
            BOOK_COLUMNS,
            BookSort::Title.as_sql()
        );
        let books = sqlx::query_as::<_, Book>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Books whose title, author or genre contains `keyword`
    pub async fn search_keyword(&self, keyword: &str) -> AppResult<Vec<Book>> {
        let query = format!(
            r#"
            SELECT {} FROM books
            WHERE LOWER(title) LIKE $1 OR LOWER(author) LIKE $1 OR LOWER(genre) LIKE $1
            ORDER BY {}
            "#,
            BOOK_COLUMNS,
            BookSort::Title.as_sql()
        );
        let books = sqlx::query_as::<_, Book>(&query)
            .bind(like_pattern(keyword))
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Search the catalog with pagination
    pub async fn search(&self, query: &BookQuery, page: PageRequest) -> AppResult<(Vec<Book>, i64)> {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(q) = query.q.as_deref().filter(|q| !q.trim().is_empty()) {
            params.push(like_pattern(q));
            let idx = params.len();
            conditions.push(format!(
                "(LOWER(title) LIKE ${idx} OR LOWER(author) LIKE ${idx} OR LOWER(genre) LIKE ${idx})"
            ));
        }

        if let Some(genre) = query.genre.as_deref().filter(|g| !g.trim().is_empty()) {
            params.push(genre.trim().to_lowercase());
            conditions.push(format!("LOWER(genre) = ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_query = format!("SELECT COUNT(*) FROM books {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_builder = count_builder.bind(param);
        }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_query = format!(
            r#"
            SELECT {} FROM books
            {}
            ORDER BY {}
            LIMIT {} OFFSET {}
            "#,
            BOOK_COLUMNS,
            where_clause,
            query.sort.unwrap_or_default().as_sql(),
            page.limit(),
            page.offset()
        );
        let mut select_builder = sqlx::query_as::<_, Book>(&select_query);
        for param in &params {
            select_builder = select_builder.bind(param);
        }
        let books = select_builder.fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    /// Create a new book with every copy on the shelf
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let inventory = Inventory::new(book.total_copies)?;
        let query = format!(
            r#"
            INSERT INTO books (id, title, author, genre, rating, total_copies, available_copies,
                               color, description, cover, video, summary)
            VALUES ($1, $2, $3, $4, 0, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        let created = sqlx::query_as::<_, Book>(&query)
            .bind(Uuid::new_v4())
            .bind(book.title.trim())
            .bind(book.author.trim())
            .bind(book.genre.trim())
            .bind(inventory.total)
            .bind(inventory.available)
            .bind(&book.color)
            .bind(&book.description)
            .bind(&book.cover)
            .bind(&book.video)
            .bind(&book.summary)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    /// Replace descriptive fields and resize the stock
    pub async fn update(&self, id: Uuid, book: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(i32, i32)> = sqlx::query_as(
            "SELECT total_copies, available_copies FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let (total, available) =
            current.ok_or_else(|| AppError::NotFound(format!("Book not found with id: {}", id)))?;

        let inventory = Inventory { total, available }.resize(book.total_copies)?;

        let query = format!(
            r#"
            UPDATE books
            SET title = $2, author = $3, genre = $4, total_copies = $5, available_copies = $6,
                color = $7, description = $8, cover = $9, video = $10, summary = $11
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );
        let updated = sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(book.title.trim())
            .bind(book.author.trim())
            .bind(book.genre.trim())
            .bind(inventory.total)
            .bind(inventory.available)
            .bind(&book.color)
            .bind(&book.description)
            .bind(&book.cover)
            .bind(&book.video)
            .bind(&book.summary)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a book that has no copy out on loan, along with its pending requests
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(i32, i32)> = sqlx::query_as(
            "SELECT total_copies, available_copies FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let (total, available) =
            current.ok_or_else(|| AppError::NotFound(format!("Book not found with id: {}", id)))?;

        if !(Inventory { total, available }).is_fully_available() {
            return Err(AppError::Conflict(
                "Cannot delete book with borrowed copies.".to_string(),
            ));
        }

        sqlx::query("DELETE FROM borrow_requests WHERE book_id = $1 AND status = $2")
            .bind(id)
            .bind(BorrowStatus::Pending)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Record a student's rating and refresh the book's mean
    pub async fn rate(&self, book_id: Uuid, student_id: Uuid, rating: i16) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(book_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!(
                "Book not found with id: {}",
                book_id
            )));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO book_ratings (book_id, student_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT (book_id, student_id) DO NOTHING
            "#,
        )
        .bind(book_id)
        .bind(student_id)
        .bind(rating)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "User has already rated this book".to_string(),
            ));
        }

        let ratings: Vec<i16> =
            sqlx::query_scalar("SELECT rating FROM book_ratings WHERE book_id = $1")
                .bind(book_id)
                .fetch_all(&mut *tx)
                .await?;

        let query = format!(
            "UPDATE books SET rating = $2 WHERE id = $1 RETURNING {}",
            BOOK_COLUMNS
        );
        let book = sqlx::query_as::<_, Book>(&query)
            .bind(book_id)
            .bind(average_rating(&ratings))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(book)
    }
}
