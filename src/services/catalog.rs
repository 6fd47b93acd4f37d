//! Catalog service for book management

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookQuery, CreateBook, RateBook, UpdateBook},
        pagination::PageRequest,
        session::SessionData,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list_all().await
    }

    /// Search books with pagination
    pub async fn search_books(&self, query: &BookQuery, page: PageRequest) -> AppResult<(Vec<Book>, i64)> {
        self.repository.books.search(query, page).await
    }

    /// Keyword match over title, author and genre
    pub async fn search_keyword(&self, keyword: &str) -> AppResult<Vec<Book>> {
        if keyword.trim().is_empty() {
            return self.list_all().await;
        }
        self.repository.books.search_keyword(keyword).await
    }

    pub async fn get_book(&self, id: Uuid) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()?;
        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = %created.id, title = %created.title, "Book created");
        Ok(created)
    }

    pub async fn update_book(&self, id: Uuid, book: UpdateBook) -> AppResult<Book> {
        book.validate()?;
        let updated = self.repository.books.update(id, &book).await?;
        tracing::info!(
            book_id = %id,
            total = updated.total_copies,
            available = updated.available_copies,
            "Book updated"
        );
        Ok(updated)
    }

    pub async fn delete_book(&self, id: Uuid) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }

    /// Add the session student's rating
    pub async fn rate_book(&self, session: &SessionData, rating: RateBook) -> AppResult<Book> {
        session.require_student()?;
        rating.validate()?;
        self.repository
            .books
            .rate(rating.book_id, session.user_id, rating.rating)
            .await
    }
}
