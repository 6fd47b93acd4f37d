//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookQuery, CreateBook, RateBook, UpdateBook},
        pagination::PageRequest,
    },
    AppState,
};

use super::{AdminSession, CurrentSession, MessageResponse, PaginatedResponse, StudentSession};

/// Catalog page size used by the web client
const DEFAULT_PER_PAGE: i64 = 7;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookCreatedResponse {
    pub timestamp: DateTime<Utc>,
    pub status: u16,
    pub message: String,
    pub book_id: Uuid,
}

/// Whole catalog sorted by title
#[utoipa::path(
    get,
    path = "/books/allBooks",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>),
        (status = 401, description = "No active session", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_all_books(
    State(state): State<AppState>,
    CurrentSession(_session): CurrentSession,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_all().await?;
    Ok(Json(books))
}

/// Search the catalog with pagination
#[utoipa::path(
    get,
    path = "/books/list",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Page of books", body = PaginatedResponse<Book>)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<PaginatedResponse<Book>>> {
    let page = PageRequest::new(query.page, query.per_page, DEFAULT_PER_PAGE);
    let (books, total) = state.services.catalog.search_books(&query, page).await?;
    Ok(Json(PaginatedResponse::new(books, total, page)))
}

/// Books whose title, author or genre contains the keyword
#[utoipa::path(
    get,
    path = "/books/search/{keyword}",
    tag = "books",
    params(("keyword" = String, Path, description = "Case-insensitive substring")),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>)
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Path(keyword): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.search_keyword(&keyword).await?;
    Ok(Json(books))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{book_id}",
    tag = "books",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(book_id).await?;
    Ok(Json(book))
}

/// Add a title to the catalog
#[utoipa::path(
    post,
    path = "/books/createBook",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = BookCreatedResponse),
        (status = 400, description = "Invalid book", body = crate::error::ErrorResponse),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Json(book): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<BookCreatedResponse>)> {
    let created = state.services.catalog.create_book(book).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookCreatedResponse {
            timestamp: Utc::now(),
            status: StatusCode::CREATED.as_u16(),
            message: "Book created successfully".to_string(),
            book_id: created.id,
        }),
    ))
}

/// Replace a book's fields and resize its stock
#[utoipa::path(
    put,
    path = "/books/{book_id}",
    tag = "books",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = MessageResponse),
        (status = 400, description = "Cannot reduce total copies below borrowed count", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(book_id): Path<Uuid>,
    Json(book): Json<UpdateBook>,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.update_book(book_id, book).await?;
    Ok(Json(MessageResponse::ok("Book updated successfully")))
}

/// Remove a book with no copy on loan
#[utoipa::path(
    delete,
    path = "/books/{book_id}",
    tag = "books",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Cannot delete book with borrowed copies", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(book_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.delete_book(book_id).await?;
    Ok(Json(MessageResponse::ok("Book deleted successfully")))
}

/// Rate a book once (1 to 5)
#[utoipa::path(
    post,
    path = "/books/rating",
    tag = "books",
    request_body = RateBook,
    responses(
        (status = 200, description = "Rating recorded", body = MessageResponse),
        (status = 400, description = "Rating out of range", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "User has already rated this book", body = crate::error::ErrorResponse)
    )
)]
pub async fn rate_book(
    State(state): State<AppState>,
    StudentSession(session): StudentSession,
    Json(rating): Json<RateBook>,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.rate_book(&session, rating).await?;
    Ok(Json(MessageResponse::ok("Book Rating updated successfully")))
}
