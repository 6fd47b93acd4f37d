//! Borrow request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        borrow_request::{BorrowRequest, BorrowRequestQuery, BorrowStatusQuery, CreateBorrowRequest},
        pagination::PageRequest,
    },
    AppState,
};

use super::{AdminSession, CurrentSession, MessageResponse, PaginatedResponse, StudentSession};

const DEFAULT_PER_PAGE: i64 = 20;

/// Ask to borrow a book
#[utoipa::path(
    post,
    path = "/borrow-requests/create",
    tag = "borrow-requests",
    request_body = CreateBorrowRequest,
    responses(
        (status = 201, description = "Request filed as Pending", body = BorrowRequest),
        (status = 403, description = "Account not verified", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "No copy available or request already active", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_request(
    State(state): State<AppState>,
    StudentSession(session): StudentSession,
    Json(request): Json<CreateBorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowRequest>)> {
    let created = state
        .services
        .borrowing
        .create(&session, request.book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Latest request of the session student for a book
#[utoipa::path(
    post,
    path = "/borrow-requests/check-status",
    tag = "borrow-requests",
    request_body = BorrowStatusQuery,
    responses(
        (status = 200, description = "Most recent request", body = BorrowRequest),
        (status = 204, description = "No request for this book")
    )
)]
pub async fn check_status(
    State(state): State<AppState>,
    StudentSession(session): StudentSession,
    Json(query): Json<BorrowStatusQuery>,
) -> AppResult<Response> {
    let latest = state
        .services
        .borrowing
        .check_status(&session, query.book_id)
        .await?;
    Ok(match latest {
        Some(request) => Json(request).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// Requests of the session student, most recent first
#[utoipa::path(
    get,
    path = "/borrow-requests/my-borrowed-books",
    tag = "borrow-requests",
    responses(
        (status = 200, description = "The student's requests", body = Vec<BorrowRequest>)
    )
)]
pub async fn my_requests(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> AppResult<Json<Vec<BorrowRequest>>> {
    let requests = state.services.borrowing.my_requests(&session).await?;
    Ok(Json(requests))
}

/// Get borrow request by ID
#[utoipa::path(
    get,
    path = "/borrow-requests/{id}",
    tag = "borrow-requests",
    params(("id" = Uuid, Path, description = "Borrow request ID")),
    responses(
        (status = 200, description = "Borrow request", body = BorrowRequest),
        (status = 404, description = "Borrow request not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_request(
    State(state): State<AppState>,
    CurrentSession(_session): CurrentSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BorrowRequest>> {
    let request = state.services.borrowing.get(id).await?;
    Ok(Json(request))
}

/// Every request, most recent first
#[utoipa::path(
    get,
    path = "/borrow-requests/all-borrow-requests",
    tag = "borrow-requests",
    responses(
        (status = 200, description = "All requests", body = Vec<BorrowRequest>),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_all_requests(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
) -> AppResult<Json<Vec<BorrowRequest>>> {
    let requests = state.services.borrowing.list_all().await?;
    Ok(Json(requests))
}

/// Search requests with pagination
#[utoipa::path(
    get,
    path = "/borrow-requests/list",
    tag = "borrow-requests",
    params(BorrowRequestQuery),
    responses(
        (status = 200, description = "Page of requests", body = PaginatedResponse<BorrowRequest>),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_requests(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Query(query): Query<BorrowRequestQuery>,
) -> AppResult<Json<PaginatedResponse<BorrowRequest>>> {
    let page = PageRequest::new(query.page, query.per_page, DEFAULT_PER_PAGE);
    let (requests, total) = state.services.borrowing.search(&query, page).await?;
    Ok(Json(PaginatedResponse::new(requests, total, page)))
}

/// Lend the book: Pending to Borrowed
#[utoipa::path(
    put,
    path = "/borrow-requests/approve-request/{id}",
    tag = "borrow-requests",
    params(("id" = Uuid, Path, description = "Borrow request ID")),
    responses(
        (status = 200, description = "Request approved", body = BorrowRequest),
        (status = 404, description = "Borrow request not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Not pending or no copy available", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_request(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BorrowRequest>> {
    let request = state.services.borrowing.approve(id).await?;
    Ok(Json(request))
}

/// Take the book back
#[utoipa::path(
    put,
    path = "/borrow-requests/return-book/{id}",
    tag = "borrow-requests",
    params(("id" = Uuid, Path, description = "Borrow request ID")),
    responses(
        (status = 200, description = "Returned or Late Return", body = BorrowRequest),
        (status = 404, description = "Borrow request not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book is not currently borrowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_book(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BorrowRequest>> {
    let request = state.services.borrowing.return_book(id).await?;
    Ok(Json(request))
}

/// Delete a request that holds no copy
#[utoipa::path(
    delete,
    path = "/borrow-requests/delete-request/{id}",
    tag = "borrow-requests",
    params(("id" = Uuid, Path, description = "Borrow request ID")),
    responses(
        (status = 200, description = "Request deleted", body = MessageResponse),
        (status = 404, description = "Borrow request not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Request still holds a copy", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_request(
    State(state): State<AppState>,
    AdminSession(_admin): AdminSession,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state.services.borrowing.delete(id).await?;
    Ok(Json(MessageResponse::ok("Borrow request deleted successfully")))
}
