//! Bookademia university library server
//!
//! REST JSON API for student and admin accounts, the book catalog and the
//! borrow request lifecycle, backed by PostgreSQL and Redis sessions.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
