//! Repository layer for database operations

pub mod admins;
pub mod books;
pub mod borrow_requests;
pub mod students;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub students: students::StudentsRepository,
    pub admins: admins::AdminsRepository,
    pub books: books::BooksRepository,
    pub borrow_requests: borrow_requests::BorrowRequestsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            students: students::StudentsRepository::new(pool.clone()),
            admins: admins::AdminsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            borrow_requests: borrow_requests::BorrowRequestsRepository::new(pool.clone()),
            pool,
        }
    }
}
