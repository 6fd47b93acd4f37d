//! Data models for Bookademia

pub mod admin;
pub mod book;
pub mod borrow_request;
pub mod enums;
pub mod pagination;
pub mod session;
pub mod student;

// Re-export commonly used types
pub use admin::Admin;
pub use book::{Book, Inventory};
pub use borrow_request::BorrowRequest;
pub use enums::{AccountStatus, BorrowStatus, Role};
pub use pagination::PageRequest;
pub use session::{SessionData, TokenClaims};
pub use student::Student;
