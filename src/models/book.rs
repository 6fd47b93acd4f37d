//! Book model, inventory accounting and ratings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

use super::pagination::BookSort;

/// Book from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    /// Mean of all student ratings, 0 when unrated
    pub rating: f64,
    #[serde(rename = "total_copies")]
    pub total_copies: i32,
    #[serde(rename = "available_copies")]
    pub available_copies: i32,
    pub color: String,
    pub description: String,
    pub cover: String,
    pub video: Option<String>,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

impl Book {
    pub fn inventory(&self) -> Inventory {
        Inventory {
            total: self.total_copies,
            available: self.available_copies,
        }
    }

    pub fn not_available_message(&self) -> String {
        format!(
            "{} is not available for borrowing. Check the available copies and try again later.",
            self.title
        )
    }
}

/// Copy counts of a title.
///
/// `0 <= available <= total` always holds; `total - available` is the number
/// of copies currently out on loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inventory {
    pub total: i32,
    pub available: i32,
}

impl Inventory {
    pub fn new(total: i32) -> AppResult<Self> {
        if total < 0 {
            return Err(AppError::Validation(
                "Total copies cannot be negative".to_string(),
            ));
        }
        Ok(Self {
            total,
            available: total,
        })
    }

    pub fn borrowed(&self) -> i32 {
        self.total - self.available
    }

    pub fn is_fully_available(&self) -> bool {
        self.available == self.total
    }

    /// Take one copy off the shelf
    pub fn check_out(self) -> Option<Self> {
        (self.available > 0).then(|| Self {
            available: self.available - 1,
            ..self
        })
    }

    /// Put one copy back on the shelf
    pub fn check_in(self) -> AppResult<Self> {
        if self.available >= self.total {
            return Err(AppError::Conflict(
                "All copies of this book are already on the shelf".to_string(),
            ));
        }
        Ok(Self {
            available: self.available + 1,
            ..self
        })
    }

    /// Change the number of owned copies, keeping loans outstanding
    pub fn resize(self, new_total: i32) -> AppResult<Self> {
        if new_total < 0 {
            return Err(AppError::Validation(
                "Total copies cannot be negative".to_string(),
            ));
        }
        let borrowed = self.borrowed();
        if new_total < borrowed {
            return Err(AppError::BadRequest(format!(
                "Cannot reduce total copies below borrowed count ({})",
                borrowed
            )));
        }
        Ok(Self {
            total: new_total,
            available: new_total - borrowed,
        })
    }
}

/// Mean rating, 0 for an empty slice
pub fn average_rating(ratings: &[i16]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    sum as f64 / ratings.len() as f64
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    #[validate(length(min = 1, message = "Genre is required"))]
    pub genre: String,
    #[validate(range(min = 0, message = "Total copies cannot be negative"))]
    pub total_copies: i32,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover: String,
    pub video: Option<String>,
    #[serde(default)]
    pub summary: String,
}

/// Update book request; replaces every descriptive field
pub type UpdateBook = CreateBook;

/// Rating request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateBook {
    pub book_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,
}

/// Catalog query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Substring of title, author or genre
    pub q: Option<String>,
    /// Exact genre (case-insensitive)
    pub genre: Option<String>,
    pub sort: Option<BookSort>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_inventory_is_fully_available() {
        let inv = Inventory::new(3).unwrap();
        assert_eq!(inv.available, 3);
        assert!(inv.is_fully_available());
        assert!(Inventory::new(-1).is_err());
    }

    #[test]
    fn test_check_out_until_empty() {
        let inv = Inventory { total: 1, available: 1 };
        let inv = inv.check_out().unwrap();
        assert_eq!(inv.available, 0);
        assert_eq!(inv.borrowed(), 1);
        assert!(inv.check_out().is_none());
    }

    #[test]
    fn test_check_in_cannot_exceed_total() {
        let inv = Inventory { total: 2, available: 1 };
        let inv = inv.check_in().unwrap();
        assert!(inv.is_fully_available());
        assert!(matches!(inv.check_in(), Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_resize_keeps_outstanding_loans() {
        let inv = Inventory { total: 5, available: 2 };
        let grown = inv.resize(8).unwrap();
        assert_eq!(grown, Inventory { total: 8, available: 5 });

        let shrunk = inv.resize(3).unwrap();
        assert_eq!(shrunk, Inventory { total: 3, available: 0 });

        match inv.resize(2) {
            Err(AppError::BadRequest(msg)) => {
                assert_eq!(msg, "Cannot reduce total copies below borrowed count (3)")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), 0.0);
        assert_eq!(average_rating(&[4]), 4.0);
        assert!((average_rating(&[5, 4, 4]) - 4.333).abs() < 0.001);
    }
}
