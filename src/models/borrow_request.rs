//! Borrow request model and its lifecycle
//!
//! ```text
//! Pending --approve--> Borrowed --return--> Returned | Late Return
//!                         |
//!                      sweep (past due day)
//!                         v
//!                      Overdue --return--> Late Return
//! ```

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::{enums::BorrowStatus, pagination::DateOrder};

/// Borrow request from database, with book and student snapshots
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub id: Uuid,
    pub book_id: Uuid,
    pub book_title: String,
    pub book_author: String,
    pub book_cover: String,
    pub book_color: String,
    pub student_id: Uuid,
    pub student_full_name: String,
    pub student_email: String,
    pub status: BorrowStatus,
    pub request_date: DateTime<Utc>,
    pub issue_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
}

impl BorrowRequest {
    pub fn due_day(&self) -> Option<NaiveDate> {
        self.due_date.map(local_day)
    }
}

impl BorrowStatus {
    /// A copy of the book is with the student
    pub fn holds_copy(&self) -> bool {
        matches!(self, BorrowStatus::Borrowed | BorrowStatus::Overdue)
    }

    /// Request still occupies the student's slot for this title
    pub fn is_active(&self) -> bool {
        matches!(self, BorrowStatus::Pending) || self.holds_copy()
    }

    pub fn approve(self) -> AppResult<BorrowStatus> {
        match self {
            BorrowStatus::Pending => Ok(BorrowStatus::Borrowed),
            other => Err(AppError::Conflict(format!(
                "Only pending requests can be approved (current status: {})",
                other
            ))),
        }
    }

    /// Status after the book comes back on `today`
    pub fn on_return(self, due_day: Option<NaiveDate>, today: NaiveDate) -> AppResult<BorrowStatus> {
        if !self.holds_copy() {
            return Err(AppError::Conflict(format!(
                "Book is not currently borrowed (current status: {})",
                self
            )));
        }
        let late = self == BorrowStatus::Overdue || due_day.is_some_and(|due| today > due);
        Ok(if late {
            BorrowStatus::LateReturn
        } else {
            BorrowStatus::Returned
        })
    }

    pub fn ensure_deletable(self) -> AppResult<()> {
        if self.holds_copy() {
            return Err(AppError::Conflict(
                "Cannot delete a request whose book has not been returned".to_string(),
            ));
        }
        Ok(())
    }
}

/// What the daily sweep does with a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueAction {
    None,
    RemindDueToday,
    MarkOverdue,
}

/// Only open `Borrowed` loans are considered; day comparison ignores time.
pub fn due_action(request: &BorrowRequest, today: NaiveDate) -> DueAction {
    if request.status != BorrowStatus::Borrowed || request.return_date.is_some() {
        return DueAction::None;
    }
    match request.due_day() {
        Some(due) if today > due => DueAction::MarkOverdue,
        Some(due) if today == due => DueAction::RemindDueToday,
        _ => DueAction::None,
    }
}

pub fn due_date_from(issued: DateTime<Utc>, loan_duration_days: i64) -> DateTime<Utc> {
    issued + Duration::days(loan_duration_days)
}

/// Calendar day in the server's time zone
pub fn local_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

/// Notification date format ("05 March, 2025")
pub fn format_mail_date(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%d %B, %Y").to_string()
}

/// Create request body; student details come from the session
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBorrowRequest {
    pub book_id: Uuid,
}

/// Status lookup body
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowStatusQuery {
    pub book_id: Uuid,
}

/// Snapshot values written when a request is created
#[derive(Debug)]
pub struct NewBorrowRequest {
    pub book_id: Uuid,
    pub book_title: String,
    pub book_author: String,
    pub book_cover: String,
    pub book_color: String,
    pub student_id: Uuid,
    pub student_full_name: String,
    pub student_email: String,
}

/// Admin queue filter
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BorrowRequestQuery {
    /// Substring of book title, student name or e-mail
    pub q: Option<String>,
    pub status: Option<BorrowStatus>,
    /// Request date order
    pub order: Option<DateOrder>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(status: BorrowStatus, due: Option<DateTime<Utc>>) -> BorrowRequest {
        BorrowRequest {
            id: Uuid::new_v4(),
            book_id: Uuid::new_v4(),
            book_title: "Dune".into(),
            book_author: "Frank Herbert".into(),
            book_cover: String::new(),
            book_color: "#c4a35a".into(),
            student_id: Uuid::new_v4(),
            student_full_name: "Ada Student".into(),
            student_email: "ada@uni.edu".into(),
            status,
            request_date: Utc::now(),
            issue_date: None,
            due_date: due,
            return_date: None,
        }
    }

    fn local_noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(y, m, d, 12, 0, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_only_pending_can_be_approved() {
        assert_eq!(BorrowStatus::Pending.approve().unwrap(), BorrowStatus::Borrowed);
        for status in [
            BorrowStatus::Borrowed,
            BorrowStatus::Overdue,
            BorrowStatus::Returned,
            BorrowStatus::LateReturn,
        ] {
            assert!(matches!(status.approve(), Err(AppError::Conflict(_))));
        }
    }

    #[test]
    fn test_return_on_or_before_due_day() {
        let due = Some(day(2025, 3, 10));
        assert_eq!(
            BorrowStatus::Borrowed.on_return(due, day(2025, 3, 10)).unwrap(),
            BorrowStatus::Returned
        );
        assert_eq!(
            BorrowStatus::Borrowed.on_return(due, day(2025, 3, 1)).unwrap(),
            BorrowStatus::Returned
        );
    }

    #[test]
    fn test_return_after_due_day_is_late() {
        let due = Some(day(2025, 3, 10));
        assert_eq!(
            BorrowStatus::Borrowed.on_return(due, day(2025, 3, 11)).unwrap(),
            BorrowStatus::LateReturn
        );
        assert_eq!(
            BorrowStatus::Overdue.on_return(due, day(2025, 3, 10)).unwrap(),
            BorrowStatus::LateReturn
        );
    }

    #[test]
    fn test_cannot_return_what_was_never_lent() {
        assert!(BorrowStatus::Pending.on_return(None, day(2025, 1, 1)).is_err());
        assert!(BorrowStatus::Returned.on_return(None, day(2025, 1, 1)).is_err());
    }

    #[test]
    fn test_deletion_rules() {
        assert!(BorrowStatus::Pending.ensure_deletable().is_ok());
        assert!(BorrowStatus::LateReturn.ensure_deletable().is_ok());
        assert!(BorrowStatus::Borrowed.ensure_deletable().is_err());
        assert!(BorrowStatus::Overdue.ensure_deletable().is_err());
    }

    #[test]
    fn test_active_statuses() {
        assert!(BorrowStatus::Pending.is_active());
        assert!(BorrowStatus::Overdue.is_active());
        assert!(!BorrowStatus::Returned.is_active());
    }

    #[test]
    fn test_due_action() {
        let loan = request(BorrowStatus::Borrowed, Some(local_noon(2025, 3, 10)));
        assert_eq!(due_action(&loan, day(2025, 3, 9)), DueAction::None);
        assert_eq!(due_action(&loan, day(2025, 3, 10)), DueAction::RemindDueToday);
        assert_eq!(due_action(&loan, day(2025, 3, 11)), DueAction::MarkOverdue);

        let pending = request(BorrowStatus::Pending, None);
        assert_eq!(due_action(&pending, day(2025, 3, 11)), DueAction::None);

        let already = request(BorrowStatus::Overdue, Some(local_noon(2025, 3, 10)));
        assert_eq!(due_action(&already, day(2025, 3, 20)), DueAction::None);
    }

    #[test]
    fn test_due_date_and_formatting() {
        let issued = local_noon(2025, 3, 1);
        let due = due_date_from(issued, 14);
        assert_eq!(local_day(due), day(2025, 3, 15));
        assert_eq!(format_mail_date(due), "15 March, 2025");
    }
}
