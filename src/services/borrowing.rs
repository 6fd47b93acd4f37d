//! Borrow request lifecycle service

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    config::BorrowingConfig,
    error::{AppError, AppResult},
    models::{
        borrow_request::{
            due_action, format_mail_date, BorrowRequest, BorrowRequestQuery, DueAction,
            NewBorrowRequest,
        },
        enums::BorrowStatus,
        pagination::PageRequest,
        session::SessionData,
    },
    repository::Repository,
};

use super::notifications::{Notification, NotificationService};

/// Outcome of one overdue sweep
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub marked_overdue: usize,
    pub reminders_sent: usize,
    /// Loans that could not be updated
    pub failures: usize,
}

impl SweepReport {
    /// Count the outcome of flagging one loan; true when its reminder should go out
    fn record_mark(&mut self, id: Uuid, marked: AppResult<bool>) -> bool {
        match marked {
            Ok(true) => {
                self.marked_overdue += 1;
                tracing::info!(request_id = %id, "Loan marked overdue");
                true
            }
            // Returned or changed since it was listed
            Ok(false) => false,
            Err(e) => {
                self.failures += 1;
                tracing::error!(request_id = %id, "Failed to mark loan overdue: {}", e);
                false
            }
        }
    }
}

#[derive(Clone)]
pub struct BorrowingService {
    repository: Repository,
    notifications: NotificationService,
    loan_duration_days: i64,
}

impl BorrowingService {
    pub fn new(
        repository: Repository,
        notifications: NotificationService,
        config: &BorrowingConfig,
    ) -> Self {
        Self {
            repository,
            notifications,
            loan_duration_days: config.loan_duration_days,
        }
    }

    /// File a Pending request for the session student
    pub async fn create(&self, session: &SessionData, book_id: Uuid) -> AppResult<BorrowRequest> {
        session.require_student()?;

        let book = self.repository.books.get_by_id(book_id).await?;
        if book.inventory().check_out().is_none() {
            return Err(AppError::Conflict(book.not_available_message()));
        }

        let student = self.repository.students.get_by_id(session.user_id).await?;
        if !student.can_borrow() {
            return Err(AppError::Authorization(format!(
                "Your account must be verified before borrowing (current status: {})",
                student.account_status
            )));
        }

        if self
            .repository
            .borrow_requests
            .has_active(student.id, book.id)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "You already have an active request for {}",
                book.title
            )));
        }

        let request = self
            .repository
            .borrow_requests
            .create(&NewBorrowRequest {
                book_id: book.id,
                book_title: book.title,
                book_author: book.author,
                book_cover: book.cover,
                book_color: book.color,
                student_id: student.id,
                student_full_name: student.full_name,
                student_email: student.email,
            })
            .await?;

        tracing::info!(
            request_id = %request.id,
            book_id = %request.book_id,
            email = %request.student_email,
            "Borrow request created"
        );
        Ok(request)
    }

    /// Most recent request of the session student for a book
    pub async fn check_status(
        &self,
        session: &SessionData,
        book_id: Uuid,
    ) -> AppResult<Option<BorrowRequest>> {
        session.require_student()?;
        self.repository
            .borrow_requests
            .latest_for(session.user_id, book_id)
            .await
    }

    pub async fn my_requests(&self, session: &SessionData) -> AppResult<Vec<BorrowRequest>> {
        self.repository
            .borrow_requests
            .list_for_student(session.user_id)
            .await
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BorrowRequest> {
        self.repository.borrow_requests.get_by_id(id).await
    }

    pub async fn list_all(&self) -> AppResult<Vec<BorrowRequest>> {
        self.repository.borrow_requests.list_all().await
    }

    pub async fn search(
        &self,
        query: &BorrowRequestQuery,
        page: PageRequest,
    ) -> AppResult<(Vec<BorrowRequest>, i64)> {
        self.repository.borrow_requests.search(query, page).await
    }

    /// Lend the book and mail the confirmation
    pub async fn approve(&self, id: Uuid) -> AppResult<BorrowRequest> {
        let request = self
            .repository
            .borrow_requests
            .approve(id, self.loan_duration_days)
            .await?;

        tracing::info!(
            request_id = %request.id,
            book_id = %request.book_id,
            email = %request.student_email,
            "Borrow request approved"
        );

        if let (Some(issued), Some(due)) = (request.issue_date, request.due_date) {
            let issue_date = format_mail_date(issued);
            let due_date = format_mail_date(due);
            self.notifications
                .notify(
                    &request.student_email,
                    Notification::BorrowConfirmation {
                        name: &request.student_full_name,
                        title: &request.book_title,
                        issue_date: &issue_date,
                        due_date: &due_date,
                    },
                )
                .await;
        }
        Ok(request)
    }

    /// Take the book back and mail a return or late-return notice
    pub async fn return_book(&self, id: Uuid) -> AppResult<BorrowRequest> {
        let request = self.repository.borrow_requests.return_book(id).await?;

        tracing::info!(
            request_id = %request.id,
            book_id = %request.book_id,
            status = %request.status,
            "Book returned"
        );

        match (request.status, request.due_date, request.return_date) {
            (BorrowStatus::LateReturn, Some(due), Some(returned)) => {
                let due_date = format_mail_date(due);
                let return_date = format_mail_date(returned);
                self.notifications
                    .notify(
                        &request.student_email,
                        Notification::LateReturn {
                            name: &request.student_full_name,
                            title: &request.book_title,
                            due_date: &due_date,
                            return_date: &return_date,
                        },
                    )
                    .await;
            }
            _ => {
                self.notifications
                    .notify(
                        &request.student_email,
                        Notification::ReturnConfirmation {
                            name: &request.student_full_name,
                            title: &request.book_title,
                        },
                    )
                    .await;
            }
        }
        Ok(request)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.borrow_requests.delete(id).await?;
        tracing::info!(request_id = %id, "Borrow request deleted");
        Ok(())
    }

    /// Flag loans past their due day and remind students whose loan is due today.
    ///
    /// A loan that cannot be updated is logged and skipped; the rest of the
    /// sweep still runs.
    pub async fn sweep_overdue(&self, today: NaiveDate) -> AppResult<SweepReport> {
        let loans = self
            .repository
            .borrow_requests
            .open_loans_due_by(today)
            .await?;

        let mut report = SweepReport::default();
        for loan in loans {
            let action = due_action(&loan, today);
            if action == DueAction::MarkOverdue {
                let marked = self.repository.borrow_requests.mark_overdue(loan.id).await;
                if !report.record_mark(loan.id, marked) {
                    continue;
                }
            }

            if send_reminder(&self.notifications, &loan, action).await {
                report.reminders_sent += 1;
            }
        }

        Ok(report)
    }
}

/// Reminder mail matching a sweep decision, if any
pub fn reminder<'a>(
    loan: &'a BorrowRequest,
    action: DueAction,
    due_date: &'a str,
) -> Option<Notification<'a>> {
    match action {
        DueAction::MarkOverdue => Some(Notification::OverdueReminder {
            name: &loan.student_full_name,
            title: &loan.book_title,
            due_date,
        }),
        DueAction::RemindDueToday => Some(Notification::DueReminder {
            name: &loan.student_full_name,
            title: &loan.book_title,
            due_date,
        }),
        DueAction::None => None,
    }
}

/// Mail the reminder for `action`; returns whether one went out
async fn send_reminder(
    notifications: &NotificationService,
    loan: &BorrowRequest,
    action: DueAction,
) -> bool {
    let Some(due) = loan.due_date else {
        return false;
    };
    let due_date = format_mail_date(due);
    match reminder(loan, action, &due_date) {
        Some(notification) => notifications.notify(&loan.student_email, notification).await,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use mockall::predicate::{always, eq};

    use super::*;
    use crate::{config::EmailConfig, services::email::MockMailer};

    fn loan(status: BorrowStatus) -> BorrowRequest {
        let issued = Utc::now() - Duration::days(20);
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
            request_date: issued,
            issue_date: Some(issued),
            due_date: Some(issued + Duration::days(14)),
            return_date: None,
        }
    }

    fn service(mailer: MockMailer) -> NotificationService {
        NotificationService::new(Arc::new(mailer), EmailConfig::default())
    }

    #[test]
    fn test_failed_mark_is_counted_and_skipped() {
        let mut report = SweepReport::default();

        assert!(report.record_mark(Uuid::new_v4(), Ok(true)));
        assert!(!report.record_mark(Uuid::new_v4(), Ok(false)));
        assert!(!report.record_mark(
            Uuid::new_v4(),
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        ));
        // Later loans are still processed
        assert!(report.record_mark(Uuid::new_v4(), Ok(true)));

        assert_eq!(
            report,
            SweepReport {
                marked_overdue: 2,
                reminders_sent: 0,
                failures: 1,
            }
        );
    }

    #[test]
    fn test_reminder_matches_action() {
        let loan = loan(BorrowStatus::Borrowed);
        assert!(matches!(
            reminder(&loan, DueAction::MarkOverdue, "01 March, 2025"),
            Some(Notification::OverdueReminder { title: "Dune", .. })
        ));
        assert!(matches!(
            reminder(&loan, DueAction::RemindDueToday, "01 March, 2025"),
            Some(Notification::DueReminder { name: "Ada Student", .. })
        ));
        assert_eq!(reminder(&loan, DueAction::None, "01 March, 2025"), None);
    }

    #[tokio::test]
    async fn test_overdue_loan_gets_overdue_mail() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .with(eq("ada@uni.edu"), eq("\"Dune\" Is Overdue"), always())
            .times(1)
            .returning(|_, _, _| Ok(()));

        let loan = loan(BorrowStatus::Borrowed);
        assert!(send_reminder(&service(mailer), &loan, DueAction::MarkOverdue).await);
    }

    #[tokio::test]
    async fn test_due_today_loan_gets_due_mail() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .with(eq("ada@uni.edu"), eq("\"Dune\" Is Due Today"), always())
            .times(1)
            .returning(|_, _, _| Ok(()));

        let loan = loan(BorrowStatus::Borrowed);
        assert!(send_reminder(&service(mailer), &loan, DueAction::RemindDueToday).await);
    }

    #[tokio::test]
    async fn test_no_action_sends_nothing() {
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(0);

        let loan = loan(BorrowStatus::Borrowed);
        assert!(!send_reminder(&service(mailer), &loan, DueAction::None).await);
    }

    #[tokio::test]
    async fn test_failed_mail_is_not_counted() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_, _, _| Err(AppError::Internal("smtp down".to_string())));

        let loan = loan(BorrowStatus::Borrowed);
        assert!(!send_reminder(&service(mailer), &loan, DueAction::MarkOverdue).await);
    }

    #[tokio::test]
    async fn test_loan_without_due_date_is_skipped() {
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(0);

        let mut loan = loan(BorrowStatus::Borrowed);
        loan.due_date = None;
        assert!(!send_reminder(&service(mailer), &loan, DueAction::MarkOverdue).await);
    }
}
