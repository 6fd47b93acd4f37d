//! Daily overdue sweep at local midnight

use chrono::{Duration, Local, NaiveDateTime};
use tokio::task::JoinHandle;

use super::borrowing::BorrowingService;

/// Time left until the next midnight after `now` (never zero)
pub fn until_next_midnight(now: NaiveDateTime) -> Duration {
    let next_midnight = now
        .date()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .unwrap_or(now + Duration::days(1));
    next_midnight - now
}

/// Run the sweep forever in the background
pub fn spawn_overdue_sweep(borrowing: BorrowingService) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let wait = until_next_midnight(Local::now().naive_local());
            tracing::debug!(seconds = wait.num_seconds(), "Next overdue sweep scheduled");
            tokio::time::sleep(wait.to_std().unwrap_or(std::time::Duration::from_secs(60))).await;

            let today = Local::now().date_naive();
            match borrowing.sweep_overdue(today).await {
                Ok(report) => tracing::info!(
                    %today,
                    marked_overdue = report.marked_overdue,
                    reminders_sent = report.reminders_sent,
                    failures = report.failures,
                    "Overdue sweep finished"
                ),
                Err(e) => tracing::error!(%today, "Overdue sweep failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_until_next_midnight() {
        assert_eq!(until_next_midnight(at(23, 0, 0)), Duration::hours(1));
        assert_eq!(until_next_midnight(at(12, 30, 0)), Duration::minutes(11 * 60 + 30));
    }

    #[test]
    fn test_exactly_midnight_waits_a_full_day() {
        assert_eq!(until_next_midnight(at(0, 0, 0)), Duration::days(1));
    }
}
