//! Notification e-mails sent on account and borrowing events
//!
//! Delivery is best effort: a failed send is logged and never fails the
//! operation that triggered it.

use std::sync::Arc;

use crate::config::EmailConfig;

use super::email::Mailer;

/// A notification and the values it interpolates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<'a> {
    AccountApproved { name: &'a str },
    AccountDenied { name: &'a str },
    VerificationCode { name: &'a str, code: &'a str },
    Welcome { name: &'a str },
    BorrowConfirmation { name: &'a str, title: &'a str, issue_date: &'a str, due_date: &'a str },
    ReturnConfirmation { name: &'a str, title: &'a str },
    LateReturn { name: &'a str, title: &'a str, due_date: &'a str, return_date: &'a str },
    OverdueReminder { name: &'a str, title: &'a str, due_date: &'a str },
    DueReminder { name: &'a str, title: &'a str, due_date: &'a str },
}

struct Body {
    heading: String,
    paragraphs: Vec<String>,
    cta: Option<(&'static str, &'static str)>,
}

impl Notification<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::AccountApproved { .. } => "account_approved",
            Notification::AccountDenied { .. } => "account_denied",
            Notification::VerificationCode { .. } => "verification_code",
            Notification::Welcome { .. } => "welcome",
            Notification::BorrowConfirmation { .. } => "borrow_confirmation",
            Notification::ReturnConfirmation { .. } => "return_confirmation",
            Notification::LateReturn { .. } => "late_return",
            Notification::OverdueReminder { .. } => "overdue_reminder",
            Notification::DueReminder { .. } => "due_reminder",
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Notification::AccountApproved { .. } => {
                "Your Bookademia Account Has Been Approved!".to_string()
            }
            Notification::AccountDenied { .. } => {
                "Update on Your Bookademia Account Request".to_string()
            }
            Notification::VerificationCode { .. } => "Your Bookademia Verification Code".to_string(),
            Notification::Welcome { .. } => "Welcome to Bookademia!".to_string(),
            Notification::BorrowConfirmation { title, .. } => {
                format!("You've Borrowed \"{}\"", title)
            }
            Notification::ReturnConfirmation { title, .. } => {
                format!("Thank You for Returning \"{}\"", title)
            }
            Notification::LateReturn { title, .. } => {
                format!("Late Return Recorded for \"{}\"", title)
            }
            Notification::OverdueReminder { title, .. } => format!("\"{}\" Is Overdue", title),
            Notification::DueReminder { title, .. } => format!("\"{}\" Is Due Today", title),
        }
    }

    fn body(&self) -> Body {
        match self {
            Notification::AccountApproved { .. } => Body {
                heading: "Your Bookademia Account Has Been Approved!".to_string(),
                paragraphs: vec![
                    "Congratulations! Your Bookademia account has been approved. You can now browse \
                     our library, borrow books, and enjoy all the features of your new account."
                        .to_string(),
                    "Log in to get started:".to_string(),
                ],
                cta: Some(("Log in to Bookademia", "/sign-in")),
            },
            Notification::AccountDenied { .. } => Body {
                heading: "Your Account Request Was Not Approved".to_string(),
                paragraphs: vec![
                    "We could not verify the university ID card submitted with your registration, \
                     so your Bookademia account request has been denied."
                        .to_string(),
                    "If you think this is a mistake, please contact the library staff.".to_string(),
                ],
                cta: None,
            },
            Notification::VerificationCode { code, .. } => Body {
                heading: "Verify Your Email Address".to_string(),
                paragraphs: vec![
                    "Use the following code to verify your email address:".to_string(),
                    format!(
                        "<strong style=\"font-size: 28px; letter-spacing: 6px;\">{}</strong>",
                        escape_html(code)
                    ),
                    "This code expires in 10 minutes. If you did not request it, you can ignore \
                     this email."
                        .to_string(),
                ],
                cta: None,
            },
            Notification::Welcome { .. } => Body {
                heading: "Welcome to Bookademia!".to_string(),
                paragraphs: vec![
                    "Your email address is verified. Once an administrator approves your university \
                     ID card you will be able to borrow books."
                        .to_string(),
                ],
                cta: Some(("Explore the library", "/")),
            },
            Notification::BorrowConfirmation {
                title,
                issue_date,
                due_date,
                ..
            } => Body {
                heading: "You've Borrowed a Book!".to_string(),
                paragraphs: vec![
                    format!(
                        "You've successfully borrowed <strong>{}</strong>.",
                        escape_html(title)
                    ),
                    format!(
                        "Borrowed on: <strong>{}</strong><br/>Due date: <strong>{}</strong>",
                        escape_html(issue_date),
                        escape_html(due_date)
                    ),
                ],
                cta: Some(("View your borrowed books", "/my-profile")),
            },
            Notification::ReturnConfirmation { title, .. } => Body {
                heading: "Thank You for Returning Your Book!".to_string(),
                paragraphs: vec![format!(
                    "We've received your return of <strong>{}</strong>. Thank you for returning it \
                     on time.",
                    escape_html(title)
                )],
                cta: Some(("Explore new books", "/")),
            },
            Notification::LateReturn {
                title,
                due_date,
                return_date,
                ..
            } => Body {
                heading: "Your Book Was Returned Late".to_string(),
                paragraphs: vec![
                    format!(
                        "We've received your return of <strong>{}</strong>, which was past its due \
                         date.",
                        escape_html(title)
                    ),
                    format!(
                        "Due date: <strong>{}</strong><br/>Returned on: <strong>{}</strong>",
                        escape_html(due_date),
                        escape_html(return_date)
                    ),
                    "Please return future loans on time so other students can borrow them."
                        .to_string(),
                ],
                cta: None,
            },
            Notification::OverdueReminder {
                title, due_date, ..
            } => Body {
                heading: "Your Book Is Overdue".to_string(),
                paragraphs: vec![
                    format!(
                        "<strong>{}</strong> was due on <strong>{}</strong> and has not been \
                         returned yet.",
                        escape_html(title),
                        escape_html(due_date)
                    ),
                    "Please return it to the library as soon as possible.".to_string(),
                ],
                cta: Some(("View your borrowed books", "/my-profile")),
            },
            Notification::DueReminder {
                title, due_date, ..
            } => Body {
                heading: "Your Book Is Due Today".to_string(),
                paragraphs: vec![format!(
                    "Just a reminder: <strong>{}</strong> is due today, <strong>{}</strong>. \
                     Please return it by the end of the day to avoid a late return.",
                    escape_html(title),
                    escape_html(due_date)
                )],
                cta: Some(("View your borrowed books", "/my-profile")),
            },
        }
    }

    fn name(&self) -> &str {
        match self {
            Notification::AccountApproved { name }
            | Notification::AccountDenied { name }
            | Notification::VerificationCode { name, .. }
            | Notification::Welcome { name }
            | Notification::BorrowConfirmation { name, .. }
            | Notification::ReturnConfirmation { name, .. }
            | Notification::LateReturn { name, .. }
            | Notification::OverdueReminder { name, .. }
            | Notification::DueReminder { name, .. } => name,
        }
    }

    /// Full HTML document in the shared layout
    pub fn render(&self, config: &EmailConfig) -> String {
        let body = self.body();
        let paragraphs: String = body
            .paragraphs
            .iter()
            .map(|p| format!("<p style=\"margin-top: 20px;\">{}</p>", p))
            .collect();
        let cta = body
            .cta
            .map(|(label, path)| {
                format!(
                    "<a href=\"{}{}\" style=\"display: inline-block; margin-top: 10px; padding: 12px 24px; \
                     background-color: #EED1AC; color: #16191E; text-decoration: none; \
                     font-weight: bold; border-radius: 6px;\">{}</a>",
                    config.frontend_url.trim_end_matches('/'),
                    path,
                    label
                )
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html>
  <head><meta charset="UTF-8" /><title>{subject}</title></head>
  <body style="margin: 0; padding: 0; background-color: #111624; background-image: url('{bg}'); font-family: Arial, sans-serif;">
    <div style="max-width: 600px; margin: 40px auto; padding: 40px; background-color: #16191E; border-radius: 10px;">
      <img src="{logo}" alt="Bookademia" style="height: 40px;" />
      <hr style="border: 0; border-top: 1px solid #2e2e2e;" />
      <h2 style="margin-bottom: 20px; font-size: 24px; color: white; font-weight: 600;">{heading}</h2>
      <div style="color: #D6E0FF; font-size: 16px;">
        <p style="margin: 0;">Hi {name},</p>
        {paragraphs}
        {cta}
        <p style="margin-top: 30px;">Happy reading,</p>
        <p>The Bookademia Team</p>
      </div>
    </div>
  </body>
</html>"#,
            subject = escape_html(&self.subject()),
            bg = config.bg_url,
            logo = config.logo_url,
            heading = body.heading,
            name = escape_html(self.name()),
            paragraphs = paragraphs,
            cta = cta,
        )
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Clone)]
pub struct NotificationService {
    mailer: Arc<dyn Mailer>,
    config: EmailConfig,
}

impl NotificationService {
    pub fn new(mailer: Arc<dyn Mailer>, config: EmailConfig) -> Self {
        Self { mailer, config }
    }

    /// Render and send; returns whether the mail went out
    pub async fn notify(&self, to: &str, notification: Notification<'_>) -> bool {
        let html = notification.render(&self.config);
        match self
            .mailer
            .send(to, &notification.subject(), &html)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    to = %to,
                    kind = notification.kind(),
                    "Notification not sent: {}",
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::AppError, services::email::MockMailer};
    use mockall::predicate::eq;

    fn config() -> EmailConfig {
        EmailConfig {
            frontend_url: "https://app.bookademia.test/".to_string(),
            logo_url: "https://cdn.test/logo.png".to_string(),
            bg_url: "https://cdn.test/bg.png".to_string(),
            ..EmailConfig::default()
        }
    }

    #[test]
    fn test_layout_uses_configured_assets() {
        let html = Notification::AccountApproved { name: "Ada" }.render(&config());
        assert!(html.contains("https://cdn.test/logo.png"));
        assert!(html.contains("https://cdn.test/bg.png"));
        assert!(html.contains("href=\"https://app.bookademia.test/sign-in\""));
        assert!(html.contains("Hi Ada,"));
    }

    #[test]
    fn test_borrow_confirmation_carries_dates() {
        let notification = Notification::BorrowConfirmation {
            name: "Ada",
            title: "Dune",
            issue_date: "01 March, 2025",
            due_date: "15 March, 2025",
        };
        let html = notification.render(&config());
        assert_eq!(notification.subject(), "You've Borrowed \"Dune\"");
        assert!(html.contains("01 March, 2025"));
        assert!(html.contains("15 March, 2025"));
    }

    #[test]
    fn test_user_values_are_escaped() {
        let html = Notification::ReturnConfirmation {
            name: "<script>",
            title: "Tom & Jerry",
        }
        .render(&config());
        assert!(html.contains("Hi &lt;script&gt;,"));
        assert!(html.contains("Tom &amp; Jerry"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_verification_code_has_no_link() {
        let html = Notification::VerificationCode {
            name: "Ada",
            code: "123456",
        }
        .render(&config());
        assert!(html.contains("123456"));
        assert!(!html.contains("<a href"));
    }

    #[tokio::test]
    async fn test_notify_sends_rendered_mail() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .with(
                eq("ada@uni.edu"),
                eq("\"Dune\" Is Due Today"),
                mockall::predicate::function(|html: &str| html.contains("Dune")),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));

        let service = NotificationService::new(Arc::new(mailer), config());
        let sent = service
            .notify(
                "ada@uni.edu",
                Notification::DueReminder {
                    name: "Ada",
                    title: "Dune",
                    due_date: "15 March, 2025",
                },
            )
            .await;
        assert!(sent);
    }

    #[tokio::test]
    async fn test_notify_swallows_transport_errors() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_, _, _| Err(AppError::Internal("smtp down".to_string())));

        let service = NotificationService::new(Arc::new(mailer), config());
        let sent = service
            .notify("ada@uni.edu", Notification::Welcome { name: "Ada" })
            .await;
        assert!(!sent);
    }
}
