//! Student account model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::{enums::AccountStatus, pagination::DateOrder};

/// Columns selected for a [`Student`]; the ID card bytes are fetched separately.
pub const STUDENT_COLUMNS: &str = "id, full_name, email, university_id, password_hash, \
     id_card_name, id_card_type, account_status, registration_date, \
     is_email_verified, no_books_borrowed";

/// Student account from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub university_id: String,
    /// Argon2 hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub id_card_name: Option<String>,
    pub id_card_type: Option<String>,
    pub account_status: AccountStatus,
    pub registration_date: DateTime<Utc>,
    pub is_email_verified: bool,
    /// Copies currently held (Borrowed or Overdue requests)
    pub no_books_borrowed: i32,
}

impl Student {
    pub fn can_borrow(&self) -> bool {
        self.account_status == AccountStatus::Verified
    }
}

/// Uploaded student ID card
#[derive(Debug, Clone, FromRow)]
pub struct IdCard {
    pub id_card: Option<Vec<u8>>,
    pub id_card_name: Option<String>,
    pub id_card_type: Option<String>,
}

impl IdCard {
    pub const FALLBACK_CONTENT_TYPE: &'static str = "image/jpeg";

    pub fn content_type(&self) -> &str {
        self.id_card_type
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(Self::FALLBACK_CONTENT_TYPE)
    }
}

/// Registration payload (the `request` part of the multipart form)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStudent {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "University ID is required"))]
    pub university_id: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// Data required to insert a student
#[derive(Debug)]
pub struct NewStudent {
    pub full_name: String,
    pub email: String,
    pub university_id: String,
    pub password_hash: String,
    pub id_card: Vec<u8>,
    pub id_card_name: Option<String>,
    pub id_card_type: Option<String>,
}

/// Admin-side filter over student accounts
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct StudentQuery {
    /// Substring of name, e-mail or university ID
    pub q: Option<String>,
    pub status: Option<AccountStatus>,
    /// Registration date order
    pub order: Option<DateOrder>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
