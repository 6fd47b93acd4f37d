//! Status and role enumerations shared across models
//!
//! Statuses are stored as TEXT using the same labels the web client displays.

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

/// Implements TEXT (de)serialization for a label enum with `as_str`/`FromStr`
macro_rules! impl_text_column {
    ($ty:ty) => {
        impl sqlx::Type<Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Authorization tier of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification state of a student account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AccountStatus {
    #[serde(rename = "Verification Pending")]
    VerificationPending,
    Verified,
    Denied,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::VerificationPending => "Verification Pending",
            AccountStatus::Verified => "Verified",
            AccountStatus::Denied => "Denied",
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Verification Pending" => Ok(AccountStatus::VerificationPending),
            "Verified" => Ok(AccountStatus::Verified),
            "Denied" => Ok(AccountStatus::Denied),
            _ => Err(format!("Invalid account status: {}", s)),
        }
    }
}

impl_text_column!(AccountStatus);

/// Borrow request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum BorrowStatus {
    Pending,
    Borrowed,
    Returned,
    #[serde(rename = "Late Return")]
    LateReturn,
    Overdue,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Pending => "Pending",
            BorrowStatus::Borrowed => "Borrowed",
            BorrowStatus::Returned => "Returned",
            BorrowStatus::LateReturn => "Late Return",
            BorrowStatus::Overdue => "Overdue",
        }
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(BorrowStatus::Pending),
            "Borrowed" => Ok(BorrowStatus::Borrowed),
            "Returned" => Ok(BorrowStatus::Returned),
            "Late Return" => Ok(BorrowStatus::LateReturn),
            "Overdue" => Ok(BorrowStatus::Overdue),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

impl_text_column!(BorrowStatus);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip_through_from_str() {
        for status in [
            BorrowStatus::Pending,
            BorrowStatus::Borrowed,
            BorrowStatus::Returned,
            BorrowStatus::LateReturn,
            BorrowStatus::Overdue,
        ] {
            assert_eq!(status.as_str().parse::<BorrowStatus>(), Ok(status));
        }
        assert!("Approved".parse::<BorrowStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_display_labels() {
        let json = serde_json::to_string(&AccountStatus::VerificationPending).unwrap();
        assert_eq!(json, "\"Verification Pending\"");

        let status: BorrowStatus = serde_json::from_str("\"Late Return\"").unwrap();
        assert_eq!(status, BorrowStatus::LateReturn);

        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }
}
