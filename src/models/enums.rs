//! Shared domain enums, stored as lowercase text columns

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

/// Generates the string conversions and the SQLx text codec for a status enum.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($name), s)),
                }
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<Postgres>>::compatible(ty)
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as Encode<Postgres>>::encode(self.as_str(), buf)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// BookCopyStatus
// ---------------------------------------------------------------------------

/// Physical state of a book copy. Only the loan lifecycle moves a copy
/// between `Available` and `Borrowed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookCopyStatus {
    #[default]
    Available,
    Borrowed,
    Lost,
    Damaged,
}

text_enum!(BookCopyStatus {
    Available => "available",
    Borrowed => "borrowed",
    Lost => "lost",
    Damaged => "damaged",
});

// ---------------------------------------------------------------------------
// TransactionStatus
// ---------------------------------------------------------------------------

/// Borrow transaction status.
///
/// `Approved` and `Overdue` are reserved: no operation produces them, but rows
/// carrying them still decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Approved,
    Issued,
    Returned,
    Overdue,
    Rejected,
}

text_enum!(TransactionStatus {
    Pending => "pending",
    Approved => "approved",
    Issued => "issued",
    Returned => "returned",
    Overdue => "overdue",
    Rejected => "rejected",
});

// ---------------------------------------------------------------------------
// RequestStatus
// ---------------------------------------------------------------------------

/// Status of the borrower request paired with a transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

text_enum!(RequestStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

// ---------------------------------------------------------------------------
// RequestType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    #[default]
    Borrow,
    Return,
}

text_enum!(RequestType {
    Borrow => "borrow",
    Return => "return",
});

// ---------------------------------------------------------------------------
// UserRole
// ---------------------------------------------------------------------------

/// Role of an authenticated principal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Student,
    Clerk,
    Admin,
}

text_enum!(UserRole {
    Student => "student",
    Clerk => "clerk",
    Admin => "admin",
});

impl UserRole {
    /// Clerks and admins are staff
    pub fn is_staff(&self) -> bool {
        matches!(self, UserRole::Clerk | UserRole::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_parse_case_insensitively() {
        assert_eq!("Issued".parse::<TransactionStatus>(), Ok(TransactionStatus::Issued));
        assert_eq!("BORROWED".parse::<BookCopyStatus>(), Ok(BookCopyStatus::Borrowed));
        assert!("shelved".parse::<BookCopyStatus>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&TransactionStatus::Rejected).unwrap();
        assert_eq!(json, "\"rejected\"");
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
    }

    #[test]
    fn only_clerks_and_admins_are_staff() {
        assert!(!UserRole::Student.is_staff());
        assert!(UserRole::Clerk.is_staff());
        assert!(UserRole::Admin.is_staff());
    }
}
