//! Account models: students (borrowers), clerks and their staff accounts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::enums::UserRole;
use crate::error::AppError;

/// Student account (borrower)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub contact_number: String,
    pub address: String,
    pub college: String,
    pub department: String,
    pub username: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, self.middle_name.as_deref(), &self.last_name)
    }
}

/// Staff member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Clerk {
    pub id: Uuid,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub contact_number: String,
}

impl Clerk {
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, self.middle_name.as_deref(), &self.last_name)
    }
}

/// Login credentials of a staff member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StaffAccount {
    pub id: Uuid,
    pub clerk_id: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
}

/// Staff member with account information, for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClerkDetails {
    pub id: Uuid,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub email: String,
    pub contact_number: String,
    pub username: Option<String>,
    pub role: Option<UserRole>,
}

/// Short borrower representation embedded in loan views
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserShort {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
}

impl From<&User> for UserShort {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name(),
            username: user.username.clone(),
        }
    }
}

/// "First Middle Last", skipping a missing or blank middle name
pub fn full_name(first: &str, middle: Option<&str>, last: &str) -> String {
    match middle.map(str::trim).filter(|m| !m.is_empty()) {
        Some(middle) => format!("{} {} {}", first, middle, last),
        None => format!("{} {}", first, last),
    }
}

/// Create student account request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStudent {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    pub contact_number: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub college: String,
    #[serde(default)]
    pub department: String,
    pub username: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
}

/// Create staff account request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStaff {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub contact_number: String,
    pub username: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub password: String,
    pub role: UserRole,
}

/// JWT Claims for authenticated principals (students and staff)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    /// Student id for students, clerk id for staff
    pub user_id: Uuid,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Staff privileges required".to_string()))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == UserRole::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Administrator privileges required".to_string()))
        }
    }

    /// Students may only act on their own records; staff may act on anyone's
    pub fn require_self_or_staff(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.is_staff() || self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden("Cannot act on behalf of another user".to_string()))
        }
    }
}
