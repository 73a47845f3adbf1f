//! Catalog models: categories, books and their physical copies

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::enums::BookCopyStatus;

/// Book category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Catalog title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub isbn: String,
    pub author: String,
    pub copyright_year: Option<i32>,
    pub summary: Option<String>,
    pub publisher: String,
    pub category_id: Uuid,
}

/// Physical copy of a title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookCopy {
    pub id: Uuid,
    pub book_id: Uuid,
    pub copy_number: i32,
    pub shelf_location: String,
    pub status: BookCopyStatus,
}

impl BookCopy {
    pub fn is_available(&self) -> bool {
        self.status == BookCopyStatus::Available
    }
}

/// Copy with its title and category, for catalog browsing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CopyDetails {
    pub id: Uuid,
    pub book_id: Uuid,
    pub copy_number: i32,
    pub shelf_location: String,
    pub status: BookCopyStatus,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category_name: Option<String>,
}

/// Create category request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub copyright_year: Option<i32>,
    pub summary: Option<String>,
    pub category_id: Uuid,
}

/// Create copy request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateCopy {
    /// Shelf label, e.g. "A-1"
    pub shelf_location: String,
}
