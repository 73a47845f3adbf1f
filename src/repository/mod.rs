//! Repository layer: the persistent store behind the services.
//!
//! Every service operation opens one [`UnitOfWork`] with [`Store::begin`],
//! reads and writes through it, and calls [`UnitOfWork::commit`]. A unit of
//! work dropped without commit is rolled back. Rows read through
//! `find_transaction` and `find_copy` stay locked until the unit of work ends,
//! so two operations racing on the same copy are serialized.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Book, BookCopy, Category, Clerk, ClerkDetails, CopyDetails, DashboardStats, Request,
        ReturnRecord, StaffAccount, Transaction, TransactionDetails, User,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared handle to the store, passed explicitly into every service
pub type Repository = Arc<dyn Store>;

/// Transaction listings used by the lifecycle queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanFilter {
    /// Pending requests, oldest request first
    Pending,
    /// Issued loans and approved loans without a return
    Active,
    /// One borrower's issued loans without a return, most recently issued first
    ActiveForUser(Uuid),
}

/// Entry point of the persistent store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Open an atomic unit of work
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}

/// Reads and writes that commit or roll back together
#[async_trait]
pub trait UnitOfWork: Send {
    // Students
    async fn find_user(&mut self, id: Uuid) -> AppResult<Option<User>>;
    /// Student by username or email (case-insensitive)
    async fn find_user_by_login(&mut self, login: &str) -> AppResult<Option<User>>;
    async fn student_exists(&mut self, username: &str, email: &str) -> AppResult<bool>;
    async fn insert_user(&mut self, user: &User) -> AppResult<()>;
    /// Ordered by first name, then last name
    async fn list_students(&mut self) -> AppResult<Vec<User>>;

    // Staff
    async fn find_clerk(&mut self, id: Uuid) -> AppResult<Option<Clerk>>;
    async fn find_staff_by_username(&mut self, username: &str) -> AppResult<Option<(StaffAccount, Clerk)>>;
    async fn staff_username_exists(&mut self, username: &str) -> AppResult<bool>;
    async fn insert_clerk(&mut self, clerk: &Clerk, account: &StaffAccount) -> AppResult<()>;
    /// Ordered by first name
    async fn list_clerks(&mut self) -> AppResult<Vec<ClerkDetails>>;

    // Catalog
    /// Ordered by name
    async fn list_categories(&mut self) -> AppResult<Vec<Category>>;
    async fn find_category(&mut self, id: Uuid) -> AppResult<Option<Category>>;
    async fn find_category_by_name(&mut self, name: &str) -> AppResult<Option<Category>>;
    async fn insert_category(&mut self, category: &Category) -> AppResult<()>;
    async fn find_book(&mut self, id: Uuid) -> AppResult<Option<Book>>;
    async fn find_book_by_isbn(&mut self, isbn: &str) -> AppResult<Option<Book>>;
    async fn insert_book(&mut self, book: &Book) -> AppResult<()>;
    async fn count_copies_of_book(&mut self, book_id: Uuid) -> AppResult<i64>;
    /// Locks the copy row until the unit of work ends
    async fn find_copy(&mut self, id: Uuid) -> AppResult<Option<BookCopy>>;
    async fn insert_copy(&mut self, copy: &BookCopy) -> AppResult<()>;
    async fn update_copy(&mut self, copy: &BookCopy) -> AppResult<()>;
    /// Available copies ordered by book title
    async fn list_available_copies(&mut self) -> AppResult<Vec<CopyDetails>>;

    // Loan lifecycle
    async fn insert_request(&mut self, request: &Request) -> AppResult<()>;
    async fn find_request(&mut self, id: Uuid) -> AppResult<Option<Request>>;
    async fn update_request(&mut self, request: &Request) -> AppResult<()>;
    /// Locks the transaction row until the unit of work ends
    async fn find_transaction(&mut self, id: Uuid) -> AppResult<Option<Transaction>>;
    async fn insert_transaction(&mut self, transaction: &Transaction) -> AppResult<()>;
    async fn update_transaction(&mut self, transaction: &Transaction) -> AppResult<()>;
    async fn find_return(&mut self, transaction_id: Uuid) -> AppResult<Option<ReturnRecord>>;
    async fn insert_return(&mut self, record: &ReturnRecord) -> AppResult<()>;
    async fn transaction_details(&mut self, id: Uuid) -> AppResult<Option<TransactionDetails>>;
    async fn list_transactions(&mut self, filter: LoanFilter) -> AppResult<Vec<TransactionDetails>>;

    // Statistics
    async fn dashboard_stats(&mut self) -> AppResult<DashboardStats>;

    /// Make every write of this unit of work visible at once
    async fn commit(self: Box<Self>) -> AppResult<()>;
}
