//! PostgreSQL store.
//!
//! A unit of work is a database transaction; lifecycle reads use
//! `SELECT ... FOR UPDATE` so concurrent issues of one copy queue up behind
//! each other and the loser observes the committed status.

mod catalog;
mod loans;
mod stats;
mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{LoanFilter, Store, UnitOfWork};
use crate::{
    error::{AppError, AppResult},
    models::{
        Book, BookCopy, Category, Clerk, ClerkDetails, CopyDetails, DashboardStats, Request,
        ReturnRecord, StaffAccount, Transaction, TransactionDetails, User,
    },
};

/// Store backed by a PostgreSQL connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

/// Unique-constraint violations surface as conflicts, anything else as a database error
pub(crate) fn conflict_on_unique(error: sqlx::Error, message: &str) -> AppError {
    let is_unique = error
        .as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false);

    if is_unique {
        AppError::Conflict(message.to_string())
    } else {
        AppError::Database(error)
    }
}

struct PgUnitOfWork {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_user(&mut self, id: Uuid) -> AppResult<Option<User>> {
        users::find_by_id(&mut self.tx, id).await
    }

    async fn find_user_by_login(&mut self, login: &str) -> AppResult<Option<User>> {
        users::find_by_login(&mut self.tx, login).await
    }

    async fn student_exists(&mut self, username: &str, email: &str) -> AppResult<bool> {
        users::exists(&mut self.tx, username, email).await
    }

    async fn insert_user(&mut self, user: &User) -> AppResult<()> {
        users::insert(&mut self.tx, user).await
    }

    async fn list_students(&mut self) -> AppResult<Vec<User>> {
        users::list_students(&mut self.tx).await
    }

    async fn find_clerk(&mut self, id: Uuid) -> AppResult<Option<Clerk>> {
        users::find_clerk(&mut self.tx, id).await
    }

    async fn find_staff_by_username(&mut self, username: &str) -> AppResult<Option<(StaffAccount, Clerk)>> {
        users::find_staff_by_username(&mut self.tx, username).await
    }

    async fn staff_username_exists(&mut self, username: &str) -> AppResult<bool> {
        users::staff_username_exists(&mut self.tx, username).await
    }

    async fn insert_clerk(&mut self, clerk: &Clerk, account: &StaffAccount) -> AppResult<()> {
        users::insert_clerk(&mut self.tx, clerk, account).await
    }

    async fn list_clerks(&mut self) -> AppResult<Vec<ClerkDetails>> {
        users::list_clerks(&mut self.tx).await
    }

    async fn list_categories(&mut self) -> AppResult<Vec<Category>> {
        catalog::list_categories(&mut self.tx).await
    }

    async fn find_category(&mut self, id: Uuid) -> AppResult<Option<Category>> {
        catalog::find_category(&mut self.tx, id).await
    }

    async fn find_category_by_name(&mut self, name: &str) -> AppResult<Option<Category>> {
        catalog::find_category_by_name(&mut self.tx, name).await
    }

    async fn insert_category(&mut self, category: &Category) -> AppResult<()> {
        catalog::insert_category(&mut self.tx, category).await
    }

    async fn find_book(&mut self, id: Uuid) -> AppResult<Option<Book>> {
        catalog::find_book(&mut self.tx, id).await
    }

    async fn find_book_by_isbn(&mut self, isbn: &str) -> AppResult<Option<Book>> {
        catalog::find_book_by_isbn(&mut self.tx, isbn).await
    }

    async fn insert_book(&mut self, book: &Book) -> AppResult<()> {
        catalog::insert_book(&mut self.tx, book).await
    }

    async fn count_copies_of_book(&mut self, book_id: Uuid) -> AppResult<i64> {
        catalog::count_copies_of_book(&mut self.tx, book_id).await
    }

    async fn find_copy(&mut self, id: Uuid) -> AppResult<Option<BookCopy>> {
        catalog::find_copy_for_update(&mut self.tx, id).await
    }

    async fn insert_copy(&mut self, copy: &BookCopy) -> AppResult<()> {
        catalog::insert_copy(&mut self.tx, copy).await
    }

    async fn update_copy(&mut self, copy: &BookCopy) -> AppResult<()> {
        catalog::update_copy(&mut self.tx, copy).await
    }

    async fn list_available_copies(&mut self) -> AppResult<Vec<CopyDetails>> {
        catalog::list_available_copies(&mut self.tx).await
    }

    async fn insert_request(&mut self, request: &Request) -> AppResult<()> {
        loans::insert_request(&mut self.tx, request).await
    }

    async fn find_request(&mut self, id: Uuid) -> AppResult<Option<Request>> {
        loans::find_request(&mut self.tx, id).await
    }

    async fn update_request(&mut self, request: &Request) -> AppResult<()> {
        loans::update_request(&mut self.tx, request).await
    }

    async fn find_transaction(&mut self, id: Uuid) -> AppResult<Option<Transaction>> {
        loans::find_for_update(&mut self.tx, id).await
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> AppResult<()> {
        loans::insert(&mut self.tx, transaction).await
    }

    async fn update_transaction(&mut self, transaction: &Transaction) -> AppResult<()> {
        loans::update(&mut self.tx, transaction).await
    }

    async fn find_return(&mut self, transaction_id: Uuid) -> AppResult<Option<ReturnRecord>> {
        loans::find_return(&mut self.tx, transaction_id).await
    }

    async fn insert_return(&mut self, record: &ReturnRecord) -> AppResult<()> {
        loans::insert_return(&mut self.tx, record).await
    }

    async fn transaction_details(&mut self, id: Uuid) -> AppResult<Option<TransactionDetails>> {
        loans::details(&mut self.tx, id).await
    }

    async fn list_transactions(&mut self, filter: LoanFilter) -> AppResult<Vec<TransactionDetails>> {
        loans::list(&mut self.tx, filter).await
    }

    async fn dashboard_stats(&mut self) -> AppResult<DashboardStats> {
        stats::dashboard(&mut self.tx).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
