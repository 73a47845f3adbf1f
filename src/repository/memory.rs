//! In-memory store.
//!
//! A unit of work holds the store-wide lock for its whole lifetime and works
//! on a private copy of the data; commit swaps the copy in. Operations are
//! therefore fully serialized, and an uncommitted unit of work leaves no trace.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{LoanFilter, Store, UnitOfWork};
use crate::{
    error::{AppError, AppResult},
    models::{
        Book, BookCopy, BookCopyStatus, Category, Clerk, ClerkDetails,
        CopyDetails, DashboardStats, Request, ReturnRecord, StaffAccount, Transaction,
        TransactionDetails, TransactionStatus, User, UserRole, UserShort,
    },
};

#[derive(Debug, Clone, Default)]
struct MemoryData {
    users: HashMap<Uuid, User>,
    clerks: HashMap<Uuid, Clerk>,
    staff_accounts: HashMap<Uuid, StaffAccount>,
    categories: HashMap<Uuid, Category>,
    books: HashMap<Uuid, Book>,
    copies: HashMap<Uuid, BookCopy>,
    requests: HashMap<Uuid, Request>,
    transactions: HashMap<Uuid, Transaction>,
    returns: HashMap<Uuid, ReturnRecord>,
}

impl MemoryData {
    fn details(&self, transaction: &Transaction) -> AppResult<TransactionDetails> {
        let missing = |what: &str| {
            AppError::Internal(format!("Transaction {} references a missing {}", transaction.id, what))
        };
        let user = self.users.get(&transaction.user_id).ok_or_else(|| missing("borrower"))?;
        let copy = self.copies.get(&transaction.book_copy_id).ok_or_else(|| missing("copy"))?;
        let book = self.books.get(&copy.book_id).ok_or_else(|| missing("book"))?;
        let clerk = transaction.clerk_id.and_then(|id| self.clerks.get(&id));
        let returned = self
            .returns
            .values()
            .find(|r| r.transaction_id == transaction.id)
            .cloned();

        Ok(TransactionDetails {
            id: transaction.id,
            status: transaction.status,
            date_requested: transaction.date_requested,
            date_issued: transaction.date_issued,
            due_date: transaction.due_date,
            borrower: UserShort::from(user),
            book_copy_id: copy.id,
            copy_number: copy.copy_number,
            shelf_location: copy.shelf_location.clone(),
            copy_status: copy.status,
            book_id: book.id,
            book_title: book.title.clone(),
            clerk_id: transaction.clerk_id,
            clerk_name: clerk.map(Clerk::full_name),
            returned,
            is_overdue: transaction.is_overdue(Utc::now()),
        })
    }

    fn has_return(&self, transaction_id: Uuid) -> bool {
        self.returns.values().any(|r| r.transaction_id == transaction_id)
    }
}

/// Store kept entirely in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<MemoryData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.data.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryData>,
    working: MemoryData,
}

fn unique_violation(what: &str, id: Uuid) -> AppError {
    AppError::Conflict(format!("{} {} already exists", what, id))
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_user(&mut self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn find_user_by_login(&mut self, login: &str) -> AppResult<Option<User>> {
        let login = login.to_lowercase();
        Ok(self
            .working
            .users
            .values()
            .find(|u| u.username.to_lowercase() == login || u.email.to_lowercase() == login)
            .cloned())
    }

    async fn student_exists(&mut self, username: &str, email: &str) -> AppResult<bool> {
        let (username, email) = (username.to_lowercase(), email.to_lowercase());
        Ok(self
            .working
            .users
            .values()
            .any(|u| u.username.to_lowercase() == username || u.email.to_lowercase() == email))
    }

    async fn insert_user(&mut self, user: &User) -> AppResult<()> {
        if self.working.users.contains_key(&user.id) {
            return Err(unique_violation("User", user.id));
        }
        self.working.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn list_students(&mut self) -> AppResult<Vec<User>> {
        let mut students: Vec<User> = self
            .working
            .users
            .values()
            .filter(|u| u.role == UserRole::Student)
            .cloned()
            .collect();
        students.sort_by(|a, b| {
            a.first_name
                .cmp(&b.first_name)
                .then_with(|| a.last_name.cmp(&b.last_name))
        });
        Ok(students)
    }

    async fn find_clerk(&mut self, id: Uuid) -> AppResult<Option<Clerk>> {
        Ok(self.working.clerks.get(&id).cloned())
    }

    async fn find_staff_by_username(&mut self, username: &str) -> AppResult<Option<(StaffAccount, Clerk)>> {
        let username = username.to_lowercase();
        let account = self
            .working
            .staff_accounts
            .values()
            .find(|a| a.username.to_lowercase() == username);
        Ok(account.and_then(|a| {
            self.working
                .clerks
                .get(&a.clerk_id)
                .map(|c| (a.clone(), c.clone()))
        }))
    }

    async fn staff_username_exists(&mut self, username: &str) -> AppResult<bool> {
        let username = username.to_lowercase();
        Ok(self
            .working
            .staff_accounts
            .values()
            .any(|a| a.username.to_lowercase() == username))
    }

    async fn insert_clerk(&mut self, clerk: &Clerk, account: &StaffAccount) -> AppResult<()> {
        if self.working.clerks.contains_key(&clerk.id) {
            return Err(unique_violation("Clerk", clerk.id));
        }
        self.working.clerks.insert(clerk.id, clerk.clone());
        self.working.staff_accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn list_clerks(&mut self) -> AppResult<Vec<ClerkDetails>> {
        let mut clerks: Vec<ClerkDetails> = self
            .working
            .clerks
            .values()
            .map(|c| {
                let account = self
                    .working
                    .staff_accounts
                    .values()
                    .find(|a| a.clerk_id == c.id);
                ClerkDetails {
                    id: c.id,
                    first_name: c.first_name.clone(),
                    middle_name: c.middle_name.clone(),
                    last_name: c.last_name.clone(),
                    email: c.email.clone(),
                    contact_number: c.contact_number.clone(),
                    username: account.map(|a| a.username.clone()),
                    role: account.map(|a| a.role),
                }
            })
            .collect();
        clerks.sort_by(|a, b| a.first_name.cmp(&b.first_name));
        Ok(clerks)
    }

    async fn list_categories(&mut self) -> AppResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.working.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&mut self, id: Uuid) -> AppResult<Option<Category>> {
        Ok(self.working.categories.get(&id).cloned())
    }

    async fn find_category_by_name(&mut self, name: &str) -> AppResult<Option<Category>> {
        Ok(self
            .working
            .categories
            .values()
            .find(|c| c.name == name)
            .cloned())
    }

    async fn insert_category(&mut self, category: &Category) -> AppResult<()> {
        if self.working.categories.contains_key(&category.id) {
            return Err(unique_violation("Category", category.id));
        }
        self.working.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn find_book(&mut self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.working.books.get(&id).cloned())
    }

    async fn find_book_by_isbn(&mut self, isbn: &str) -> AppResult<Option<Book>> {
        Ok(self.working.books.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn insert_book(&mut self, book: &Book) -> AppResult<()> {
        if self.working.books.contains_key(&book.id) {
            return Err(unique_violation("Book", book.id));
        }
        self.working.books.insert(book.id, book.clone());
        Ok(())
    }

    async fn count_copies_of_book(&mut self, book_id: Uuid) -> AppResult<i64> {
        Ok(self
            .working
            .copies
            .values()
            .filter(|c| c.book_id == book_id)
            .count() as i64)
    }

    async fn find_copy(&mut self, id: Uuid) -> AppResult<Option<BookCopy>> {
        Ok(self.working.copies.get(&id).cloned())
    }

    async fn insert_copy(&mut self, copy: &BookCopy) -> AppResult<()> {
        if self.working.copies.contains_key(&copy.id) {
            return Err(unique_violation("Book copy", copy.id));
        }
        self.working.copies.insert(copy.id, copy.clone());
        Ok(())
    }

    async fn update_copy(&mut self, copy: &BookCopy) -> AppResult<()> {
        match self.working.copies.get_mut(&copy.id) {
            Some(existing) => {
                *existing = copy.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Book copy {} not found", copy.id))),
        }
    }

    async fn list_available_copies(&mut self) -> AppResult<Vec<CopyDetails>> {
        let mut copies: Vec<CopyDetails> = self
            .working
            .copies
            .values()
            .filter(|c| c.status == BookCopyStatus::Available)
            .filter_map(|c| {
                let book = self.working.books.get(&c.book_id)?;
                Some(CopyDetails {
                    id: c.id,
                    book_id: book.id,
                    copy_number: c.copy_number,
                    shelf_location: c.shelf_location.clone(),
                    status: c.status,
                    title: book.title.clone(),
                    author: book.author.clone(),
                    isbn: book.isbn.clone(),
                    category_name: self
                        .working
                        .categories
                        .get(&book.category_id)
                        .map(|cat| cat.name.clone()),
                })
            })
            .collect();
        copies.sort_by(|a, b| a.title.cmp(&b.title).then(a.copy_number.cmp(&b.copy_number)));
        Ok(copies)
    }

    async fn insert_request(&mut self, request: &Request) -> AppResult<()> {
        if self.working.requests.contains_key(&request.id) {
            return Err(unique_violation("Request", request.id));
        }
        self.working.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn find_request(&mut self, id: Uuid) -> AppResult<Option<Request>> {
        Ok(self.working.requests.get(&id).cloned())
    }

    async fn update_request(&mut self, request: &Request) -> AppResult<()> {
        match self.working.requests.get_mut(&request.id) {
            Some(existing) => {
                *existing = request.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Request {} not found", request.id))),
        }
    }

    async fn find_transaction(&mut self, id: Uuid) -> AppResult<Option<Transaction>> {
        Ok(self.working.transactions.get(&id).cloned())
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> AppResult<()> {
        if self.working.transactions.contains_key(&transaction.id) {
            return Err(unique_violation("Transaction", transaction.id));
        }
        self.working
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn update_transaction(&mut self, transaction: &Transaction) -> AppResult<()> {
        match self.working.transactions.get_mut(&transaction.id) {
            Some(existing) => {
                *existing = transaction.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Transaction {} not found",
                transaction.id
            ))),
        }
    }

    async fn find_return(&mut self, transaction_id: Uuid) -> AppResult<Option<ReturnRecord>> {
        Ok(self
            .working
            .returns
            .values()
            .find(|r| r.transaction_id == transaction_id)
            .cloned())
    }

    async fn insert_return(&mut self, record: &ReturnRecord) -> AppResult<()> {
        if self.working.has_return(record.transaction_id) {
            return Err(AppError::Conflict(format!(
                "Transaction {} already has a return record",
                record.transaction_id
            )));
        }
        self.working.returns.insert(record.id, record.clone());
        Ok(())
    }

    async fn transaction_details(&mut self, id: Uuid) -> AppResult<Option<TransactionDetails>> {
        match self.working.transactions.get(&id) {
            Some(t) => self.working.details(t).map(Some),
            None => Ok(None),
        }
    }

    async fn list_transactions(&mut self, filter: LoanFilter) -> AppResult<Vec<TransactionDetails>> {
        let data = &self.working;
        let mut selected: Vec<&Transaction> = data
            .transactions
            .values()
            .filter(|t| match filter {
                LoanFilter::Pending => t.status == TransactionStatus::Pending,
                LoanFilter::Active => t.is_active(data.has_return(t.id)),
                LoanFilter::ActiveForUser(user_id) => {
                    t.user_id == user_id
                        && t.status == TransactionStatus::Issued
                        && !data.has_return(t.id)
                }
            })
            .collect();

        match filter {
            LoanFilter::Pending => selected.sort_by_key(|t| t.date_requested),
            LoanFilter::Active => selected.sort_by_key(|t| t.date_issued),
            LoanFilter::ActiveForUser(_) => {
                selected.sort_by(|a, b| b.date_issued.cmp(&a.date_issued))
            }
        }

        selected.into_iter().map(|t| data.details(t)).collect()
    }

    async fn dashboard_stats(&mut self) -> AppResult<DashboardStats> {
        let data = &self.working;
        Ok(DashboardStats {
            total_students: data
                .users
                .values()
                .filter(|u| u.role == UserRole::Student)
                .count() as i64,
            total_clerks: data.clerks.len() as i64,
            total_books: data.books.len() as i64,
            total_copies: data.copies.len() as i64,
            pending_requests: data
                .transactions
                .values()
                .filter(|t| t.status == TransactionStatus::Pending)
                .count() as i64,
            active_loans: data
                .transactions
                .values()
                .filter(|t| t.is_active(data.has_return(t.id)))
                .count() as i64,
        })
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
