//! Shared fixture for unit tests: an in-memory store with two students,
//! a clerk, an admin and one book with two copies.

use std::sync::{Arc, OnceLock};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    models::{Book, BookCopy, BookCopyStatus, Category, Clerk, StaffAccount, User, UserRole},
    repository::{MemoryStore, Store},
    services::{auth::hash_password, Services},
    AppState,
};

pub const STUDENT_PASSWORD: &str = "student123";
pub const CLERK_PASSWORD: &str = "lib123";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Hash each password once per test binary
fn cached_hash(cell: &'static OnceLock<String>, password: &str) -> String {
    cell.get_or_init(|| hash_password(password).unwrap()).clone()
}

fn student_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    cached_hash(&HASH, STUDENT_PASSWORD)
}

fn clerk_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    cached_hash(&HASH, CLERK_PASSWORD)
}

fn admin_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    cached_hash(&HASH, ADMIN_PASSWORD)
}

pub struct Fixture {
    pub config: AppConfig,
    pub store: MemoryStore,
    pub services: Services,
    pub student: User,
    pub other_student: User,
    pub clerk: Clerk,
    pub admin: Clerk,
    pub category: Category,
    pub book: Book,
    pub copy: BookCopy,
    pub second_copy: BookCopy,
}

fn new_student(first_name: &str, last_name: &str, username: &str, email: &str, password_hash: String) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        first_name: first_name.to_string(),
        middle_name: None,
        last_name: last_name.to_string(),
        email: email.to_string(),
        contact_number: String::new(),
        address: String::new(),
        college: "Engineering".to_string(),
        department: "Computer Science".to_string(),
        username: username.to_string(),
        password_hash,
        role: UserRole::Student,
        created_at: now,
        updated_at: now,
    }
}

fn new_staff(first_name: &str, last_name: &str, username: &str, role: UserRole, password_hash: String) -> (Clerk, StaffAccount) {
    let clerk = Clerk {
        id: Uuid::new_v4(),
        first_name: first_name.to_string(),
        middle_name: None,
        last_name: last_name.to_string(),
        email: format!("{}@example.com", username),
        contact_number: String::new(),
    };
    let account = StaffAccount {
        id: Uuid::new_v4(),
        clerk_id: clerk.id,
        username: username.to_string(),
        password_hash,
        role,
    };
    (clerk, account)
}

fn new_copy(book_id: Uuid, copy_number: i32) -> BookCopy {
    BookCopy {
        id: Uuid::new_v4(),
        book_id,
        copy_number,
        shelf_location: "A-1".to_string(),
        status: BookCopyStatus::Available,
    }
}

impl Fixture {
    pub async fn new() -> Self {
        let config = AppConfig::default();
        let store = MemoryStore::new();

        let student = new_student("John", "Doe", "student", "student@example.com", student_hash());
        let other_student = new_student("Maria", "Santos", "maria", "maria@example.com", student_hash());
        let (clerk, clerk_account) = new_staff("Jane", "Smith", "librarian", UserRole::Clerk, clerk_hash());
        let (admin, admin_account) = new_staff("Pat", "Reyes", "admin", UserRole::Admin, admin_hash());

        let category = Category {
            id: Uuid::new_v4(),
            name: "Programming".to_string(),
            description: None,
        };
        let book = Book {
            id: Uuid::new_v4(),
            title: "Clean Code".to_string(),
            isbn: "978-0132350884".to_string(),
            author: "Robert C. Martin".to_string(),
            copyright_year: Some(2008),
            summary: None,
            publisher: "Prentice Hall".to_string(),
            category_id: category.id,
        };
        let first_copy = new_copy(book.id, 1);
        let second_copy = new_copy(book.id, 2);

        let mut uow = store.begin().await.unwrap();
        uow.insert_user(&student).await.unwrap();
        uow.insert_user(&other_student).await.unwrap();
        uow.insert_clerk(&clerk, &clerk_account).await.unwrap();
        uow.insert_clerk(&admin, &admin_account).await.unwrap();
        uow.insert_category(&category).await.unwrap();
        uow.insert_book(&book).await.unwrap();
        uow.insert_copy(&first_copy).await.unwrap();
        uow.insert_copy(&second_copy).await.unwrap();
        uow.commit().await.unwrap();

        let services = Services::new(Arc::new(store.clone()), &config);

        Self {
            config,
            store,
            services,
            student,
            other_student,
            clerk,
            admin,
            category,
            book,
            copy: first_copy,
            second_copy,
        }
    }

    /// Application state over the fixture's services, for router tests
    pub fn state(&self) -> AppState {
        AppState {
            config: Arc::new(self.config.clone()),
            services: Arc::new(self.services.clone()),
        }
    }
}
