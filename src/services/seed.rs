//! Bootstrap data for a fresh installation.
//!
//! Every entity is created only when it is missing, so seeding on each
//! start-up is harmless.

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, BookCopy, BookCopyStatus, Category, Clerk, StaffAccount, User, UserRole},
    repository::{Repository, UnitOfWork},
    services::auth::hash_password,
};

struct SeedBook {
    title: &'static str,
    author: &'static str,
    isbn: &'static str,
    publisher: &'static str,
    shelf: &'static str,
}

struct SeedStaff {
    username: &'static str,
    password: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    role: UserRole,
}

const CATEGORIES: [(&str, &str); 2] = [
    ("Fiction", "General fiction titles"),
    ("Programming", "Software development resources"),
];

const BOOKS: [(&str, SeedBook); 2] = [
    (
        "Programming",
        SeedBook {
            title: "The Pragmatic Programmer",
            author: "Andrew Hunt & David Thomas",
            isbn: "978-0201616224",
            publisher: "Addison-Wesley",
            shelf: "A-1",
        },
    ),
    (
        "Fiction",
        SeedBook {
            title: "To Kill a Mockingbird",
            author: "Harper Lee",
            isbn: "978-0446310789",
            publisher: "Harper Perennial",
            shelf: "B-2",
        },
    ),
];

const STAFF: [SeedStaff; 2] = [
    SeedStaff {
        username: "librarian",
        password: "lib123",
        first_name: "Jane",
        last_name: "Smith",
        email: "librarian@example.com",
        role: UserRole::Clerk,
    },
    SeedStaff {
        username: "superadmin",
        password: "admin123",
        first_name: "Alex",
        last_name: "SuperAdmin",
        email: "admin@shelfmaster.io",
        role: UserRole::Admin,
    },
];

/// Outcome of a seeding run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub books: usize,
    pub copies: usize,
    pub students: usize,
    pub staff: usize,
}

impl SeedReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Create the bootstrap catalog and accounts that are still missing
pub async fn seed(repository: &Repository) -> AppResult<SeedReport> {
    let mut uow = repository.begin().await?;
    let mut report = SeedReport::default();

    seed_catalog(uow.as_mut(), &mut report).await?;
    seed_student(uow.as_mut(), &mut report).await?;
    seed_staff(uow.as_mut(), &mut report).await?;

    uow.commit().await?;

    if report.is_empty() {
        tracing::debug!("Seed data already present");
    } else {
        tracing::info!(
            categories = report.categories,
            books = report.books,
            copies = report.copies,
            students = report.students,
            staff = report.staff,
            "Seed data created"
        );
    }
    Ok(report)
}

async fn seed_catalog(uow: &mut dyn UnitOfWork, report: &mut SeedReport) -> AppResult<()> {
    for (name, description) in CATEGORIES {
        if uow.find_category_by_name(name).await?.is_none() {
            uow.insert_category(&Category {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: Some(description.to_string()),
            })
            .await?;
            report.categories += 1;
        }
    }

    for (category_name, seed) in &BOOKS {
        let Some(category) = uow.find_category_by_name(category_name).await? else {
            continue;
        };

        let book = match uow.find_book_by_isbn(seed.isbn).await? {
            Some(book) => book,
            None => {
                let book = Book {
                    id: Uuid::new_v4(),
                    title: seed.title.to_string(),
                    isbn: seed.isbn.to_string(),
                    author: seed.author.to_string(),
                    copyright_year: None,
                    summary: None,
                    publisher: seed.publisher.to_string(),
                    category_id: category.id,
                };
                uow.insert_book(&book).await?;
                report.books += 1;
                book
            }
        };

        if uow.count_copies_of_book(book.id).await? == 0 {
            uow.insert_copy(&BookCopy {
                id: Uuid::new_v4(),
                book_id: book.id,
                copy_number: 1,
                shelf_location: seed.shelf.to_string(),
                status: BookCopyStatus::Available,
            })
            .await?;
            report.copies += 1;
        }
    }
    Ok(())
}

async fn seed_student(uow: &mut dyn UnitOfWork, report: &mut SeedReport) -> AppResult<()> {
    if uow.student_exists("student", "student@example.com").await? {
        return Ok(());
    }

    let now = Utc::now();
    uow.insert_user(&User {
        id: Uuid::new_v4(),
        first_name: "John".to_string(),
        middle_name: None,
        last_name: "Doe".to_string(),
        email: "student@example.com".to_string(),
        contact_number: String::new(),
        address: String::new(),
        college: "Engineering".to_string(),
        department: "Computer Science".to_string(),
        username: "student".to_string(),
        password_hash: hash_password("student123")?,
        role: UserRole::Student,
        created_at: now,
        updated_at: now,
    })
    .await?;
    report.students += 1;
    Ok(())
}

async fn seed_staff(uow: &mut dyn UnitOfWork, report: &mut SeedReport) -> AppResult<()> {
    for seed in &STAFF {
        if uow.staff_username_exists(seed.username).await? {
            continue;
        }

        let clerk = Clerk {
            id: Uuid::new_v4(),
            first_name: seed.first_name.to_string(),
            middle_name: None,
            last_name: seed.last_name.to_string(),
            email: seed.email.to_string(),
            contact_number: String::new(),
        };
        let account = StaffAccount {
            id: Uuid::new_v4(),
            clerk_id: clerk.id,
            username: seed.username.to_string(),
            password_hash: hash_password(seed.password)?,
            role: seed.role,
        };
        uow.insert_clerk(&clerk, &account).await?;
        report.staff += 1;
    }
    Ok(())
}
