//! Catalog management service: categories, books and copies

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{CreateBook, CreateCategory, CreateCopy},
        Book, BookCopy, BookCopyStatus, Category, CopyDetails,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Categories ordered by name
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let mut uow = self.repository.begin().await?;
        uow.list_categories().await
    }

    pub async fn add_category(&self, category: CreateCategory) -> AppResult<Category> {
        let name = category.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Category name is required".to_string()));
        }

        let mut uow = self.repository.begin().await?;
        if uow.find_category_by_name(name).await?.is_some() {
            return Err(AppError::Conflict(format!("Category '{}' already exists", name)));
        }

        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: category
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        };
        uow.insert_category(&category).await?;
        uow.commit().await?;

        tracing::info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Add a title to the catalog. Copies are added separately.
    pub async fn add_book(&self, book: CreateBook) -> AppResult<Book> {
        let title = book.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        book.validate()?;

        let mut uow = self.repository.begin().await?;
        uow.find_category(book.category_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", book.category_id)))?;

        let book = Book {
            id: Uuid::new_v4(),
            title,
            isbn: book.isbn.trim().to_string(),
            author: book.author.trim().to_string(),
            copyright_year: book.copyright_year,
            summary: book.summary.filter(|s| !s.trim().is_empty()),
            publisher: book.publisher.trim().to_string(),
            category_id: book.category_id,
        };
        uow.insert_book(&book).await?;
        uow.commit().await?;

        tracing::info!(book_id = %book.id, title = %book.title, "Book created");
        Ok(book)
    }

    /// Add a physical copy; copies of a title are numbered from 1
    pub async fn add_copy(&self, book_id: Uuid, copy: CreateCopy) -> AppResult<BookCopy> {
        let mut uow = self.repository.begin().await?;
        uow.find_book(book_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", book_id)))?;

        let count = uow.count_copies_of_book(book_id).await?;
        let copy = BookCopy {
            id: Uuid::new_v4(),
            book_id,
            copy_number: i32::try_from(count + 1)
                .map_err(|_| AppError::Internal("Copy number overflow".to_string()))?,
            shelf_location: copy.shelf_location.trim().to_string(),
            status: BookCopyStatus::Available,
        };
        uow.insert_copy(&copy).await?;
        uow.commit().await?;

        tracing::info!(
            copy_id = %copy.id,
            book_id = %book_id,
            copy_number = copy.copy_number,
            "Book copy added"
        );
        Ok(copy)
    }

    /// Copies that can currently be requested, by title then copy number
    pub async fn available_copies(&self) -> AppResult<Vec<CopyDetails>> {
        let mut uow = self.repository.begin().await?;
        uow.list_available_copies().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Fixture;

    fn book(category_id: Uuid, title: &str) -> CreateBook {
        CreateBook {
            title: title.to_string(),
            author: "Donald Knuth".to_string(),
            isbn: "978-0201896831".to_string(),
            publisher: "Addison-Wesley".to_string(),
            copyright_year: Some(1997),
            summary: Some("  ".to_string()),
            category_id,
        }
    }

    #[tokio::test]
    async fn categories_are_unique_and_sorted() {
        let fx = Fixture::new().await;
        let catalog = &fx.services.catalog;

        catalog
            .add_category(CreateCategory { name: " Art ".into(), description: None })
            .await
            .unwrap();

        let err = catalog
            .add_category(CreateCategory { name: "Art".into(), description: None })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = catalog
            .add_category(CreateCategory { name: "   ".into(), description: None })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let names: Vec<String> = catalog
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(names.contains(&"Art".to_string()));
    }

    #[tokio::test]
    async fn book_requires_title_and_known_category() {
        let fx = Fixture::new().await;
        let catalog = &fx.services.catalog;

        let err = catalog.add_book(book(fx.category.id, " ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = catalog.add_book(book(Uuid::new_v4(), "TAOCP")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let created = catalog.add_book(book(fx.category.id, "TAOCP")).await.unwrap();
        assert_eq!(created.summary, None);
    }

    #[tokio::test]
    async fn copies_are_numbered_and_listed_as_available() {
        let fx = Fixture::new().await;
        let catalog = &fx.services.catalog;

        let created = catalog.add_book(book(fx.category.id, "Algorithms")).await.unwrap();
        let first = catalog
            .add_copy(created.id, CreateCopy { shelf_location: "C-3".into() })
            .await
            .unwrap();
        let second = catalog
            .add_copy(created.id, CreateCopy { shelf_location: "C-3".into() })
            .await
            .unwrap();
        assert_eq!((first.copy_number, second.copy_number), (1, 2));

        let err = catalog
            .add_copy(Uuid::new_v4(), CreateCopy { shelf_location: "C-3".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let available = catalog.available_copies().await.unwrap();
        let algorithms: Vec<i32> = available
            .iter()
            .filter(|c| c.book_id == created.id)
            .map(|c| c.copy_number)
            .collect();
        assert_eq!(algorithms, vec![1, 2]);
        assert_eq!(available[0].title, "Algorithms");
    }

    #[tokio::test]
    async fn issued_copies_leave_the_available_list() {
        let fx = Fixture::new().await;
        let t = fx
            .services
            .loans
            .request_loan(fx.student.id, fx.copy.id)
            .await
            .unwrap();
        fx.services.loans.issue_loan(t.id, fx.clerk.id).await.unwrap();

        let available = fx.services.catalog.available_copies().await.unwrap();
        assert!(available.iter().all(|c| c.id != fx.copy.id));
        assert!(available.iter().any(|c| c.id == fx.second_copy.id));
    }
}
