//! Categories, books and copies queries

use sqlx::PgConnection;
use uuid::Uuid;

use super::conflict_on_unique;
use crate::{
    error::AppResult,
    models::{Book, BookCopy, Category, CopyDetails},
};

pub async fn list_categories(conn: &mut PgConnection) -> AppResult<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
        .fetch_all(conn)
        .await?;
    Ok(categories)
}

pub async fn find_category(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(category)
}

pub async fn find_category_by_name(conn: &mut PgConnection, name: &str) -> AppResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE name = $1")
        .bind(name)
        .fetch_optional(conn)
        .await?;
    Ok(category)
}

pub async fn insert_category(conn: &mut PgConnection, category: &Category) -> AppResult<()> {
    sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .execute(conn)
        .await
        .map_err(|e| conflict_on_unique(e, "Category already exists"))?;
    Ok(())
}

pub async fn find_book(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<Book>> {
    let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(book)
}

pub async fn find_book_by_isbn(conn: &mut PgConnection, isbn: &str) -> AppResult<Option<Book>> {
    let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = $1 LIMIT 1")
        .bind(isbn)
        .fetch_optional(conn)
        .await?;
    Ok(book)
}

pub async fn insert_book(conn: &mut PgConnection, book: &Book) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO books (id, title, isbn, author, copyright_year, summary, publisher, category_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(book.id)
    .bind(&book.title)
    .bind(&book.isbn)
    .bind(&book.author)
    .bind(book.copyright_year)
    .bind(&book.summary)
    .bind(&book.publisher)
    .bind(book.category_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn count_copies_of_book(conn: &mut PgConnection, book_id: Uuid) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_copies WHERE book_id = $1")
        .bind(book_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// Copy row, locked until the end of the surrounding transaction
pub async fn find_copy_for_update(conn: &mut PgConnection, id: Uuid) -> AppResult<Option<BookCopy>> {
    let copy = sqlx::query_as::<_, BookCopy>("SELECT * FROM book_copies WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(copy)
}

pub async fn insert_copy(conn: &mut PgConnection, copy: &BookCopy) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO book_copies (id, book_id, copy_number, shelf_location, status)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(copy.id)
    .bind(copy.book_id)
    .bind(copy.copy_number)
    .bind(&copy.shelf_location)
    .bind(copy.status)
    .execute(conn)
    .await
    .map_err(|e| conflict_on_unique(e, "Copy number already used for this book"))?;
    Ok(())
}

pub async fn update_copy(conn: &mut PgConnection, copy: &BookCopy) -> AppResult<()> {
    sqlx::query("UPDATE book_copies SET shelf_location = $2, status = $3 WHERE id = $1")
        .bind(copy.id)
        .bind(&copy.shelf_location)
        .bind(copy.status)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn list_available_copies(conn: &mut PgConnection) -> AppResult<Vec<CopyDetails>> {
    let copies = sqlx::query_as::<_, CopyDetails>(
        r#"
        SELECT bc.id, bc.book_id, bc.copy_number, bc.shelf_location, bc.status,
               b.title, b.author, b.isbn, c.name AS category_name
        FROM book_copies bc
        JOIN books b ON bc.book_id = b.id
        LEFT JOIN categories c ON b.category_id = c.id
        WHERE bc.status = 'available'
        ORDER BY b.title, bc.copy_number
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(copies)
}
