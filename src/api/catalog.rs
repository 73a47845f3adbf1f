//! Catalog endpoints: categories, books and copies

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::{CreateBook, CreateCategory, CreateCopy},
        Book, BookCopy, Category, CopyDetails,
    },
    AppState,
};

use super::AuthenticatedUser;

/// List categories
#[utoipa::path(
    get,
    path = "/categories",
    tag = "catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Categories ordered by name", body = Vec<Category>)
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<Category>>> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(categories))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/categories",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Missing name", body = crate::error::ErrorResponse),
        (status = 409, description = "Category already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(category): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<Category>)> {
    claims.require_staff()?;

    let created = state.services.catalog.add_category(category).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "catalog",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Missing title", body = crate::error::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(book): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_staff()?;

    let created = state.services.catalog.add_book(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Add a physical copy of a book
#[utoipa::path(
    post,
    path = "/books/{id}/copies",
    tag = "catalog",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    request_body = CreateCopy,
    responses(
        (status = 201, description = "Copy created", body = BookCopy),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_copy(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
    Json(copy): Json<CreateCopy>,
) -> AppResult<(StatusCode, Json<BookCopy>)> {
    claims.require_staff()?;

    let created = state.services.catalog.add_copy(book_id, copy).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Copies that can be requested
#[utoipa::path(
    get,
    path = "/copies/available",
    tag = "catalog",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Available copies by title", body = Vec<CopyDetails>)
    )
)]
pub async fn available_copies(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<CopyDetails>>> {
    let copies = state.services.catalog.available_copies().await?;
    Ok(Json(copies))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::{
        api::{router, test_helpers::{login, send}},
        test_support::{Fixture, CLERK_PASSWORD, STUDENT_PASSWORD},
    };

    #[tokio::test]
    async fn staff_builds_the_catalog() {
        let fx = Fixture::new().await;
        let app = router(fx.state());
        let token = login(&app, "librarian", CLERK_PASSWORD).await;

        let (status, category) = send(
            &app,
            Method::POST,
            "/api/v1/categories",
            Some(&token),
            Some(json!({ "name": "History" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, book) = send(
            &app,
            Method::POST,
            "/api/v1/books",
            Some(&token),
            Some(json!({
                "title": "SPQR",
                "author": "Mary Beard",
                "isbn": "978-1631492228",
                "publisher": "Liveright",
                "category_id": category["id"],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let uri = format!("/api/v1/books/{}/copies", book["id"].as_str().unwrap());
        let (status, copy) = send(
            &app,
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "shelf_location": "H-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(copy["copy_number"], 1);
        assert_eq!(copy["status"], "available");

        let (status, available) =
            send(&app, Method::GET, "/api/v1/copies/available", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(available.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn students_browse_but_cannot_edit() {
        let fx = Fixture::new().await;
        let app = router(fx.state());
        let token = login(&app, "student", STUDENT_PASSWORD).await;

        let (status, _) = send(&app, Method::GET, "/api/v1/categories", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/categories",
            Some(&token),
            Some(json!({ "name": "History" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "NotOwner");

        let (status, _) = send(&app, Method::GET, "/api/v1/categories", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
