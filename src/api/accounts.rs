//! Student and staff account endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{
        user::{CreateStaff, CreateStudent},
        ClerkDetails, User,
    },
    AppState,
};

use super::AuthenticatedUser;

/// List students
#[utoipa::path(
    get,
    path = "/students",
    tag = "accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Students by name", body = Vec<User>),
        (status = 403, description = "Staff only", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_students(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<User>>> {
    claims.require_staff()?;
    Ok(Json(state.services.accounts.list_students().await?))
}

/// Register a student
#[utoipa::path(
    post,
    path = "/students",
    tag = "accounts",
    security(("bearer_auth" = [])),
    request_body = CreateStudent,
    responses(
        (status = 201, description = "Student created", body = User),
        (status = 400, description = "Missing or invalid field", body = crate::error::ErrorResponse),
        (status = 409, description = "Username or email taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_student(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(student): Json<CreateStudent>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_staff()?;

    let created = state.services.accounts.create_student(student).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List staff members
#[utoipa::path(
    get,
    path = "/clerks",
    tag = "accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Staff by first name", body = Vec<ClerkDetails>),
        (status = 403, description = "Staff only", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_clerks(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<ClerkDetails>>> {
    claims.require_staff()?;
    Ok(Json(state.services.accounts.list_clerks().await?))
}

/// Create a clerk or admin account
#[utoipa::path(
    post,
    path = "/clerks",
    tag = "accounts",
    security(("bearer_auth" = [])),
    request_body = CreateStaff,
    responses(
        (status = 201, description = "Staff account created", body = ClerkDetails),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse),
        (status = 409, description = "Username taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_clerk(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(staff): Json<CreateStaff>,
) -> AppResult<(StatusCode, Json<ClerkDetails>)> {
    claims.require_admin()?;

    let created = state.services.accounts.create_staff(staff).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::{
        api::{router, test_helpers::{login, send}},
        test_support::{Fixture, ADMIN_PASSWORD, CLERK_PASSWORD},
    };

    fn new_clerk() -> serde_json::Value {
        json!({
            "first_name": "Grace",
            "last_name": "Hopper",
            "username": "grace",
            "password": "secret",
            "role": "clerk",
        })
    }

    #[tokio::test]
    async fn only_admins_create_staff() {
        let fx = Fixture::new().await;
        let app = router(fx.state());
        let clerk = login(&app, "librarian", CLERK_PASSWORD).await;
        let admin = login(&app, "admin", ADMIN_PASSWORD).await;

        let (status, _) = send(&app, Method::POST, "/api/v1/clerks", Some(&clerk), Some(new_clerk())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, created) = send(&app, Method::POST, "/api/v1/clerks", Some(&admin), Some(new_clerk())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["username"], "grace");
        assert!(created.get("password_hash").is_none());

        let (status, _) = send(&app, Method::POST, "/api/v1/clerks", Some(&admin), Some(new_clerk())).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, clerks) = send(&app, Method::GET, "/api/v1/clerks", Some(&clerk), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(clerks.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn student_registration_validates_input() {
        let fx = Fixture::new().await;
        let app = router(fx.state());
        let clerk = login(&app, "librarian", CLERK_PASSWORD).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/students",
            Some(&clerk),
            Some(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "not-an-email",
                "username": "ada",
                "password": "secret",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "BadValue");

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/v1/students",
            Some(&clerk),
            Some(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "username": "ada",
                "password": "secret",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["role"], "student");
        assert!(created.get("password_hash").is_none());

        let (_, students) = send(&app, Method::GET, "/api/v1/students", Some(&clerk), None).await;
        assert_eq!(students.as_array().unwrap().len(), 3);
    }
}
