//! Authentication endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::UserRole,
    services::auth::Principal,
    AppState,
};

use super::AuthenticatedUser;

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Username, or email for students
    pub login: String,
    pub password: String,
}

/// Login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: u64,
    pub user: Principal,
}

/// Identity carried by the current token
#[derive(Serialize, ToSchema)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub role: UserRole,
}

/// Authenticate a student or staff member
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, user) = state
        .services
        .auth
        .login(&request.login, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.auth.jwt_expiration_hours * 3600,
        user,
    }))
}

/// Current user information
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(AuthenticatedUser(claims): AuthenticatedUser) -> Json<UserInfo> {
    Json(UserInfo {
        id: claims.user_id,
        username: claims.sub,
        role: claims.role,
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::{
        api::{router, test_helpers::{login, send}},
        test_support::{Fixture, CLERK_PASSWORD},
    };

    #[tokio::test]
    async fn token_identifies_the_caller() {
        let fx = Fixture::new().await;
        let app = router(fx.state());
        let token = login(&app, "librarian", CLERK_PASSWORD).await;

        let (status, me) = send(&app, Method::GET, "/api/v1/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], fx.clerk.id.to_string());
        assert_eq!(me["role"], "clerk");
    }

    #[tokio::test]
    async fn bad_credentials_and_tokens_are_unauthorized() {
        let fx = Fixture::new().await;
        let app = router(fx.state());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "login": "librarian", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "NotAuthorized");

        let (status, _) = send(&app, Method::GET, "/api/v1/auth/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
