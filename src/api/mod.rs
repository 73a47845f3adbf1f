//! API handlers for ShelfMaster REST endpoints

pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod stats;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = state.services.auth.verify_token(token)?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Catalog
        .route("/categories", get(catalog::list_categories).post(catalog::create_category))
        .route("/books", post(catalog::create_book))
        .route("/books/:id/copies", post(catalog::create_copy))
        .route("/copies/available", get(catalog::available_copies))
        // Loans
        .route("/loans", post(loans::request_loan))
        .route("/loans/pending", get(loans::pending_requests))
        .route("/loans/active", get(loans::active_loans))
        .route("/loans/:id", get(loans::get_loan))
        .route("/loans/:id/issue", post(loans::issue_loan))
        .route("/loans/:id/return", post(loans::return_loan))
        .route("/loans/:id/reject", post(loans::reject_request))
        .route("/loans/:id/due-date", put(loans::set_due_date))
        .route("/users/:id/loans", get(loans::get_user_loans))
        // Accounts
        .route("/students", get(accounts::list_students).post(accounts::create_student))
        .route("/clerks", get(accounts::list_clerks).post(accounts::create_clerk))
        // Statistics
        .route("/stats", get(stats::get_stats))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    /// Send one request through the router and decode the JSON body
    pub async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        send_raw(app, method, uri, token, body.map(|b| b.to_string())).await
    }

    /// Like `send`, with the request body passed through as text
    pub async fn send_raw(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Log in through the API and return the bearer token
    pub async fn login(app: &Router, login: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(serde_json::json!({ "login": login, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }
}
