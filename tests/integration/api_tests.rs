//! API integration tests against a running, seeded server

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Log in with one of the seeded accounts
async fn get_auth_token(client: &Client, login: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": login,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn first_available_copy(client: &Client, token: &str) -> String {
    let copies: Value = client
        .get(format!("{}/copies/available", BASE_URL))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    copies[0]["id"].as_str().expect("No available copy").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "librarian",
            "password": "lib123"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "clerk");
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans/pending", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = Client::new();
    let student = get_auth_token(&client, "student", "student123").await;
    let clerk = get_auth_token(&client, "librarian", "lib123").await;
    let copy_id = first_available_copy(&client, &student).await;

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(&student)
        .json(&json!({ "book_copy_id": copy_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let loan: Value = response.json().await.expect("Failed to parse response");
    let loan_id = loan["id"].as_str().expect("No loan id").to_string();

    let response = client
        .post(format!("{}/loans/{}/issue", BASE_URL, loan_id))
        .bearer_auth(&clerk)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let issued: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(issued["status"], "issued");
    assert_eq!(issued["copy_status"], "borrowed");

    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .bearer_auth(&student)
        .json(&json!({ "remarks": "integration test" }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["status"], "returned");
    assert_eq!(returned["copy_status"], "available");
}

#[tokio::test]
#[ignore]
async fn test_reject_request() {
    let client = Client::new();
    let student = get_auth_token(&client, "student", "student123").await;
    let clerk = get_auth_token(&client, "librarian", "lib123").await;
    let copy_id = first_available_copy(&client, &student).await;

    let loan: Value = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(&student)
        .json(&json!({ "book_copy_id": copy_id }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let loan_id = loan["id"].as_str().expect("No loan id");

    let response = client
        .post(format!("{}/loans/{}/reject", BASE_URL, loan_id))
        .bearer_auth(&clerk)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .post(format!("{}/loans/{}/issue", BASE_URL, loan_id))
        .bearer_auth(&clerk)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore]
async fn test_stats_requires_staff() {
    let client = Client::new();
    let student = get_auth_token(&client, "student", "student123").await;
    let admin = get_auth_token(&client, "superadmin", "admin123").await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .bearer_auth(&student)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let stats: Value = client
        .get(format!("{}/stats", BASE_URL))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert!(stats["total_books"].as_i64().unwrap_or(0) >= 2);
}
