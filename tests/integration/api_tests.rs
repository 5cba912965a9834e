//! API integration tests
//!
//! Expect a running server with a bootstrap admin `admin` / `admin`
//! (`LIBRIS_BOOTSTRAP__ADMIN_USERNAME`, `LIBRIS_BOOTSTRAP__ADMIN_PASSWORD`).

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an authenticated client
async fn get_auth_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Thirteen digits that differ between runs
fn unique_isbn() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{:013}", nanos % 10_000_000_000_000)
}

async fn create_book(client: &Client, token: &str, quantity: i32) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": "Integration Test Book",
            "author": "Test Author",
            "isbn": unique_isbn(),
            "publication_year": 2020,
            "quantity": quantity
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse book")
}

async fn create_member(client: &Client, token: &str) -> Value {
    let response = client
        .post(format!("{}/members", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "name": "Integration Member",
            "email": format!("member-{}@example.org", unique_isbn()),
            "phone": "5550100",
            "address": "1 Test Street"
        }))
        .send()
        .await
        .expect("Failed to create member");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse member")
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
            "username": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["account"]["role"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_login_wrong_password() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": "not-the-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_rejected() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book = create_book(&client, &token, 1).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Another Title",
            "author": "Someone Else",
            "isbn": book["isbn"],
            "publication_year": 2021,
            "quantity": 1
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_lend_and_return() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book = create_book(&client, &token, 1).await;
    let member = create_member(&client, &token).await;

    // Lend the only copy
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "book_id": book["id"], "member_id": member["id"] }))
        .send()
        .await
        .expect("Failed to lend");
    assert_eq!(response.status(), StatusCode::CREATED);
    let loan: Value = response.json().await.unwrap();
    assert_eq!(loan["status"], "borrowed");
    assert_eq!(loan["is_overdue"], false);

    // No copies left
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "book_id": book["id"], "member_id": member["id"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let fetched: Value = client
        .get(format!("{}/books/{}", BASE_URL, book["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["available_quantity"], 0);

    // Return it
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let returned: Value = response.json().await.unwrap();
    assert_eq!(returned["status"], "returned");

    // Second return is rejected
    let response = client
        .post(format!("{}/loans/{}/return", BASE_URL, loan["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let fetched: Value = client
        .get(format!("{}/books/{}", BASE_URL, book["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["available_quantity"], 1);
}

#[tokio::test]
#[ignore]
async fn test_quantity_clamped_to_active_loans() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book = create_book(&client, &token, 2).await;
    let member = create_member(&client, &token).await;

    for _ in 0..2 {
        let response = client
            .post(format!("{}/loans", BASE_URL))
            .bearer_auth(&token)
            .json(&json!({ "book_id": book["id"], "member_id": member["id"] }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = client
        .put(format!("{}/books/{}", BASE_URL, book["id"]))
        .bearer_auth(&token)
        .json(&json!({
            "title": book["title"],
            "author": book["author"],
            "isbn": book["isbn"],
            "publication_year": book["publication_year"],
            "quantity": 1
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["book"]["quantity"], 2);
    assert_eq!(body["book"]["available_quantity"], 0);
    assert_eq!(body["adjustment"]["clamped"], true);
    assert_eq!(
        body["warning"],
        "Quantity set below active loans (2). Adjusted to match."
    );
}

#[tokio::test]
#[ignore]
async fn test_delete_member_restores_copies() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let book = create_book(&client, &token, 3).await;
    let member = create_member(&client, &token).await;

    client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "book_id": book["id"], "member_id": member["id"] }))
        .send()
        .await
        .unwrap();

    let response = client
        .delete(format!("{}/members/{}", BASE_URL, member["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["loans_removed"], 1);
    assert_eq!(body["copies_restored"], 1);

    let response = client
        .get(format!("{}/members/{}/loans", BASE_URL, member["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let fetched: Value = client
        .get(format!("{}/books/{}", BASE_URL, book["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["available_quantity"], 3);
}

#[tokio::test]
#[ignore]
async fn test_dashboard() {
    let client = Client::new();
    let token = get_auth_token(&client).await;

    let response = client
        .get(format!("{}/dashboard", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert!(body["issued_books"].is_i64());
    assert!(body["recent_loans"].as_array().unwrap().len() <= 5);
    assert!(body["due_today"].as_array().unwrap().len() <= 5);
}
