//! Router-level tests of the login gate and the HTML pages.
//!
//! Tests that need a signed-in account run against PostgreSQL and are
//! ignored unless `DATABASE_URL` is set.

use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};

use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceExt;

use libris_server::{
    config::AppConfig,
    models::{AccountRole, UserClaims},
    repository::Repository,
    routes::create_router,
    services::auth::hash_password,
    AppState,
};

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "web-test-secret".to_string();
    config
}

/// Router over a pool that never connects unless a handler touches the database
fn app() -> Router {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy(&config.database.url)
        .expect("lazy pool");
    create_router(AppState::new(config, Repository::new(pool)))
}

fn db_app(pool: PgPool) -> Router {
    create_router(AppState::new(test_config(), Repository::new(pool)))
}

fn session_cookie_for(account_id: i32, role: AccountRole) -> String {
    let config = test_config();
    let now = Utc::now().timestamp();
    let claims = UserClaims {
        sub: "alice".to_string(),
        account_id,
        role,
        exp: now + 3600,
        iat: now,
    };
    let token = claims.create_token(&config.auth.jwt_secret).unwrap();
    format!("{}={}", config.auth.session_cookie, token)
}

/// Cookie signed for an account that does not exist in any database
fn session_cookie(role: AccountRole) -> String {
    session_cookie_for(1, role)
}

/// Create an account and a session cookie for it
async fn signed_in(pool: &PgPool, role: AccountRole) -> (i32, String) {
    let hash = hash_password("secret").unwrap();
    let account = Repository::new(pool.clone())
        .accounts
        .create("alice", &hash, role)
        .await
        .unwrap();
    (account.id, session_cookie_for(account.id, role))
}

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_protected_page_redirects_to_login() {
    for path in ["/", "/books/", "/books/lend/", "/members/", "/api/books/"] {
        let response = app()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", path);
        assert_eq!(location(&response), format!("/accounts/login/?next={}", path));
    }
}

#[tokio::test]
async fn test_form_post_without_session_redirects() {
    let response = app()
        .oneshot(
            Request::post("/members/3/delete/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts/login/?next=/members/3/delete/");
}

#[tokio::test]
async fn test_invalid_session_cookie_is_ignored() {
    let response = app()
        .oneshot(
            Request::get("/books/")
                .header(header::COOKIE, "libris_session=garbage")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_about_pages_are_public() {
    for path in ["/about/", "/about_us/"] {
        let response = app()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{}", path);
        assert!(body_text(response).await.contains("About Libris"));
    }
}

#[tokio::test]
async fn test_login_page_keeps_next() {
    let response = app()
        .oneshot(
            Request::get("/accounts/login/?next=/books/overdue/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    // the escaper may or may not encode slashes
    let html = body_text(response).await.replace("&#x2f;", "/");
    assert!(html.contains(r#"name="next" value="/books/overdue/""#));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_login_page_redirects_signed_in_user(pool: PgPool) {
    let (_, cookie) = signed_in(&pool, AccountRole::Assistant).await;

    let response = db_app(pool)
        .oneshot(
            Request::get("/accounts/login/?next=/books/lent/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/books/lent/");
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_add_book_requires_librarian_rights(pool: PgPool) {
    let (_, cookie) = signed_in(&pool, AccountRole::Assistant).await;

    let response = db_app(pool)
        .oneshot(
            Request::get("/books/add/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_add_book_form_for_librarian(pool: PgPool) {
    let (_, cookie) = signed_in(&pool, AccountRole::Librarian).await;

    let response = db_app(pool)
        .oneshot(
            Request::get("/books/add/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"action="/books/add/""#));
    assert!(html.contains("alice"));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_role_comes_from_account_not_cookie(pool: PgPool) {
    let (account_id, _) = signed_in(&pool, AccountRole::Assistant).await;
    // Token claims librarian rights the account does not have
    let cookie = session_cookie_for(account_id, AccountRole::Librarian);

    let response = db_app(pool)
        .oneshot(
            Request::get("/books/add/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn test_deactivated_account_session_is_rejected(pool: PgPool) {
    let (account_id, cookie) = signed_in(&pool, AccountRole::Librarian).await;

    sqlx::query("UPDATE accounts SET is_active = FALSE WHERE id = $1")
        .bind(account_id)
        .execute(&pool)
        .await
        .unwrap();

    let app = db_app(pool.clone());
    let response = app
        .clone()
        .oneshot(
            Request::get("/books/")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts/login/?next=/books/");

    // The bearer API rejects the same token
    let token = session_cookie_for(account_id, AccountRole::Librarian)
        .split_once('=')
        .map(|(_, token)| token.to_string())
        .unwrap();
    let response = app
        .oneshot(
            Request::get("/api/v1/books")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let response = app()
        .oneshot(
            Request::post("/accounts/logout/")
                .header(header::COOKIE, session_cookie(AccountRole::Admin))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/accounts/login/");

    let cleared = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|c| c.starts_with("libris_session=;") || c.starts_with("libris_session=\"\""));
    assert!(cleared);
}

#[tokio::test]
async fn test_api_health_is_public() {
    let response = app()
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("healthy"));
}

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let response = app()
        .oneshot(Request::get("/api/v1/books").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_text(response).await;
    assert!(body.contains("Missing authorization header"));
}

#[tokio::test]
async fn test_api_rejects_bad_token() {
    let response = app()
        .oneshot(
            Request::get("/api/v1/loans")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let response = app()
        .oneshot(
            Request::get("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("/loans/{id}/return"));
}
