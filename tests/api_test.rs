use axum::body::Body;
use axum::http::{Request, StatusCode};
use public_library::api::{
    AppState, BookResponse, CreatedResponse, ErrorResponse, LoanResponse, UserResponse,
    create_router,
};
use public_library::adapters::memory::MemoryStore;
use public_library::domain::{LoanStatus, UserId};
use public_library::ports::{Context, UserRepository};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

mod common;

// ============================================================================
// ヘルパー関数
// ============================================================================

fn setup_app() -> axum::Router {
    setup_app_with_store().1
}

/// ストアを直接確認するテスト用
fn setup_app_with_store() -> (Arc<MemoryStore>, axum::Router) {
    let (store, usecases) = common::memory_usecases();
    let app_state = Arc::new(AppState {
        usecases,
        request_timeout: Duration::from_secs(5),
    });
    (store, create_router(app_state))
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> axum::response::Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

async fn read_json<T: DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn create_book(app: &axum::Router, title: &str, amount: i32) -> i64 {
    let response = send(
        app,
        "POST",
        "/books",
        Some(json!({ "title": title, "author": "Author", "amount": amount })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json::<CreatedResponse>(response).await.id
}

async fn create_user(app: &axum::Router, username: &str) -> i64 {
    let response = send(
        app,
        "POST",
        "/users",
        Some(json!({
            "username": username,
            "password": "s3cret",
            "email": format!("{}@example.com", username),
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json::<CreatedResponse>(response).await.id
}

// ============================================================================
// テスト
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();

    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_book_crud_flow() {
    let app = setup_app();

    let id = create_book(&app, "Snow Crash", 2).await;

    let response = send(&app, "GET", &format!("/books/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let book: BookResponse = read_json(response).await;
    assert_eq!(book.title, "Snow Crash");
    assert_eq!(book.amount, 2);

    let response = send(
        &app,
        "PUT",
        &format!("/books/{}", id),
        Some(json!({ "title": "Snow Crash", "author": "Neal Stephenson", "amount": 3 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let book: BookResponse = read_json(response).await;
    assert_eq!(book.author, "Neal Stephenson");
    assert_eq!(book.amount, 3);

    let response = send(&app, "GET", "/books?q=snow", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let books: Vec<BookResponse> = read_json(response).await;
    assert_eq!(books.len(), 1);

    let response = send(&app, "DELETE", &format!("/books/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &format!("/books/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "NOT_FOUND");
}

#[tokio::test]
async fn test_create_book_negative_amount_is_unprocessable() {
    let app = setup_app();

    let response = send(
        &app,
        "POST",
        "/books",
        Some(json!({ "title": "Bad", "author": "Author", "amount": -1 })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_user_response_never_contains_password() {
    let app = setup_app();
    let id = create_user(&app, "alice").await;

    let response = send(&app, "GET", &format!("/users/{}", id), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = read_json(response).await;
    assert_eq!(body["username"], "alice");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_update_user_and_change_password() {
    let app = setup_app();
    let id = create_user(&app, "bob").await;

    let response = send(
        &app,
        "PUT",
        &format!("/users/{}", id),
        Some(json!({ "username": "bobby", "email": "bobby@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let user: UserResponse = read_json(response).await;
    assert_eq!(user.username, "bobby");

    let response = send(
        &app,
        "PUT",
        &format!("/users/{}/password", id),
        Some(json!({ "password": "rotated" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app,
        "PUT",
        &format!("/users/{}/password", id),
        Some(json!({ "password": "" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_user_always_hashes_supplied_password() {
    let (store, app) = setup_app_with_store();
    let id = create_user(&app, "heidi").await;

    // PHC形式の文字列も平文として扱われる
    let submitted = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
    let response = send(
        &app,
        "PUT",
        &format!("/users/{}", id),
        Some(json!({
            "username": "heidi",
            "email": "heidi@example.com",
            "password": submitted,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = store
        .get(&Context::background(), UserId::new(id))
        .await
        .unwrap();
    assert_ne!(stored.password, submitted);
    assert!(common::test_hasher().verify(submitted, &stored.password));
}

#[tokio::test]
async fn test_update_user_without_password_keeps_hash() {
    let (store, app) = setup_app_with_store();
    let id = create_user(&app, "ivan").await;
    let ctx = Context::background();
    let before = store.get(&ctx, UserId::new(id)).await.unwrap().password;

    let response = send(
        &app,
        "PUT",
        &format!("/users/{}", id),
        Some(json!({ "username": "ivan", "email": "ivan@library.example" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let stored = store.get(&ctx, UserId::new(id)).await.unwrap();
    assert_eq!(stored.password, before);
    assert_eq!(stored.email, "ivan@library.example");
}

#[tokio::test]
async fn test_create_user_invalid_email() {
    let app = setup_app();

    let response = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "username": "carol", "password": "pw", "email": "not-an-email" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_create_user_duplicate_username_conflicts() {
    let app = setup_app();
    create_user(&app, "dave").await;

    let response = send(
        &app,
        "POST",
        "/users",
        Some(json!({ "username": "dave", "password": "pw", "email": "dave2@example.com" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "ALREADY_EXISTS");
}

#[tokio::test]
async fn test_loan_flow() {
    let app = setup_app();
    let user_id = create_user(&app, "erin").await;
    let book_id = create_book(&app, "Neuromancer", 1).await;

    // 貸出
    let response = send(
        &app,
        "POST",
        &format!("/users/{}/loans", user_id),
        Some(json!({ "book_id": book_id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // 在庫切れ
    let other = create_user(&app, "frank").await;
    let response = send(
        &app,
        "POST",
        &format!("/users/{}/loans", other),
        Some(json!({ "book_id": book_id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "BOOK_UNAVAILABLE");

    // 貸出一覧
    let response = send(&app, "GET", &format!("/users/{}/loans", user_id), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let loans: Vec<LoanResponse> = read_json(response).await;
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].book_id, book_id);
    assert_eq!(loans[0].status, LoanStatus::Open);

    // 返却
    let uri = format!("/users/{}/loans/{}/return", user_id, book_id);
    let response = send(&app, "POST", &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "POST", &uri, None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "NOT_BORROWED");

    let response = send(&app, "GET", &format!("/books/{}", book_id), None).await;
    let book: BookResponse = read_json(response).await;
    assert_eq!(book.amount, 1);
}

#[tokio::test]
async fn test_borrow_unknown_book_is_not_found() {
    let app = setup_app();
    let user_id = create_user(&app, "grace").await;

    let response = send(
        &app,
        "POST",
        &format!("/users/{}/loans", user_id),
        Some(json!({ "book_id": 999 })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
