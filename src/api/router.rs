use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, borrow_book, change_password, create_book, create_user, delete_book, delete_user,
    get_book, get_user, list_user_loans, return_book, search_books, update_book, update_user,
};

/// Creates the API router
///
/// - /books: search, create, get, replace, delete
/// - /users: create, get, update, delete, change password
/// - /users/:id/loans: list, borrow, return
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/books", get(search_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/users", post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/users/:id/password", put(change_password))
        .route("/users/:id/loans", get(list_user_loans).post(borrow_book))
        .route("/users/:id/loans/:book_id/return", post(return_book))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
