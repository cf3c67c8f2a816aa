use crate::application::Usecases;
use crate::domain::{
    BookId, UserId,
    commands::{BorrowBook, CreateBook, CreateUser, ReturnBook},
};
use crate::ports::Context;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use std::time::Duration;

use super::{
    error::ApiError,
    types::{
        BookResponse, BorrowBookRequest, ChangePasswordRequest, CreatedResponse, LoanResponse,
        SearchBooksQuery, UpdateBookRequest, UpdateUserRequest, UserResponse,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub usecases: Usecases,
    /// リクエストごとのストレージ呼び出し期限
    pub request_timeout: Duration,
}

impl AppState {
    fn context(&self) -> Context {
        Context::background().with_timeout(self.request_timeout)
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Books
// ============================================================================

/// GET /books?q= - 書籍を検索
pub async fn search_books(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchBooksQuery>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    let books = state
        .usecases
        .books
        .search_book(&state.context(), query.q.as_deref().unwrap_or(""))
        .await?;

    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// POST /books - 書籍を登録
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(cmd): Json<CreateBook>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let id = state.usecases.books.create_book(&state.context(), cmd).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: id.value() })))
}

/// GET /books/:id
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<BookResponse>> {
    let book = state
        .usecases
        .books
        .get_book(&state.context(), BookId::new(id))
        .await?;

    Ok(Json(BookResponse::from(book)))
}

/// PUT /books/:id - 書籍を全置換で更新
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateBookRequest>,
) -> ApiResult<Json<BookResponse>> {
    let ctx = state.context();
    let mut book = state.usecases.books.get_book(&ctx, BookId::new(id)).await?;

    book.title = req.title;
    book.author = req.author;
    book.amount = req.amount;
    state.usecases.books.update_book(&ctx, &mut book).await?;

    Ok(Json(BookResponse::from(book)))
}

/// DELETE /books/:id
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .usecases
        .books
        .delete_book(&state.context(), BookId::new(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Users
// ============================================================================

/// POST /users - 利用者を登録
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(cmd): Json<CreateUser>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let id = state.usecases.users.create_user(&state.context(), cmd).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: id.value() })))
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserResponse>> {
    let user = state
        .usecases
        .users
        .get_user(&state.context(), UserId::new(id))
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// PUT /users/:id - 利用者を更新
///
/// `password`が指定された場合は形式に関わらず平文として扱い、
/// `change_password`で必ずハッシュ化する。
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let ctx = state.context();
    let id = UserId::new(id);

    if let Some(password) = &req.password {
        state.usecases.users.change_password(&ctx, id, password).await?;
    }

    // パスワードは保存済みのハッシュのまま
    let mut user = state.usecases.users.get_user(&ctx, id).await?;
    user.username = req.username;
    user.email = req.email;
    state.usecases.users.update_user(&ctx, &mut user).await?;

    Ok(Json(UserResponse::from(user)))
}

/// PUT /users/:id/password - パスワードを変更
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    state
        .usecases
        .users
        .change_password(&state.context(), UserId::new(id), &req.password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .usecases
        .users
        .delete_user(&state.context(), UserId::new(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Loans
// ============================================================================

/// GET /users/:id/loans - 利用者の貸出履歴
pub async fn list_user_loans(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<LoanResponse>>> {
    let loans = state
        .usecases
        .loans
        .search_user_loans(&state.context(), UserId::new(id))
        .await?;

    let now = chrono::Utc::now();
    Ok(Json(
        loans
            .into_iter()
            .map(|loan| LoanResponse::at(loan, now))
            .collect(),
    ))
}

/// POST /users/:id/loans - 書籍を借りる
pub async fn borrow_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<BorrowBookRequest>,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let cmd = BorrowBook {
        user_id: UserId::new(id),
        book_id: req.book_id,
    };
    let loan_id = state.usecases.loans.borrow_book(&state.context(), cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: loan_id.value(),
        }),
    ))
}

/// POST /users/:id/loans/:book_id/return - 書籍を返却
pub async fn return_book(
    State(state): State<Arc<AppState>>,
    Path((user_id, book_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    let cmd = ReturnBook {
        user_id: UserId::new(user_id),
        book_id: BookId::new(book_id),
    };
    state.usecases.loans.return_book(&state.context(), cmd).await?;

    Ok(StatusCode::NO_CONTENT)
}
