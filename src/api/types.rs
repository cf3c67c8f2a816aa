use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Book, BookId, Loan, LoanStatus, User};

/// 書籍検索のクエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct SearchBooksQuery {
    /// タイトル・著者の部分一致
    pub q: Option<String>,
}

/// 書籍更新リクエスト（全置換）
#[derive(Debug, Deserialize)]
pub struct UpdateBookRequest {
    pub title: String,
    pub author: String,
    pub amount: i32,
}

/// 利用者更新リクエスト
///
/// `password`を省略した場合は現在のハッシュを保つ。
#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
}

impl std::fmt::Debug for UpdateUserRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateUserRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// パスワード変更リクエスト
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

/// 貸出リクエスト（POST /users/:id/loans）
#[derive(Debug, Deserialize)]
pub struct BorrowBookRequest {
    pub book_id: BookId,
}

/// 作成されたリソースのID
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
}

/// 書籍レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub amount: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.value(),
            title: book.title,
            author: book.author,
            amount: book.amount,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// 利用者レスポンス（パスワードは含めない）
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.value(),
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// 貸出レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanResponse {
    pub id: i64,
    pub user_id: i64,
    pub book_id: i64,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

impl LoanResponse {
    /// `now`時点のステータスで変換する
    pub fn at(loan: Loan, now: DateTime<Utc>) -> Self {
        let status = loan.status(now);
        Self {
            id: loan.id.value(),
            user_id: loan.user_id.value(),
            book_id: loan.book_id.value(),
            borrowed_at: loan.borrowed_at,
            due_date: loan.due_date,
            returned_at: loan.returned_at,
            status,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
