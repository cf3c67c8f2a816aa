use serde::Deserialize;

use super::{BookId, UserId};

/// コマンド：書籍を登録する
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub amount: i32,
}

/// コマンド：利用者を登録する
///
/// `password` は平文。永続化前にハッシュ化される。
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl std::fmt::Debug for CreateUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateUser")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("email", &self.email)
            .finish()
    }
}

/// コマンド：書籍を借りる
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowBook {
    pub user_id: UserId,
    pub book_id: BookId,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnBook {
    pub user_id: UserId,
    pub book_id: BookId,
}
