use thiserror::Error;

/// リポジトリ実装が返す型付きエラー
///
/// ポートのエラーは`Box<dyn Error>`だが、呼び出し側が原因を判別できるように
/// 既知の失敗はこの型で返す。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// エンティティが存在しない
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// 一意制約違反
    #[error("{entity} with {field} {value:?} already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// 在庫切れ
    #[error("book {book_id} is out of stock")]
    OutOfStock { book_id: i64 },

    /// 呼び出し元によるキャンセル
    #[error("operation cancelled")]
    Cancelled,

    /// 期限切れ
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

impl RepositoryError {
    pub fn book_not_found(id: i64) -> Self {
        RepositoryError::NotFound { entity: "book", id }
    }

    pub fn user_not_found(id: i64) -> Self {
        RepositoryError::NotFound { entity: "user", id }
    }

    pub fn loan_not_found(id: i64) -> Self {
        RepositoryError::NotFound { entity: "loan", id }
    }

    pub fn duplicate_username(username: impl Into<String>) -> Self {
        RepositoryError::Duplicate {
            entity: "user",
            field: "username",
            value: username.into(),
        }
    }
}
