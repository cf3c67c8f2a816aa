use thiserror::Error;

/// エンティティの不変条件違反
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// タイトルが空
    #[error("title must not be empty")]
    EmptyTitle,

    /// 著者が空
    #[error("author must not be empty")]
    EmptyAuthor,

    /// 在庫数が負
    #[error("amount must not be negative (got {0})")]
    NegativeAmount(i32),

    /// ユーザー名が空
    #[error("username must not be empty")]
    EmptyUsername,

    /// パスワードが空
    #[error("password must not be empty")]
    EmptyPassword,

    /// メールアドレスの形式が不正
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

/// 貸出・返却のビジネスルール違反
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoanError {
    /// 既に返却済み
    #[error("loan has already been returned")]
    AlreadyReturned,

    /// 同じ書籍を既に借りている
    #[error("book is already borrowed by this user")]
    AlreadyBorrowed,

    /// 借りていない書籍の返却
    #[error("book is not borrowed by this user")]
    NotBorrowed,

    /// 貸出可能な在庫がない
    #[error("no copies of the book are available")]
    BookUnavailable,

    /// 延滞中の貸出がある
    #[error("user has an overdue loan")]
    HasOverdueLoan,

    /// 貸出上限を超えている
    #[error("loan limit exceeded (max {0} books)")]
    LoanLimitExceeded(usize),
}

/// パスワードハッシュ化のエラー
#[derive(Debug, Error)]
pub enum HashError {
    /// 入力長の上限を超えている
    #[error("password exceeds {max} bytes")]
    TooLong { max: usize },

    /// Argon2のエラー
    #[error("argon2: {0}")]
    Argon2(String),
}
