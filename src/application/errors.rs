use thiserror::Error;

use crate::domain::{HashError, LoanError, ValidationError};
use crate::ports::{BoxError, RepositoryError};

/// ユースケース層のエラー
///
/// 各操作は最初に発生したエラーを1つのバリアントで包んで即座に返す。
/// 入力不正とストレージ障害は同じ形になるため、区別するには原因
/// （`validation_error()`、`repository_error()`など）を調べる。
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("failed to get book: {0}")]
    GetBook(#[source] BoxError),

    #[error("failed to search books: {0}")]
    SearchBook(#[source] BoxError),

    #[error("failed to create book: {0}")]
    CreateBook(#[source] BoxError),

    #[error("failed to update book: {0}")]
    UpdateBook(#[source] BoxError),

    #[error("failed to delete book: {0}")]
    DeleteBook(#[source] BoxError),

    #[error("failed to get user: {0}")]
    GetUser(#[source] BoxError),

    #[error("failed to create user: {0}")]
    CreateUser(#[source] BoxError),

    #[error("failed to update user: {0}")]
    UpdateUser(#[source] BoxError),

    #[error("failed to delete user: {0}")]
    DeleteUser(#[source] BoxError),

    /// パスワードのハッシュ化に失敗
    #[error("failed to hash password: {0}")]
    HashingPassword(#[source] BoxError),

    #[error("failed to borrow book: {0}")]
    BorrowBook(#[source] BoxError),

    #[error("failed to return book: {0}")]
    ReturnBook(#[source] BoxError),

    #[error("failed to search user loans: {0}")]
    SearchUserLoans(#[source] BoxError),
}

/// エラーの種別（`ApplicationError`の判別子）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    GetBook,
    SearchBook,
    CreateBook,
    UpdateBook,
    DeleteBook,
    GetUser,
    CreateUser,
    UpdateUser,
    DeleteUser,
    HashingPassword,
    BorrowBook,
    ReturnBook,
    SearchUserLoans,
}

impl ErrorKind {
    /// 安定した文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::GetBook => "GET_BOOK",
            ErrorKind::SearchBook => "SEARCH_BOOK",
            ErrorKind::CreateBook => "CREATE_BOOK",
            ErrorKind::UpdateBook => "UPDATE_BOOK",
            ErrorKind::DeleteBook => "DELETE_BOOK",
            ErrorKind::GetUser => "GET_USER",
            ErrorKind::CreateUser => "CREATE_USER",
            ErrorKind::UpdateUser => "UPDATE_USER",
            ErrorKind::DeleteUser => "DELETE_USER",
            ErrorKind::HashingPassword => "HASHING_PASSWORD",
            ErrorKind::BorrowBook => "BORROW_BOOK",
            ErrorKind::ReturnBook => "RETURN_BOOK",
            ErrorKind::SearchUserLoans => "SEARCH_USER_LOANS",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApplicationError::GetBook(_) => ErrorKind::GetBook,
            ApplicationError::SearchBook(_) => ErrorKind::SearchBook,
            ApplicationError::CreateBook(_) => ErrorKind::CreateBook,
            ApplicationError::UpdateBook(_) => ErrorKind::UpdateBook,
            ApplicationError::DeleteBook(_) => ErrorKind::DeleteBook,
            ApplicationError::GetUser(_) => ErrorKind::GetUser,
            ApplicationError::CreateUser(_) => ErrorKind::CreateUser,
            ApplicationError::UpdateUser(_) => ErrorKind::UpdateUser,
            ApplicationError::DeleteUser(_) => ErrorKind::DeleteUser,
            ApplicationError::HashingPassword(_) => ErrorKind::HashingPassword,
            ApplicationError::BorrowBook(_) => ErrorKind::BorrowBook,
            ApplicationError::ReturnBook(_) => ErrorKind::ReturnBook,
            ApplicationError::SearchUserLoans(_) => ErrorKind::SearchUserLoans,
        }
    }

    /// 包まれた原因
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        match self {
            ApplicationError::GetBook(e)
            | ApplicationError::SearchBook(e)
            | ApplicationError::CreateBook(e)
            | ApplicationError::UpdateBook(e)
            | ApplicationError::DeleteBook(e)
            | ApplicationError::GetUser(e)
            | ApplicationError::CreateUser(e)
            | ApplicationError::UpdateUser(e)
            | ApplicationError::DeleteUser(e)
            | ApplicationError::HashingPassword(e)
            | ApplicationError::BorrowBook(e)
            | ApplicationError::ReturnBook(e)
            | ApplicationError::SearchUserLoans(e) => e.as_ref(),
        }
    }

    /// 原因が入力の不変条件違反ならそれを返す
    pub fn validation_error(&self) -> Option<&ValidationError> {
        self.cause().downcast_ref()
    }

    /// 原因がリポジトリの既知のエラーならそれを返す
    pub fn repository_error(&self) -> Option<&RepositoryError> {
        self.cause().downcast_ref()
    }

    /// 原因が貸出ルール違反ならそれを返す
    pub fn loan_error(&self) -> Option<&LoanError> {
        self.cause().downcast_ref()
    }

    pub fn hash_error(&self) -> Option<&HashError> {
        self.cause().downcast_ref()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self.repository_error(),
            Some(RepositoryError::NotFound { .. })
        )
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, ApplicationError>;
