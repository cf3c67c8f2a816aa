mod book_usecase;
mod errors;
mod loan_usecase;
mod user_usecase;

use std::sync::Arc;

use crate::domain::PasswordHasher;
use crate::ports::{BookRepository, LoanRepository, UserRepository};

pub use book_usecase::{BookService, BookUsecase};
pub use errors::{ApplicationError, ErrorKind, Result};
pub use loan_usecase::{LoanService, LoanUsecase, MAX_OPEN_LOANS};
pub use user_usecase::{UserService, UserUsecase};

/// ユースケースの集合
///
/// 構成時にリポジトリ実装を注入し、以後は不変。
#[derive(Clone)]
pub struct Usecases {
    pub books: Arc<dyn BookUsecase>,
    pub users: Arc<dyn UserUsecase>,
    pub loans: Arc<dyn LoanUsecase>,
}

impl Usecases {
    pub fn new(
        book_repo: Arc<dyn BookRepository>,
        user_repo: Arc<dyn UserRepository>,
        loan_repo: Arc<dyn LoanRepository>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            books: Arc::new(BookService::new(book_repo.clone())),
            users: Arc::new(UserService::new(user_repo.clone(), hasher)),
            loans: Arc::new(LoanService::new(loan_repo, book_repo, user_repo)),
        }
    }
}
