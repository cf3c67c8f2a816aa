pub mod book_repository;
pub mod context;
pub mod errors;
pub mod loan_repository;
pub mod user_repository;

pub use book_repository::BookRepository;
pub use context::{CancelHandle, Context};
pub use errors::RepositoryError;
pub use loan_repository::LoanRepository;
pub use user_repository::UserRepository;

/// ポート共通のエラー型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// ポート共通の Result型
pub type Result<T> = std::result::Result<T, BoxError>;
