pub mod book;
pub mod commands;
pub mod errors;
pub mod loan;
pub mod password;
pub mod user;
pub mod value_objects;

pub use book::Book;
pub use errors::*;
pub use loan::{Loan, LoanStatus};
pub use password::PasswordHasher;
pub use user::User;
pub use value_objects::*;
