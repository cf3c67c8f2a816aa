//! インメモリのリポジトリ実装
//!
//! 1つのロックで書籍・利用者・貸出をまとめて保持するため、
//! 貸出時の在庫引き当てと貸出記録は原子的に行われる。

mod book_repository;
mod loan_repository;
mod user_repository;

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::{Book, BookId, Loan, LoanId, User, UserId};
use crate::ports::{Context, Result};

#[derive(Default)]
struct State {
    books: BTreeMap<BookId, Book>,
    users: BTreeMap<UserId, User>,
    loans: BTreeMap<LoanId, Loan>,
    next_book_id: i64,
    next_user_id: i64,
    next_loan_id: i64,
}

impl State {
    fn next_book_id(&mut self) -> BookId {
        self.next_book_id += 1;
        BookId::new(self.next_book_id)
    }

    fn next_user_id(&mut self) -> UserId {
        self.next_user_id += 1;
        UserId::new(self.next_user_id)
    }

    fn next_loan_id(&mut self) -> LoanId {
        self.next_loan_id += 1;
        LoanId::new(self.next_loan_id)
    }
}

/// 書籍・利用者・貸出のインメモリストア
///
/// `BookRepository`、`UserRepository`、`LoanRepository`をすべて実装する。
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// コンテキストを確認してからロックを取る
    fn lock(&self, ctx: &Context) -> Result<MutexGuard<'_, State>> {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }
        self.state
            .lock()
            .map_err(|_| "memory store lock poisoned".into())
    }
}
