use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

use crate::domain::{
    Loan, LoanError, LoanId, UserId,
    commands::{BorrowBook, ReturnBook},
};
use crate::ports::{BookRepository, Context, LoanRepository, UserRepository};

use super::errors::{ApplicationError, Result};

/// 利用者1人あたりの最大貸出冊数
pub const MAX_OPEN_LOANS: usize = 5;

/// 貸出ユースケース
#[async_trait]
pub trait LoanUsecase: Send + Sync {
    /// 書籍を借りる
    ///
    /// ビジネスルール：
    /// - 利用者・書籍が存在すること
    /// - 同じ書籍を借りていないこと
    /// - 延滞中の貸出がないこと
    /// - 貸出中の冊数が上限未満であること
    /// - 在庫があること（最終判定はリポジトリが原子的に行う）
    ///
    /// # 引数
    /// * `ctx` - キャンセル・期限を運ぶコンテキスト
    /// * `cmd` - 利用者IDと書籍ID
    ///
    /// # 戻り値
    /// 作成された貸出のID
    ///
    /// # エラー
    /// - BorrowBook: 利用者・書籍が存在しない、`LoanError`のルール違反、
    ///   在庫の引き当てに失敗（`RepositoryError::OutOfStock`）、またはストレージ障害
    async fn borrow_book(&self, ctx: &Context, cmd: BorrowBook) -> Result<LoanId>;

    /// 書籍を返却する（延滞中でも受け付ける）
    ///
    /// 在庫は1冊戻される。
    ///
    /// # エラー
    /// - ReturnBook: 借りていない（`LoanError::NotBorrowed`）、またはストレージ障害
    async fn return_book(&self, ctx: &Context, cmd: ReturnBook) -> Result<()>;

    /// 利用者の貸出履歴（新しい順）
    ///
    /// # エラー
    /// - SearchUserLoans: ストレージ障害
    async fn search_user_loans(&self, ctx: &Context, user_id: UserId) -> Result<Vec<Loan>>;
}

/// サービスの依存関係
#[derive(Clone)]
pub struct LoanService {
    loan_repo: Arc<dyn LoanRepository>,
    book_repo: Arc<dyn BookRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl LoanService {
    pub fn new(
        loan_repo: Arc<dyn LoanRepository>,
        book_repo: Arc<dyn BookRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            loan_repo,
            book_repo,
            user_repo,
        }
    }
}

fn borrow_rule(err: LoanError) -> ApplicationError {
    ApplicationError::BorrowBook(err.into())
}

#[async_trait]
impl LoanUsecase for LoanService {
    #[instrument(skip(self, ctx), err(level = "warn"))]
    async fn borrow_book(&self, ctx: &Context, cmd: BorrowBook) -> Result<LoanId> {
        let now = Utc::now();

        // 1. 利用者の存在確認
        self.user_repo
            .get(ctx, cmd.user_id)
            .await
            .map_err(ApplicationError::BorrowBook)?;

        // 2. 書籍の存在確認
        let book = self
            .book_repo
            .get(ctx, cmd.book_id)
            .await
            .map_err(ApplicationError::BorrowBook)?;

        // 3. 利用者の貸出状況の確認
        let loans = self
            .loan_repo
            .search_by_user(ctx, cmd.user_id)
            .await
            .map_err(ApplicationError::BorrowBook)?;
        let open: Vec<&Loan> = loans.iter().filter(|l| l.is_open()).collect();

        if open.iter().any(|l| l.book_id == cmd.book_id) {
            return Err(borrow_rule(LoanError::AlreadyBorrowed));
        }
        if open.iter().any(|l| l.is_overdue(now)) {
            return Err(borrow_rule(LoanError::HasOverdueLoan));
        }
        if open.len() >= MAX_OPEN_LOANS {
            return Err(borrow_rule(LoanError::LoanLimitExceeded(MAX_OPEN_LOANS)));
        }

        // 4. 在庫確認（早期判定）
        if !book.is_available() {
            return Err(borrow_rule(LoanError::BookUnavailable));
        }

        // 5. 在庫の引き当てと貸出記録
        let loan = Loan::borrow(cmd.user_id, cmd.book_id, now);
        let loan_id = self
            .loan_repo
            .open(ctx, &loan)
            .await
            .map_err(ApplicationError::BorrowBook)?;

        tracing::info!(loan_id = %loan_id, due_date = %loan.due_date, "book borrowed");
        Ok(loan_id)
    }

    #[instrument(skip(self, ctx), err(level = "warn"))]
    async fn return_book(&self, ctx: &Context, cmd: ReturnBook) -> Result<()> {
        let mut loan = self
            .loan_repo
            .find_open(ctx, cmd.user_id, cmd.book_id)
            .await
            .map_err(ApplicationError::ReturnBook)?
            .ok_or_else(|| ApplicationError::ReturnBook(LoanError::NotBorrowed.into()))?;

        let now = Utc::now();
        let was_overdue = loan.is_overdue(now);
        loan.mark_returned(now)
            .map_err(|e| ApplicationError::ReturnBook(e.into()))?;

        self.loan_repo
            .close(ctx, &loan)
            .await
            .map_err(ApplicationError::ReturnBook)?;

        tracing::info!(loan_id = %loan.id, was_overdue, "book returned");
        Ok(())
    }

    #[instrument(skip(self, ctx), err(level = "warn"))]
    async fn search_user_loans(&self, ctx: &Context, user_id: UserId) -> Result<Vec<Loan>> {
        self.loan_repo
            .search_by_user(ctx, user_id)
            .await
            .map_err(ApplicationError::SearchUserLoans)
    }
}
