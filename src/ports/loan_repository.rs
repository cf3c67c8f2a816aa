use crate::domain::{BookId, Loan, LoanId, UserId};
use async_trait::async_trait;

use super::{Context, Result};

/// 貸出リポジトリポート
///
/// 在庫の増減と貸出記録は実装側で原子的に行う。
/// 同時に最後の1冊を借りようとした場合、成功するのは1件だけでなければならない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// 書籍の在庫を1減らし、貸出を記録する
    ///
    /// 在庫が0の場合は`RepositoryError::OutOfStock`、
    /// 書籍が存在しない場合は`RepositoryError::NotFound`で失敗し、何も変更しない。
    async fn open(&self, ctx: &Context, loan: &Loan) -> Result<LoanId>;

    /// 返却を記録し、書籍の在庫を1戻す
    async fn close(&self, ctx: &Context, loan: &Loan) -> Result<()>;

    /// 利用者と書籍の組で未返却の貸出を探す
    async fn find_open(&self, ctx: &Context, user_id: UserId, book_id: BookId)
    -> Result<Option<Loan>>;

    /// 利用者の全貸出（貸出日の新しい順）
    async fn search_by_user(&self, ctx: &Context, user_id: UserId) -> Result<Vec<Loan>>;
}
