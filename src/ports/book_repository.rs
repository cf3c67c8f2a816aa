use crate::domain::{Book, BookId};
use async_trait::async_trait;

use super::{Context, Result};

/// 書籍リポジトリポート
///
/// 永続化の実装は外部アダプターが提供する。
/// 存在しないIDに対する`get`/`update`/`delete`は`RepositoryError::NotFound`で失敗する。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// IDで書籍を取得する
    async fn get(&self, ctx: &Context, id: BookId) -> Result<Book>;

    /// タイトル・著者の部分一致で検索する（大文字小文字は区別しない）
    ///
    /// 該当なしは空のベクタ。空のクエリはすべての書籍に一致する。
    async fn search(&self, ctx: &Context, query: &str) -> Result<Vec<Book>>;

    /// 書籍を保存し、採番されたIDを返す
    async fn create(&self, ctx: &Context, book: &Book) -> Result<BookId>;

    /// 書籍を全置換で更新する
    async fn update(&self, ctx: &Context, book: &Book) -> Result<()>;

    /// 書籍を削除する
    async fn delete(&self, ctx: &Context, id: BookId) -> Result<()>;
}
