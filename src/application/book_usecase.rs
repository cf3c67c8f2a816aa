use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

use crate::domain::{Book, BookId, commands::CreateBook};
use crate::ports::{BookRepository, Context};

use super::errors::{ApplicationError, Result};

/// 書籍ユースケース
#[async_trait]
pub trait BookUsecase: Send + Sync {
    /// 書籍を取得する
    ///
    /// # エラー
    /// - GetBook: 存在しない（原因は`RepositoryError::NotFound`）、またはストレージ障害
    async fn get_book(&self, ctx: &Context, id: BookId) -> Result<Book>;

    /// タイトル・著者の部分一致で検索する
    ///
    /// 該当なしはエラーではなく空のベクタ。
    ///
    /// # 引数
    /// * `ctx` - キャンセル・期限を運ぶコンテキスト
    /// * `query` - 検索文字列（空文字はすべての書籍に一致）
    ///
    /// # エラー
    /// - SearchBook: ストレージ障害
    async fn search_book(&self, ctx: &Context, query: &str) -> Result<Vec<Book>>;

    /// 書籍を登録する
    ///
    /// # 引数
    /// * `ctx` - キャンセル・期限を運ぶコンテキスト
    /// * `cmd` - 登録内容
    ///
    /// # 戻り値
    /// ストレージが採番した書籍ID
    ///
    /// # エラー
    /// - CreateBook: 入力の不変条件違反（リポジトリは呼ばれない）、またはストレージ障害
    async fn create_book(&self, ctx: &Context, cmd: CreateBook) -> Result<BookId>;

    /// 全置換の更新。`updated_at`を現在時刻に進めてから検証・保存する
    ///
    /// # エラー
    /// - UpdateBook: 不変条件違反、存在しない、またはストレージ障害
    async fn update_book(&self, ctx: &Context, book: &mut Book) -> Result<()>;

    /// 書籍を削除する（その書籍の貸出も削除される）
    ///
    /// # エラー
    /// - DeleteBook: 存在しない、またはストレージ障害
    async fn delete_book(&self, ctx: &Context, id: BookId) -> Result<()>;
}

/// リポジトリに委譲する`BookUsecase`の実装
#[derive(Clone)]
pub struct BookService {
    book_repo: Arc<dyn BookRepository>,
}

impl BookService {
    pub fn new(book_repo: Arc<dyn BookRepository>) -> Self {
        Self { book_repo }
    }
}

#[async_trait]
impl BookUsecase for BookService {
    #[instrument(skip(self, ctx), err(level = "warn"))]
    async fn get_book(&self, ctx: &Context, id: BookId) -> Result<Book> {
        self.book_repo
            .get(ctx, id)
            .await
            .map_err(ApplicationError::GetBook)
    }

    #[instrument(skip(self, ctx), err(level = "warn"))]
    async fn search_book(&self, ctx: &Context, query: &str) -> Result<Vec<Book>> {
        self.book_repo
            .search(ctx, query)
            .await
            .map_err(ApplicationError::SearchBook)
    }

    #[instrument(skip(self, ctx), err(level = "warn"))]
    async fn create_book(&self, ctx: &Context, cmd: CreateBook) -> Result<BookId> {
        // 1. 不変条件を検証（リポジトリ呼び出し前）
        let book = Book::new(cmd.title, cmd.author, cmd.amount)
            .map_err(|e| ApplicationError::CreateBook(e.into()))?;

        // 2. 永続化
        let id = self
            .book_repo
            .create(ctx, &book)
            .await
            .map_err(ApplicationError::CreateBook)?;

        tracing::debug!(book_id = %id, "book created");
        Ok(id)
    }

    #[instrument(skip(self, ctx), fields(book_id = %book.id), err(level = "warn"))]
    async fn update_book(&self, ctx: &Context, book: &mut Book) -> Result<()> {
        book.touch(Utc::now());

        book.validate()
            .map_err(|e| ApplicationError::UpdateBook(e.into()))?;

        self.book_repo
            .update(ctx, book)
            .await
            .map_err(ApplicationError::UpdateBook)
    }

    #[instrument(skip(self, ctx), err(level = "warn"))]
    async fn delete_book(&self, ctx: &Context, id: BookId) -> Result<()> {
        self.book_repo
            .delete(ctx, id)
            .await
            .map_err(ApplicationError::DeleteBook)
    }
}
