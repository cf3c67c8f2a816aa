use crate::domain::{User, UserId};
use async_trait::async_trait;

use super::{Context, Result};

/// 利用者リポジトリポート
///
/// ユーザー名の一意性はストレージが保証し、
/// 重複時は`RepositoryError::Duplicate`で失敗する。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, ctx: &Context, id: UserId) -> Result<User>;

    /// 利用者を保存し、採番されたIDを返す
    async fn create(&self, ctx: &Context, user: &User) -> Result<UserId>;

    async fn update(&self, ctx: &Context, user: &User) -> Result<()>;

    async fn delete(&self, ctx: &Context, id: UserId) -> Result<()>;
}
