use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;

use crate::domain::{PasswordHasher, User, UserId, ValidationError, commands::CreateUser};
use crate::ports::{Context, UserRepository};

use super::errors::{ApplicationError, Result};

/// 利用者ユースケース
#[async_trait]
pub trait UserUsecase: Send + Sync {
    async fn get_user(&self, ctx: &Context, id: UserId) -> Result<User>;

    /// 検証 → パスワードのハッシュ化 → 永続化
    ///
    /// # 引数
    /// * `ctx` - キャンセル・期限を運ぶコンテキスト
    /// * `cmd` - 登録内容（パスワードは平文）
    ///
    /// # 戻り値
    /// ストレージが採番した利用者ID
    ///
    /// # エラー
    /// - CreateUser: 入力の不変条件違反、ユーザー名の重複、またはストレージ障害
    /// - HashingPassword: パスワードが長すぎる、またはハッシュ化に失敗
    async fn create_user(&self, ctx: &Context, cmd: CreateUser) -> Result<UserId>;

    /// 全置換の更新
    ///
    /// `password`がハッシュでなければハッシュ化してから保存する。
    /// 既にハッシュであればそのまま保存する（二重ハッシュ化しない）。
    /// 利用者が指定したパスワードは`change_password`で変更すること。
    ///
    /// # エラー
    /// - UpdateUser: 不変条件違反、存在しない、ユーザー名の重複、またはストレージ障害
    /// - HashingPassword: ハッシュ化に失敗
    async fn update_user(&self, ctx: &Context, user: &mut User) -> Result<()>;

    /// 利用者を削除する
    ///
    /// 未返却の貸出があれば、その分の在庫は書籍に戻される。
    ///
    /// # エラー
    /// - DeleteUser: 存在しない、またはストレージ障害
    async fn delete_user(&self, ctx: &Context, id: UserId) -> Result<()>;

    /// パスワードだけを変更する
    ///
    /// `new_password`は形式に関わらず平文として扱い、必ずハッシュ化する。
    ///
    /// # 引数
    /// * `ctx` - キャンセル・期限を運ぶコンテキスト
    /// * `id` - 利用者ID
    /// * `new_password` - 新しいパスワード（平文）
    ///
    /// # エラー
    /// - UpdateUser: 空のパスワード、存在しない、またはストレージ障害
    /// - HashingPassword: パスワードが長すぎる、またはハッシュ化に失敗
    async fn change_password(&self, ctx: &Context, id: UserId, new_password: &str) -> Result<()>;
}

/// リポジトリに委譲する`UserUsecase`の実装
#[derive(Clone)]
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, hasher: PasswordHasher) -> Self {
        Self { user_repo, hasher }
    }

    fn hash_password(&self, plain: &str) -> Result<String> {
        self.hasher
            .hash(plain)
            .map_err(|e| ApplicationError::HashingPassword(e.into()))
    }
}

#[async_trait]
impl UserUsecase for UserService {
    #[instrument(skip(self, ctx), err(level = "warn"))]
    async fn get_user(&self, ctx: &Context, id: UserId) -> Result<User> {
        self.user_repo
            .get(ctx, id)
            .await
            .map_err(ApplicationError::GetUser)
    }

    #[instrument(skip(self, ctx, cmd), fields(username = %cmd.username), err(level = "warn"))]
    async fn create_user(&self, ctx: &Context, cmd: CreateUser) -> Result<UserId> {
        // 1. 不変条件を検証
        let mut user = User::new(cmd.username, cmd.password, cmd.email)
            .map_err(|e| ApplicationError::CreateUser(e.into()))?;

        // 2. 平文を置き換える
        user.password = self.hash_password(&user.password)?;

        // 3. 永続化
        let id = self
            .user_repo
            .create(ctx, &user)
            .await
            .map_err(ApplicationError::CreateUser)?;

        tracing::debug!(user_id = %id, "user created");
        Ok(id)
    }

    #[instrument(skip(self, ctx, user), fields(user_id = %user.id), err(level = "warn"))]
    async fn update_user(&self, ctx: &Context, user: &mut User) -> Result<()> {
        user.touch(Utc::now());

        user.validate()
            .map_err(|e| ApplicationError::UpdateUser(e.into()))?;

        if !PasswordHasher::is_hash(&user.password) {
            tracing::debug!("hashing plaintext password on update");
            user.password = self.hash_password(&user.password)?;
        }

        self.user_repo
            .update(ctx, user)
            .await
            .map_err(ApplicationError::UpdateUser)
    }

    #[instrument(skip(self, ctx), err(level = "warn"))]
    async fn delete_user(&self, ctx: &Context, id: UserId) -> Result<()> {
        self.user_repo
            .delete(ctx, id)
            .await
            .map_err(ApplicationError::DeleteUser)
    }

    #[instrument(skip(self, ctx, new_password), err(level = "warn"))]
    async fn change_password(&self, ctx: &Context, id: UserId, new_password: &str) -> Result<()> {
        if new_password.is_empty() {
            return Err(ApplicationError::UpdateUser(
                ValidationError::EmptyPassword.into(),
            ));
        }

        let mut user = self
            .user_repo
            .get(ctx, id)
            .await
            .map_err(ApplicationError::UpdateUser)?;

        user.password = self.hash_password(new_password)?;
        user.touch(Utc::now());

        self.user_repo
            .update(ctx, &user)
            .await
            .map_err(ApplicationError::UpdateUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::RepositoryError;
    use crate::ports::user_repository::MockUserRepository;
    use argon2::Params;

    fn fast_hasher() -> PasswordHasher {
        PasswordHasher::new(Params::MIN_M_COST, 1, 1).unwrap()
    }

    fn service(repo: MockUserRepository) -> UserService {
        UserService::new(Arc::new(repo), fast_hasher())
    }

    fn cmd(username: &str, password: &str, email: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_stores_hash_not_plaintext() {
        let hasher = fast_hasher();
        let mut repo = MockUserRepository::new();
        repo.expect_create()
            .withf(move |_, user| {
                user.password != "secret123" && hasher.verify("secret123", &user.password)
            })
            .times(1)
            .returning(|_, _| Ok(UserId::new(1)));

        let id = service(repo)
            .create_user(&Context::background(), cmd("alice", "secret123", "a@b.com"))
            .await
            .unwrap();

        assert_eq!(id, UserId::new(1));
    }

    #[tokio::test]
    async fn test_create_user_validation_fails_before_repository() {
        let mut repo = MockUserRepository::new();
        repo.expect_create().never();

        let err = service(repo)
            .create_user(&Context::background(), cmd("alice", "secret123", "not-an-email"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::CreateUser(_)));
        assert!(matches!(
            err.validation_error(),
            Some(ValidationError::InvalidEmail(_))
        ));
    }

    #[tokio::test]
    async fn test_create_user_hashing_failure() {
        let mut repo = MockUserRepository::new();
        repo.expect_create().never();

        let long = "x".repeat(crate::domain::password::MAX_PASSWORD_BYTES + 1);
        let err = service(repo)
            .create_user(&Context::background(), cmd("alice", &long, "a@b.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::HashingPassword(_)));
        assert!(err.hash_error().is_some());
    }

    #[tokio::test]
    async fn test_create_user_wraps_repository_error() {
        let mut repo = MockUserRepository::new();
        repo.expect_create()
            .returning(|_, _| Err(RepositoryError::duplicate_username("alice").into()));

        let err = service(repo)
            .create_user(&Context::background(), cmd("alice", "secret123", "a@b.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::CreateUser(_)));
        assert!(matches!(
            err.repository_error(),
            Some(RepositoryError::Duplicate { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_user_hashes_plaintext_password() {
        let hasher = fast_hasher();
        let mut repo = MockUserRepository::new();
        repo.expect_update()
            .withf(move |_, user| hasher.verify("new-secret", &user.password))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut user = User::new("alice", "new-secret", "a@b.com").unwrap();
        service(repo)
            .update_user(&Context::background(), &mut user)
            .await
            .unwrap();

        assert!(PasswordHasher::is_hash(&user.password));
    }

    #[tokio::test]
    async fn test_update_user_does_not_double_hash() {
        let hash = fast_hasher().hash("secret123").unwrap();
        let expected = hash.clone();

        let mut repo = MockUserRepository::new();
        repo.expect_update()
            .withf(move |_, user| user.password == expected)
            .times(1)
            .returning(|_, _| Ok(()));

        let mut user = User::new("alice", hash.clone(), "a@b.com").unwrap();
        service(repo)
            .update_user(&Context::background(), &mut user)
            .await
            .unwrap();

        assert_eq!(user.password, hash);
    }

    #[tokio::test]
    async fn test_update_user_validation_fails_before_repository() {
        let mut repo = MockUserRepository::new();
        repo.expect_update().never();

        let mut user = User::new("alice", "secret123", "a@b.com").unwrap();
        user.username.clear();

        let err = service(repo)
            .update_user(&Context::background(), &mut user)
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::UpdateUser(_)));
        assert_eq!(err.validation_error(), Some(&ValidationError::EmptyUsername));
    }

    #[tokio::test]
    async fn test_change_password_rejects_empty() {
        let mut repo = MockUserRepository::new();
        repo.expect_get().never();
        repo.expect_update().never();

        let err = service(repo)
            .change_password(&Context::background(), UserId::new(1), "")
            .await
            .unwrap_err();

        assert_eq!(err.validation_error(), Some(&ValidationError::EmptyPassword));
    }

    #[tokio::test]
    async fn test_change_password_stores_new_hash() {
        let hasher = fast_hasher();
        let mut repo = MockUserRepository::new();
        repo.expect_get().returning(|_, id| {
            let mut user = User::new("alice", "old", "a@b.com").unwrap();
            user.id = id;
            Ok(user)
        });
        repo.expect_update()
            .withf(move |_, user| {
                user.id == UserId::new(5) && hasher.verify("brand-new", &user.password)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        service(repo)
            .change_password(&Context::background(), UserId::new(5), "brand-new")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_user_forwards_context_errors() {
        let mut repo = MockUserRepository::new();
        repo.expect_get()
            .returning(|_, _| Err(RepositoryError::Cancelled.into()));

        let err = service(repo)
            .get_user(&Context::background(), UserId::new(1))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), crate::application::ErrorKind::GetUser);
        assert_eq!(err.repository_error(), Some(&RepositoryError::Cancelled));
    }
}
