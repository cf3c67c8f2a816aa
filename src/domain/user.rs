use chrono::{DateTime, Utc};
use validator::ValidateEmail;

use super::{UserId, ValidationError};

/// 利用者エンティティ
///
/// 不変条件：
/// - ユーザー名・パスワードは空でない
/// - メールアドレスは形式が正しい
/// - パスワードは平文のまま永続化されない（ユースケース層でハッシュ化）
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// 入力時は平文、永続化後はPHC形式のハッシュ
    pub password: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ハッシュであってもログに出さない
impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("email", &self.email)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl User {
    /// 入力を検証して新しい利用者を作成する（IDは未採番、パスワードは平文のまま）
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let now = Utc::now();
        let user = Self {
            id: UserId::unassigned(),
            username: username.into(),
            password: password.into(),
            email: email.into(),
            created_at: now,
            updated_at: now,
        };

        user.validate()?;
        Ok(user)
    }

    /// 不変条件を検証する
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        if self.password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        if !self.email.as_str().validate_email() {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }

    /// 更新日時を進める（巻き戻さない）
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = self.updated_at.max(now);
    }
}
