use chrono::{DateTime, Utc};

use super::{BookId, ValidationError};

/// 書籍エンティティ
///
/// 不変条件：
/// - タイトル・著者は空でない
/// - 在庫数（amount）は0以上
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// 貸出可能な冊数
    pub amount: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// 入力を検証して新しい書籍を作成する（IDは未採番）
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        amount: i32,
    ) -> Result<Self, ValidationError> {
        let now = Utc::now();
        let book = Self {
            id: BookId::unassigned(),
            title: title.into(),
            author: author.into(),
            amount,
            created_at: now,
            updated_at: now,
        };

        book.validate()?;
        Ok(book)
    }

    /// 不変条件を検証する
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.author.trim().is_empty() {
            return Err(ValidationError::EmptyAuthor);
        }
        if self.amount < 0 {
            return Err(ValidationError::NegativeAmount(self.amount));
        }
        Ok(())
    }

    /// 更新日時を進める（巻き戻さない）
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = self.updated_at.max(now);
    }

    pub fn is_available(&self) -> bool {
        self.amount > 0
    }
}
