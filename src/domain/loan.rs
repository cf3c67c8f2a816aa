use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, LoanError, LoanId, UserId};

/// 貸出期間（日数）
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// 貸出ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// 貸出中
    Open,
    /// 延滞中
    Overdue,
    /// 返却済み
    Returned,
}

/// 貸出 - 1冊の書籍の1回の貸出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    pub id: LoanId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    /// 新しい貸出を作成する（IDは未採番）
    ///
    /// 返却期限は貸出日から14日後。
    pub fn borrow(user_id: UserId, book_id: BookId, borrowed_at: DateTime<Utc>) -> Self {
        Self {
            id: LoanId::unassigned(),
            user_id,
            book_id,
            borrowed_at,
            due_date: borrowed_at + Duration::days(LOAN_PERIOD_DAYS),
            returned_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    /// 返却期限を過ぎた未返却の貸出か
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && now > self.due_date
    }

    pub fn status(&self, now: DateTime<Utc>) -> LoanStatus {
        if !self.is_open() {
            LoanStatus::Returned
        } else if self.is_overdue(now) {
            LoanStatus::Overdue
        } else {
            LoanStatus::Open
        }
    }

    /// 返却を記録する
    ///
    /// 延滞していても返却は受け付ける。
    ///
    /// # エラー
    /// 既に返却済みの場合は`LoanError::AlreadyReturned`
    pub fn mark_returned(&mut self, returned_at: DateTime<Utc>) -> Result<(), LoanError> {
        if !self.is_open() {
            return Err(LoanError::AlreadyReturned);
        }
        self.returned_at = Some(returned_at);
        Ok(())
    }
}
