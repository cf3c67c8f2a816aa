//! キャンセル・期限を運ぶリクエストコンテキスト

use std::future::{Future, pending};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use super::{RepositoryError, Result};

/// ストレージ呼び出しに渡すコンテキスト
///
/// ユースケース層はこれをリポジトリへ転送するだけで、
/// 自身ではタイムアウトもリトライも行わない。
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// `Context::with_cancel`で得るキャンセル用ハンドル
#[derive(Debug)]
pub struct CancelHandle(watch::Sender<bool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.send_replace(true);
    }
}

impl Context {
    /// 期限もキャンセルもないコンテキスト
    pub fn background() -> Self {
        Self::default()
    }

    /// 今から`timeout`後を期限とする
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// 期限を設定する。既存の期限より遅い場合は既存の期限を保つ
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// キャンセル可能なコンテキストを作る
    ///
    /// 親がキャンセル可能な場合、親のキャンセルは引き継がれない。
    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        self.cancel = Some(rx);
        (self, CancelHandle(tx))
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 既にキャンセル済み・期限切れならそのエラー
    pub fn err(&self) -> Option<RepositoryError> {
        if self.cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Some(RepositoryError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(RepositoryError::DeadlineExceeded);
        }
        None
    }

    /// ストレージ処理をキャンセル・期限と競合させて実行する
    ///
    /// 先にキャンセルまたは期限が来た場合、`fut`はドロップされる。
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Some(err) = self.err() {
            return Err(err.into());
        }

        let cancelled = async {
            match self.cancel.clone() {
                Some(mut rx) => {
                    let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
                    // 送信側がキャンセルせずにドロップされた場合は待ち続ける
                    if !fired {
                        pending::<()>().await;
                    }
                }
                None => pending::<()>().await,
            }
        };

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            result = fut => result,
            _ = cancelled => Err(RepositoryError::Cancelled.into()),
            _ = expired => Err(RepositoryError::DeadlineExceeded.into()),
        }
    }
}
