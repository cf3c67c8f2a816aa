use crate::application::ApplicationError;
use crate::domain::{HashError, LoanError};
use crate::ports::RepositoryError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(ApplicationError);

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    /// ステータスコードとエラーコード
    fn classify(&self) -> (StatusCode, &'static str) {
        let err = &self.0;

        // 422 Unprocessable Entity - 入力の不変条件違反
        if err.validation_error().is_some() {
            return (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED");
        }
        if let Some(HashError::TooLong { .. }) = err.hash_error() {
            return (StatusCode::UNPROCESSABLE_ENTITY, "PASSWORD_TOO_LONG");
        }

        // 409 Conflict - 貸出ルール違反
        if let Some(loan_err) = err.loan_error() {
            let code = match loan_err {
                LoanError::AlreadyReturned => "ALREADY_RETURNED",
                LoanError::AlreadyBorrowed => "ALREADY_BORROWED",
                LoanError::NotBorrowed => "NOT_BORROWED",
                LoanError::BookUnavailable => "BOOK_UNAVAILABLE",
                LoanError::HasOverdueLoan => "HAS_OVERDUE_LOAN",
                LoanError::LoanLimitExceeded(_) => "LOAN_LIMIT_EXCEEDED",
            };
            return (StatusCode::CONFLICT, code);
        }

        match err.repository_error() {
            Some(RepositoryError::NotFound { .. }) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Some(RepositoryError::Duplicate { .. }) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            Some(RepositoryError::OutOfStock { .. }) => (StatusCode::CONFLICT, "BOOK_UNAVAILABLE"),
            Some(RepositoryError::DeadlineExceeded) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
            Some(RepositoryError::Cancelled) => (StatusCode::SERVICE_UNAVAILABLE, "CANCELLED"),
            // 500 Internal Server Error - ストレージ障害など
            None => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();

        let message = if status.is_server_error() && status != StatusCode::GATEWAY_TIMEOUT {
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            tracing::error!(kind = %self.0.kind(), "{}", self.0);
            "An unexpected error occurred".to_string()
        } else {
            self.0.to_string()
        };

        let body = Json(ErrorResponse::new(code, message));
        (status, body).into_response()
    }
}
