// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

// endregion: --- Imports

// region:    --- PaymentError

/// 결제 흐름 실패
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("입찰을 찾을 수 없습니다.")]
    BidNotFound { bid_id: i64 },

    #[error("결제를 찾을 수 없습니다.")]
    PaymentNotFound,

    #[error("낙찰된 입찰만 결제할 수 있습니다.")]
    BidNotWinning,

    #[error("이미 완료된 결제입니다.")]
    AlreadyCompleted,

    // 어떤 검증에서 실패했는지는 노출하지 않는다
    #[error("권한이 없습니다.")]
    Forbidden,

    #[error("데이터베이스 오류")]
    Database(#[from] sqlx::Error),
}

impl PaymentError {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::BidNotFound { .. } => "BID_NOT_FOUND",
            PaymentError::PaymentNotFound => "PAYMENT_NOT_FOUND",
            PaymentError::BidNotWinning => "BID_NOT_WINNING",
            PaymentError::AlreadyCompleted => "PAYMENT_ALREADY_COMPLETED",
            PaymentError::Forbidden => "FORBIDDEN",
            PaymentError::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PaymentError::BidNotFound { .. } | PaymentError::PaymentNotFound => {
                StatusCode::NOT_FOUND
            }
            PaymentError::Forbidden => StatusCode::FORBIDDEN,
            PaymentError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn body(&self) -> serde_json::Value {
        match self {
            PaymentError::Database(_) => serde_json::json!({
                "error": "요청을 처리하지 못했습니다.",
                "code": self.code(),
            }),
            _ => serde_json::json!({
                "error": self.to_string(),
                "code": self.code(),
            }),
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

// endregion: --- PaymentError

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_statuses() {
        assert_eq!(PaymentError::PaymentNotFound.code(), "PAYMENT_NOT_FOUND");
        assert_eq!(
            PaymentError::PaymentNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(PaymentError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            PaymentError::BidNotWinning.status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}

// endregion: --- Tests
