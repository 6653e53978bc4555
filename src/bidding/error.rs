// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

// endregion: --- Imports

// region:    --- BidError

/// 입찰 평가 실패. 모든 변형은 쓰기 이전에 동기적으로 반환된다.
#[derive(Debug, Error)]
pub enum BidError {
    #[error("입찰 금액은 0보다 커야 합니다.")]
    InvalidAmount,

    #[error("입찰 금액이 허용 상한을 초과했습니다.")]
    AmountTooLarge,

    #[error("작품을 찾을 수 없습니다.")]
    ArtworkNotFound { artwork_id: i64 },

    #[error("진행 중인 경매가 아닙니다. (상태: {status})")]
    ArtworkNotActive { status: String },

    #[error("자신의 출품작에는 입찰할 수 없습니다.")]
    SelfBiddingForbidden,

    #[error("입찰 금액이 현재 최고가보다 높아야 합니다.")]
    BidTooLow { current_highest_bid: f64 },

    #[error("데이터베이스 오류")]
    Database(#[from] sqlx::Error),
}

impl BidError {
    /// 클라이언트 노출용 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            BidError::InvalidAmount => "INVALID_AMOUNT",
            BidError::AmountTooLarge => "AMOUNT_TOO_LARGE",
            BidError::ArtworkNotFound { .. } => "ARTWORK_NOT_FOUND",
            BidError::ArtworkNotActive { .. } => "ARTWORK_NOT_ACTIVE",
            BidError::SelfBiddingForbidden => "SELF_BIDDING_FORBIDDEN",
            BidError::BidTooLow { .. } => "BID_TOO_LOW",
            BidError::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BidError::ArtworkNotFound { .. } => StatusCode::NOT_FOUND,
            BidError::SelfBiddingForbidden => StatusCode::FORBIDDEN,
            BidError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// 응답 본문. 클라이언트가 대응할 수 있도록 현재 상태를 함께 담는다.
    pub fn body(&self) -> serde_json::Value {
        let mut body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        match self {
            BidError::ArtworkNotFound { artwork_id } => {
                body["artwork_id"] = serde_json::json!(artwork_id);
            }
            BidError::ArtworkNotActive { status } => {
                body["status"] = serde_json::json!(status);
            }
            BidError::BidTooLow {
                current_highest_bid,
            } => {
                body["current_highest_bid"] = serde_json::json!(current_highest_bid);
            }
            // 내부 오류 상세는 노출하지 않는다
            BidError::Database(_) => {
                body["error"] = serde_json::json!("요청을 처리하지 못했습니다.");
            }
            _ => {}
        }
        body
    }
}

impl IntoResponse for BidError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

// endregion: --- BidError

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(BidError::InvalidAmount.code(), "INVALID_AMOUNT");
        assert_eq!(BidError::AmountTooLarge.code(), "AMOUNT_TOO_LARGE");
        assert_eq!(
            BidError::ArtworkNotFound { artwork_id: 1 }.code(),
            "ARTWORK_NOT_FOUND"
        );
        assert_eq!(
            BidError::ArtworkNotActive {
                status: "SOLD".to_string()
            }
            .code(),
            "ARTWORK_NOT_ACTIVE"
        );
        assert_eq!(BidError::SelfBiddingForbidden.code(), "SELF_BIDDING_FORBIDDEN");
        assert_eq!(
            BidError::BidTooLow {
                current_highest_bid: 10.0
            }
            .code(),
            "BID_TOO_LOW"
        );
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            BidError::ArtworkNotFound { artwork_id: 1 }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            BidError::SelfBiddingForbidden.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(BidError::InvalidAmount.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_bid_too_low_body_carries_current_highest() {
        let body = BidError::BidTooLow {
            current_highest_bid: 75.0,
        }
        .body();
        assert_eq!(body["code"], "BID_TOO_LOW");
        assert_eq!(body["current_highest_bid"], 75.0);
    }
}

// endregion: --- Tests
