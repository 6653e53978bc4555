use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 결제 상태 문자열 (payments.status)
pub mod payment_status {
    pub const PENDING: &str = "PENDING";
    pub const PROCESSING: &str = "PROCESSING";
    pub const SUCCEEDED: &str = "SUCCEEDED";
    pub const FAILED: &str = "FAILED";
    pub const CANCELED: &str = "CANCELED";

    /// 더 이상 전이하지 않는 상태인지
    pub fn is_terminal(status: &str) -> bool {
        matches!(status, SUCCEEDED | FAILED | CANCELED)
    }
}

// 결제 모델. 낙찰 입찰과 1:1이며 삭제되지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: i64,
    pub bid_id: i64,
    // 외부 결제사 참조 (유일)
    pub external_reference: String,
    pub charge_reference: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 결제 생성 요청 본문
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreatePaymentRequest {
    pub bid_id: i64,
}
