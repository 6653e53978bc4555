use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 경매 상태 문자열 (artworks.status)
pub mod artwork_status {
    pub const ACTIVE: &str = "ACTIVE";
    pub const PENDING_PAYMENT: &str = "PENDING_PAYMENT";
    pub const SOLD: &str = "SOLD";
    pub const ARCHIVED: &str = "ARCHIVED";
}

// 작품 모델 (작품 자체가 곧 경매)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Artwork {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub artist_name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    // 비밀 기준가. 응답으로 직렬화하지 않는다.
    #[serde(skip_serializing)]
    pub secret_threshold: f64,
    pub current_highest_bid: f64,
    pub status: String,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// 입찰 모델 (생성 이후 불변)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub artwork_id: i64,
    pub bidder_id: i64,
    pub amount: f64,
    pub is_winning: bool,
    pub created_at: DateTime<Utc>,
}

/// 입찰 처리 결과: 저장된 입찰과 갱신 후 작품 스냅샷
#[derive(Debug, Clone, Serialize)]
pub struct BidOutcome {
    pub bid: Bid,
    pub artwork: Artwork,
}

/// 입찰 요청 본문. bidder_id는 절대 본문으로 받지 않는다(인증 컨텍스트에서만).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidRequest {
    pub artwork_id: i64,
    pub amount: f64,
}

/// 출품 요청 본문
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateArtworkRequest {
    pub title: String,
    pub artist_name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub secret_threshold: f64,
    pub end_date: Option<DateTime<Utc>>,
}
