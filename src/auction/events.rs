use crate::bidding::model::{Artwork, Bid};
use serde::Serialize;

/// 실시간 채널로 내보내는 작품 스냅샷 (비밀 기준가 제외)
#[derive(Debug, Clone, Serialize)]
pub struct ArtworkSnapshot {
    pub id: i64,
    pub current_highest_bid: f64,
    pub status: String,
}

impl From<&Artwork> for ArtworkSnapshot {
    fn from(artwork: &Artwork) -> Self {
        ArtworkSnapshot {
            id: artwork.id,
            current_highest_bid: artwork.current_highest_bid,
            status: artwork.status.clone(),
        }
    }
}

/// 작품별 룸으로 브로드캐스트되는 경매 이벤트
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuctionEvent {
    // 입찰 수락 이벤트
    NewBid {
        artwork_id: i64,
        bid: Bid,
        artwork: ArtworkSnapshot,
    },
    // 낙찰 직후 결제 요구 이벤트
    PaymentRequired {
        artwork_id: i64,
        bid_id: i64,
        winning_bid: f64,
        winner_id: i64,
    },
    // 결제 확정 이벤트
    PaymentCompleted {
        artwork_id: i64,
        payment_id: i64,
        status: String,
    },
    // 결제 실패 이벤트
    PaymentFailed {
        artwork_id: i64,
        payment_id: i64,
        reason: String,
    },
}

impl AuctionEvent {
    /// 이벤트가 속한 작품 룸
    pub fn artwork_id(&self) -> i64 {
        match self {
            AuctionEvent::NewBid { artwork_id, .. }
            | AuctionEvent::PaymentRequired { artwork_id, .. }
            | AuctionEvent::PaymentCompleted { artwork_id, .. }
            | AuctionEvent::PaymentFailed { artwork_id, .. } => *artwork_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tag_names() {
        let event = AuctionEvent::PaymentRequired {
            artwork_id: 7,
            bid_id: 3,
            winning_bid: 120.0,
            winner_id: 2,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "payment_required");
        assert_eq!(value["artwork_id"], 7);
        assert_eq!(event.artwork_id(), 7);
    }

    #[test]
    fn test_snapshot_has_no_threshold_field() {
        let snapshot = ArtworkSnapshot {
            id: 1,
            current_highest_bid: 10.0,
            status: "ACTIVE".to_string(),
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value.get("secret_threshold").is_none());
    }
}
