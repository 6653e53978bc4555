/// 입찰 커맨드 처리
/// 1. 입찰 평가 (순수 함수)
/// 2. 입찰 반영 (단일 트랜잭션) 및 커밋 후 부수효과 디스패치
// region:    --- Imports
use crate::audit::{AuditRecorder, RequestContext};
use crate::auction::events::{ArtworkSnapshot, AuctionEvent};
use crate::auth::AuthUser;
use crate::bidding::error::BidError;
use crate::bidding::model::{artwork_status, Artwork, Bid, BidOutcome};
use crate::database::DatabaseManager;
use crate::query::queries;
use crate::realtime::RealtimeHub;
use tracing::info;

// endregion: --- Imports

// region:    --- Bid Evaluation

// 과도한 금액에 대한 방어적 상한 (비즈니스 규칙이 아님)
pub const MAX_BID_AMOUNT: f64 = 1_000_000_000.0;

/// 입찰 판정 결과. 작품 행에 반영할 새 상태를 담는다.
#[derive(Debug, Clone, PartialEq)]
pub struct BidDecision {
    pub is_winning: bool,
    pub new_highest_bid: f64,
    pub new_status: &'static str,
}

/// 금액 검증. 작품 조회 이전에 수행한다.
pub fn validate_amount(amount: f64) -> Result<(), BidError> {
    if !(amount > 0.0) {
        return Err(BidError::InvalidAmount);
    }
    if amount > MAX_BID_AMOUNT {
        return Err(BidError::AmountTooLarge);
    }
    Ok(())
}

/// 입찰 평가 (순수 함수)
///
/// 검증 순서는 고정이다: 금액 → 경매 상태 → 셀프 입찰 → 최고가 초과.
/// 판정은 단일 비교: 금액이 비밀 기준가 이상이면 즉시 낙찰 (동액 포함).
pub fn evaluate_bid(artwork: &Artwork, bidder_id: i64, amount: f64) -> Result<BidDecision, BidError> {
    validate_amount(amount)?;

    if artwork.status != artwork_status::ACTIVE {
        return Err(BidError::ArtworkNotActive {
            status: artwork.status.clone(),
        });
    }

    if artwork.seller_id == bidder_id {
        return Err(BidError::SelfBiddingForbidden);
    }

    // 실제 입찰이 하나라도 있으면 동액/감액은 거절. 첫 입찰은 면제.
    if artwork.current_highest_bid > 0.0 && amount <= artwork.current_highest_bid {
        return Err(BidError::BidTooLow {
            current_highest_bid: artwork.current_highest_bid,
        });
    }

    let is_winning = amount >= artwork.secret_threshold;

    Ok(BidDecision {
        is_winning,
        // current_highest_bid는 단조 비감소
        new_highest_bid: artwork.current_highest_bid.max(amount),
        new_status: if is_winning {
            artwork_status::PENDING_PAYMENT
        } else {
            artwork_status::ACTIVE
        },
    })
}

// endregion: --- Bid Evaluation

// region:    --- Place Bid Command

/// 입찰 처리
///
/// 작품 행을 FOR UPDATE로 잠근 뒤 평가하므로, 같은 작품에 대한 동시 입찰은
/// 행 잠금에서 직렬화된다. 잠금 이후 재조회한 상태로 평가하기 때문에
/// 낡은 최고가/상태를 근거로 수락되는 일은 없다.
pub async fn place_bid(
    db: &DatabaseManager,
    hub: &RealtimeHub,
    audit: &AuditRecorder,
    bidder: &AuthUser,
    ctx: &RequestContext,
    artwork_id: i64,
    amount: f64,
) -> Result<BidOutcome, BidError> {
    info!(
        "{:<12} --> 입찰 요청: artwork_id={}, bidder_id={}, amount={}",
        "Command", artwork_id, bidder.id, amount
    );

    // 금액 검증은 조회 이전에
    validate_amount(amount)?;

    let bidder_id = bidder.id;
    let outcome = db
        .transaction(move |tx| {
            Box::pin(async move {
                // 작품 행 잠금 조회
                let mut artwork = sqlx::query_as::<_, Artwork>(queries::GET_ARTWORK_FOR_UPDATE)
                    .bind(artwork_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(BidError::ArtworkNotFound { artwork_id })?;

                let decision = evaluate_bid(&artwork, bidder_id, amount)?;

                // 입찰 기록. bidder_id는 인증 컨텍스트에서 온 값만 사용한다.
                let bid = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
                    .bind(artwork_id)
                    .bind(bidder_id)
                    .bind(amount)
                    .bind(decision.is_winning)
                    .fetch_one(&mut **tx)
                    .await?;

                // 작품 상태 반영 (낙찰 시 PENDING_PAYMENT, 아니면 ACTIVE 유지)
                sqlx::query(queries::UPDATE_ARTWORK_AFTER_BID)
                    .bind(artwork_id)
                    .bind(decision.new_highest_bid)
                    .bind(decision.new_status)
                    .execute(&mut **tx)
                    .await?;

                artwork.current_highest_bid = decision.new_highest_bid;
                artwork.status = decision.new_status.to_string();

                Ok::<BidOutcome, BidError>(BidOutcome { bid, artwork })
            })
        })
        .await?;

    // 커밋 이후의 부수효과. 실패해도 입찰 결과에는 영향을 주지 않는다.
    dispatch_bid_side_effects(hub, audit, bidder, ctx, &outcome).await;

    Ok(outcome)
}

/// 감사 기록 및 실시간 이벤트 발행 (fire-and-forget)
async fn dispatch_bid_side_effects(
    hub: &RealtimeHub,
    audit: &AuditRecorder,
    bidder: &AuthUser,
    ctx: &RequestContext,
    outcome: &BidOutcome,
) {
    let bid = &outcome.bid;
    let artwork = &outcome.artwork;

    audit
        .record(
            "bid_placed",
            "bid",
            Some(bid.id),
            Some(bidder),
            serde_json::json!({
                "amount": bid.amount,
                "artwork_id": bid.artwork_id,
                "is_winning": bid.is_winning,
            }),
            ctx,
        )
        .await;

    hub.broadcast(AuctionEvent::NewBid {
        artwork_id: artwork.id,
        bid: bid.clone(),
        artwork: ArtworkSnapshot::from(artwork),
    });

    if bid.is_winning {
        audit
            .record(
                "winning_bid_placed",
                "artwork",
                Some(artwork.id),
                Some(bidder),
                serde_json::json!({
                    "bid_amount": bid.amount,
                    "seller_id": artwork.seller_id,
                    "buyer_id": bid.bidder_id,
                    "status": artwork.status,
                }),
                ctx,
            )
            .await;

        hub.broadcast(AuctionEvent::PaymentRequired {
            artwork_id: artwork.id,
            bid_id: bid.id,
            winning_bid: bid.amount,
            winner_id: bid.bidder_id,
        });
    }
}

// endregion: --- Place Bid Command

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_artwork(threshold: f64, current_highest: f64) -> Artwork {
        Artwork {
            id: 1,
            seller_id: 10,
            title: "푸른 새벽".to_string(),
            artist_name: None,
            category: None,
            description: None,
            image_url: None,
            secret_threshold: threshold,
            current_highest_bid: current_highest,
            status: artwork_status::ACTIVE.to_string(),
            end_date: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let artwork = test_artwork(100.0, 0.0);
        assert!(matches!(
            evaluate_bid(&artwork, 2, 0.0),
            Err(BidError::InvalidAmount)
        ));
        assert!(matches!(
            evaluate_bid(&artwork, 2, -5.0),
            Err(BidError::InvalidAmount)
        ));
    }

    #[test]
    fn test_rejects_amount_over_sanity_bound() {
        let artwork = test_artwork(100.0, 0.0);
        assert!(matches!(
            evaluate_bid(&artwork, 2, MAX_BID_AMOUNT + 1.0),
            Err(BidError::AmountTooLarge)
        ));
        // 상한 동액은 허용
        assert!(evaluate_bid(&artwork, 2, MAX_BID_AMOUNT).is_ok());
    }

    #[test]
    fn test_amount_check_precedes_state_check() {
        let mut artwork = test_artwork(100.0, 0.0);
        artwork.status = artwork_status::SOLD.to_string();
        // 금액 검증이 상태 검증보다 먼저
        assert!(matches!(
            evaluate_bid(&artwork, 2, -1.0),
            Err(BidError::InvalidAmount)
        ));
    }

    #[test]
    fn test_rejects_inactive_artwork() {
        for status in [
            artwork_status::PENDING_PAYMENT,
            artwork_status::SOLD,
            artwork_status::ARCHIVED,
        ] {
            let mut artwork = test_artwork(100.0, 100.0);
            artwork.status = status.to_string();
            match evaluate_bid(&artwork, 2, 150.0) {
                Err(BidError::ArtworkNotActive { status: s }) => assert_eq!(s, status),
                other => panic!("unexpected: {:?}", other),
            }
        }
    }

    #[test]
    fn test_seller_cannot_bid_on_own_artwork() {
        let artwork = test_artwork(100.0, 0.0);
        // 기준가 이상이라도 셀프 입찰은 거절
        assert!(matches!(
            evaluate_bid(&artwork, artwork.seller_id, 500.0),
            Err(BidError::SelfBiddingForbidden)
        ));
    }

    #[test]
    fn test_rejects_bid_at_or_below_current_highest() {
        let artwork = test_artwork(100.0, 50.0);
        // 동액 거절
        match evaluate_bid(&artwork, 2, 50.0) {
            Err(BidError::BidTooLow {
                current_highest_bid,
            }) => assert_eq!(current_highest_bid, 50.0),
            other => panic!("unexpected: {:?}", other),
        }
        // 감액 거절
        assert!(matches!(
            evaluate_bid(&artwork, 2, 30.0),
            Err(BidError::BidTooLow { .. })
        ));
    }

    #[test]
    fn test_first_bid_exempt_from_highest_bid_check() {
        // 입찰이 없는 작품(최고가 0)에는 어떤 양수 금액이든 허용
        let artwork = test_artwork(100.0, 0.0);
        let decision = evaluate_bid(&artwork, 2, 1.0).unwrap();
        assert!(!decision.is_winning);
        assert_eq!(decision.new_highest_bid, 1.0);
    }

    #[test]
    fn test_below_threshold_bid_raises_highest_without_status_change() {
        // 시나리오: 기준가 100, 최고가 0, 입찰 75
        let artwork = test_artwork(100.0, 0.0);
        let decision = evaluate_bid(&artwork, 2, 75.0).unwrap();
        assert!(!decision.is_winning);
        assert_eq!(decision.new_highest_bid, 75.0);
        assert_eq!(decision.new_status, artwork_status::ACTIVE);
    }

    #[test]
    fn test_bid_meeting_threshold_wins_immediately() {
        // 시나리오: 기준가 100, 최고가 75, 입찰 100 (기준가 동액은 낙찰)
        let artwork = test_artwork(100.0, 75.0);
        let decision = evaluate_bid(&artwork, 3, 100.0).unwrap();
        assert!(decision.is_winning);
        assert_eq!(decision.new_highest_bid, 100.0);
        assert_eq!(decision.new_status, artwork_status::PENDING_PAYMENT);
    }

    #[test]
    fn test_bid_over_threshold_wins() {
        let artwork = test_artwork(100.0, 0.0);
        let decision = evaluate_bid(&artwork, 2, 250.0).unwrap();
        assert!(decision.is_winning);
        assert_eq!(decision.new_highest_bid, 250.0);
    }

    #[test]
    fn test_new_highest_is_max_of_previous_and_amount() {
        // 최고가는 max(이전 최고가, 입찰 금액)
        let artwork = test_artwork(1000.0, 50.0);
        let decision = evaluate_bid(&artwork, 2, 60.0).unwrap();
        assert_eq!(decision.new_highest_bid, 60.0);
        assert_eq!(decision.new_status, artwork_status::ACTIVE);
    }
}

// endregion: --- Tests
