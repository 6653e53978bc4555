/// 결제 수금 진입점
/// 결제 위젯/청구 생성 등 실제 카드 처리(외부 결제사 SDK)는 협력자의 몫이고,
/// 여기서는 "이 낙찰 입찰에 결제가 발생한다"는 사실만 기록한다.
// region:    --- Imports
use crate::audit::{AuditRecorder, RequestContext};
use crate::auth::AuthUser;
use crate::bidding::model::{artwork_status, Bid};
use crate::database::DatabaseManager;
use crate::payment::error::PaymentError;
use crate::payment::model::{payment_status, Payment};
use crate::query::queries;
use tracing::info;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Create Payment

/// 결제 레코드 생성
///
/// 낙찰 입찰의 소유자만 자신의 입찰에 대해 결제를 만들 수 있다.
/// SUCCEEDED 결제는 재생성 불가, 진행 중(PENDING/PROCESSING/FAILED 잔존)
/// 레코드가 있으면 그대로 반환한다 (재시도에 안전).
pub async fn create_payment(
    db: &DatabaseManager,
    audit: &AuditRecorder,
    buyer: &AuthUser,
    ctx: &RequestContext,
    bid_id: i64,
) -> Result<Payment, PaymentError> {
    info!(
        "{:<12} --> 결제 생성 요청: bid_id={}, buyer_id={}",
        "Payment", bid_id, buyer.id
    );

    let buyer_id = buyer.id;
    let external_reference = format!("pay_{}", Uuid::new_v4().simple());

    let (payment, created) = db
        .transaction(move |tx| {
            Box::pin(async move {
                let bid = sqlx::query_as::<_, Bid>(queries::GET_BID)
                    .bind(bid_id)
                    .fetch_optional(&mut **tx)
                    .await?
                    .ok_or(PaymentError::BidNotFound { bid_id })?;

                if bid.bidder_id != buyer_id {
                    return Err(PaymentError::Forbidden);
                }

                if !bid.is_winning {
                    return Err(PaymentError::BidNotWinning);
                }

                if let Some(existing) = sqlx::query_as::<_, Payment>(queries::GET_PAYMENT_BY_BID)
                    .bind(bid_id)
                    .fetch_optional(&mut **tx)
                    .await?
                {
                    if existing.status == payment_status::SUCCEEDED {
                        return Err(PaymentError::AlreadyCompleted);
                    }
                    return Ok((existing, false));
                }

                let payment = sqlx::query_as::<_, Payment>(queries::INSERT_PAYMENT)
                    .bind(bid_id)
                    .bind(&external_reference)
                    .bind(bid.amount)
                    .bind("usd")
                    .fetch_one(&mut **tx)
                    .await?;

                // 결제 대기 상태 재확정
                sqlx::query(queries::SET_ARTWORK_STATUS)
                    .bind(bid.artwork_id)
                    .bind(artwork_status::PENDING_PAYMENT)
                    .execute(&mut **tx)
                    .await?;

                Ok((payment, true))
            })
        })
        .await?;

    if created {
        audit
            .record(
                "payment_created",
                "payment",
                Some(payment.id),
                Some(buyer),
                serde_json::json!({
                    "bid_id": payment.bid_id,
                    "amount": payment.amount,
                    "external_reference": payment.external_reference,
                }),
                ctx,
            )
            .await;
    }

    Ok(payment)
}

// endregion: --- Create Payment
