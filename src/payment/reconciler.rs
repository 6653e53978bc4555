/// 결제 상태 리컨실러
/// 외부 결제사 콜백(succeeded/failed)에 반응해 판매 상태를 확정하거나 되돌린다.
/// 콜백 서명 검증은 웹훅을 수신하는 업스트림 협력자가 이미 끝냈다고 신뢰한다.
/// 결제사는 전달을 재시도하므로 두 진입점 모두 멱등해야 한다.
// region:    --- Imports
use crate::audit::{AuditRecorder, RequestContext};
use crate::auction::events::AuctionEvent;
use crate::bidding::model::{artwork_status, Bid};
use crate::database::DatabaseManager;
use crate::payment::error::PaymentError;
use crate::payment::model::{payment_status, Payment};
use crate::query::queries;
use crate::realtime::RealtimeHub;
use serde::Deserialize;
use tracing::info;

// endregion: --- Imports

// region:    --- Webhook Payload

/// 결제사 콜백 본문 (서명 검증 이후의 정규화된 형태)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentWebhookEvent {
    pub event_type: String,
    pub external_reference: String,
    #[serde(default)]
    pub charge_reference: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

/// 실패 사유 추출. 콜백에 없으면 자리표시자.
pub fn failure_reason(raw: Option<String>) -> String {
    match raw {
        Some(reason) if !reason.trim().is_empty() => reason,
        _ => "사유 미상".to_string(),
    }
}

// endregion: --- Webhook Payload

// region:    --- Reconciler

/// 트랜잭션 내부 처리 결과. 실제 전이가 있었을 때만 부수효과를 낸다.
struct Reconciled {
    payment: Payment,
    artwork_id: i64,
    transitioned: bool,
}

/// 결제 성공 콜백 처리
///
/// 결제를 SUCCEEDED로, 작품을 SOLD로 확정한다. 같은 콜백이 두 번 와도
/// 오류 없이 동일한 최종 상태를 반환한다.
pub async fn on_payment_succeeded(
    db: &DatabaseManager,
    hub: &RealtimeHub,
    audit: &AuditRecorder,
    ctx: &RequestContext,
    external_reference: String,
    charge_reference: Option<String>,
) -> Result<Payment, PaymentError> {
    info!(
        "{:<12} --> 결제 성공 콜백: reference={}",
        "Reconciler", external_reference
    );

    let result = db
        .transaction(move |tx| {
            Box::pin(async move {
                let payment =
                    sqlx::query_as::<_, Payment>(queries::GET_PAYMENT_BY_REFERENCE_FOR_UPDATE)
                        .bind(&external_reference)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(PaymentError::PaymentNotFound)?;

                let bid = sqlx::query_as::<_, Bid>(queries::GET_BID)
                    .bind(payment.bid_id)
                    .fetch_one(&mut **tx)
                    .await?;

                // 재전달된 콜백: 상태 변경 없이 그대로 반환
                if payment.status == payment_status::SUCCEEDED {
                    return Ok(Reconciled {
                        payment,
                        artwork_id: bid.artwork_id,
                        transitioned: false,
                    });
                }

                let payment = sqlx::query_as::<_, Payment>(queries::MARK_PAYMENT_SUCCEEDED)
                    .bind(payment.id)
                    .bind(charge_reference.as_deref())
                    .fetch_one(&mut **tx)
                    .await?;

                sqlx::query(queries::SET_ARTWORK_STATUS)
                    .bind(bid.artwork_id)
                    .bind(artwork_status::SOLD)
                    .execute(&mut **tx)
                    .await?;

                Ok::<Reconciled, PaymentError>(Reconciled {
                    payment,
                    artwork_id: bid.artwork_id,
                    transitioned: true,
                })
            })
        })
        .await?;

    if result.transitioned {
        audit
            .record(
                "payment_succeeded",
                "payment",
                Some(result.payment.id),
                None, // 웹훅에는 사용자 컨텍스트가 없다
                serde_json::json!({
                    "external_reference": result.payment.external_reference,
                    "amount": result.payment.amount,
                }),
                ctx,
            )
            .await;

        hub.broadcast(AuctionEvent::PaymentCompleted {
            artwork_id: result.artwork_id,
            payment_id: result.payment.id,
            status: artwork_status::SOLD.to_string(),
        });
    }

    Ok(result.payment)
}

/// 결제 실패 콜백 처리
///
/// 결제를 FAILED로 기록하고 경매를 되돌린다: 작품은 다시 ACTIVE,
/// 해당 입찰의 is_winning은 false. current_highest_bid는 되돌리지 않으므로
/// 다음 입찰은 결제에 실패한 직전 낙찰가보다 높아야 한다.
pub async fn on_payment_failed(
    db: &DatabaseManager,
    hub: &RealtimeHub,
    audit: &AuditRecorder,
    ctx: &RequestContext,
    external_reference: String,
    raw_reason: Option<String>,
) -> Result<Payment, PaymentError> {
    info!(
        "{:<12} --> 결제 실패 콜백: reference={}",
        "Reconciler", external_reference
    );

    let reason = failure_reason(raw_reason);

    let result = db
        .transaction(move |tx| {
            Box::pin(async move {
                let payment =
                    sqlx::query_as::<_, Payment>(queries::GET_PAYMENT_BY_REFERENCE_FOR_UPDATE)
                        .bind(&external_reference)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or(PaymentError::PaymentNotFound)?;

                let bid = sqlx::query_as::<_, Bid>(queries::GET_BID)
                    .bind(payment.bid_id)
                    .fetch_one(&mut **tx)
                    .await?;

                if payment.status == payment_status::FAILED {
                    return Ok(Reconciled {
                        payment,
                        artwork_id: bid.artwork_id,
                        transitioned: false,
                    });
                }

                let payment = sqlx::query_as::<_, Payment>(queries::MARK_PAYMENT_FAILED)
                    .bind(payment.id)
                    .bind(&reason)
                    .fetch_one(&mut **tx)
                    .await?;

                // 입찰 재개를 위해 되돌린다. 낙찰 플래그도 함께 해제.
                sqlx::query(queries::SET_ARTWORK_STATUS)
                    .bind(bid.artwork_id)
                    .bind(artwork_status::ACTIVE)
                    .execute(&mut **tx)
                    .await?;

                sqlx::query(queries::CLEAR_BID_WINNING)
                    .bind(bid.id)
                    .execute(&mut **tx)
                    .await?;

                Ok::<Reconciled, PaymentError>(Reconciled {
                    payment,
                    artwork_id: bid.artwork_id,
                    transitioned: true,
                })
            })
        })
        .await?;

    if result.transitioned {
        audit
            .record(
                "payment_failed",
                "payment",
                Some(result.payment.id),
                None,
                serde_json::json!({
                    "external_reference": result.payment.external_reference,
                    "failure_reason": result.payment.failure_reason,
                }),
                ctx,
            )
            .await;

        hub.broadcast(AuctionEvent::PaymentFailed {
            artwork_id: result.artwork_id,
            payment_id: result.payment.id,
            reason: result.payment.failure_reason.clone().unwrap_or_default(),
        });
    }

    Ok(result.payment)
}

// endregion: --- Reconciler

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_event_parsing() {
        let event: PaymentWebhookEvent = serde_json::from_str(
            r#"{"event_type": "payment.failed", "external_reference": "pay_abc", "failure_reason": "card_declined"}"#,
        )
        .unwrap();
        assert_eq!(event.event_type, "payment.failed");
        assert_eq!(event.external_reference, "pay_abc");
        assert_eq!(event.failure_reason.as_deref(), Some("card_declined"));
        assert!(event.charge_reference.is_none());
    }

    #[test]
    fn test_failure_reason_placeholder() {
        assert_eq!(
            failure_reason(Some("insufficient_funds".to_string())),
            "insufficient_funds"
        );
        assert_eq!(failure_reason(Some("   ".to_string())), "사유 미상");
        assert_eq!(failure_reason(None), "사유 미상");
    }
}

// endregion: --- Tests
