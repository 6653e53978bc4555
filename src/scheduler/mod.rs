/// 경매 만료 스위퍼
/// 종료 시각이 지나도록 낙찰이 나지 않은 경매를 일괄 마감한다.
/// 스케줄링 자체는 외부 관심사다: 여기서는 주기 실행 루프 하나와
/// 순수한 스캔-전이 함수만 제공하며, 관리자 API로도 즉시 실행할 수 있다.
// region:    --- Imports
use crate::bidding::model::{artwork_status, Artwork};
use crate::query::queries;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Sweep

/// 만료된 경매의 마감 상태: 낙찰 입찰이 있으면 SOLD, 없으면 ARCHIVED
pub fn closed_status(has_winning_bid: bool) -> &'static str {
    if has_winning_bid {
        artwork_status::SOLD
    } else {
        artwork_status::ARCHIVED
    }
}

/// 만료 경매 일괄 마감
///
/// end_date < now 인 ACTIVE 작품 전부를 한 트랜잭션에서 전이시키고
/// 마감한 건수를 반환한다. 멱등: 전이된 행은 더 이상 필터에 걸리지 않는다.
pub async fn sweep_expired_auctions(
    pool: &PgPool,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let expired = sqlx::query_as::<_, Artwork>(queries::LIST_EXPIRED_ACTIVE_ARTWORKS)
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

    let mut closed = 0u64;
    for artwork in &expired {
        let has_winner: bool = sqlx::query_scalar(queries::HAS_WINNING_BID)
            .bind(artwork.id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(queries::SET_ARTWORK_STATUS)
            .bind(artwork.id)
            .bind(closed_status(has_winner))
            .execute(&mut *tx)
            .await?;

        closed += 1;
    }

    tx.commit().await?;

    if closed > 0 {
        info!("{:<12} --> 만료 경매 {}건 마감", "Sweeper", closed);
    } else {
        debug!("{:<12} --> 마감할 만료 경매 없음", "Sweeper");
    }

    Ok(closed)
}

// endregion: --- Sweep

// region:    --- Auction Sweeper Loop

/// 주기 실행 루프
pub struct AuctionSweeper {
    pool: Arc<PgPool>,
}

impl AuctionSweeper {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// 스위퍼 시작
    pub async fn start(&self) {
        let pool = Arc::clone(&self.pool);
        let period = std::env::var("SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(period));
            loop {
                interval.tick().await;
                // 실패한 주기의 행들은 다음 주기에 다시 잡힌다
                if let Err(e) = sweep_expired_auctions(&pool, Utc::now()).await {
                    error!("{:<12} --> 만료 경매 마감 중 오류 발생: {:?}", "Sweeper", e);
                }
            }
        });
        info!("{:<12} --> 만료 스위퍼 시작 (주기 {}초)", "Sweeper", period);
    }
}

// endregion: --- Auction Sweeper Loop

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_status_classification() {
        assert_eq!(closed_status(true), artwork_status::SOLD);
        assert_eq!(closed_status(false), artwork_status::ARCHIVED);
    }
}

// endregion: --- Tests
