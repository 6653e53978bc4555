// region:    --- Imports
use super::queries;
use crate::bidding::model::{Artwork, Bid};
use crate::database::DatabaseManager;
use crate::payment::model::Payment;
use sqlx::Error as SqlxError;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// 작품 조회
pub async fn get_artwork(
    db_manager: &DatabaseManager,
    artwork_id: i64,
) -> Result<Option<Artwork>, SqlxError> {
    info!("{:<12} --> 작품 조회 id: {}", "Query", artwork_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Artwork>(queries::GET_ARTWORK)
                    .bind(artwork_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 모든 작품 조회
pub async fn list_artworks(db_manager: &DatabaseManager) -> Result<Vec<Artwork>, SqlxError> {
    info!("{:<12} --> 작품 목록 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Artwork>(queries::LIST_ARTWORKS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 작품 입찰 이력 조회 (생성 시각 순)
pub async fn list_artwork_bids(
    db_manager: &DatabaseManager,
    artwork_id: i64,
) -> Result<Vec<Bid>, SqlxError> {
    info!("{:<12} --> 입찰 이력 조회 artwork_id: {}", "Query", artwork_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::LIST_ARTWORK_BIDS)
                    .bind(artwork_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 입찰자 기준 입찰 조회
pub async fn list_bids_by_bidder(
    db_manager: &DatabaseManager,
    bidder_id: i64,
) -> Result<Vec<Bid>, SqlxError> {
    info!("{:<12} --> 내 입찰 조회 bidder_id: {}", "Query", bidder_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::LIST_BIDS_BY_BIDDER)
                    .bind(bidder_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 결제 조회
pub async fn get_payment(
    db_manager: &DatabaseManager,
    payment_id: i64,
) -> Result<Option<Payment>, SqlxError> {
    info!("{:<12} --> 결제 조회 id: {}", "Query", payment_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Payment>(queries::GET_PAYMENT)
                    .bind(payment_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 입찰 조회
pub async fn get_bid(db_manager: &DatabaseManager, bid_id: i64) -> Result<Option<Bid>, SqlxError> {
    info!("{:<12} --> 입찰 조회 id: {}", "Query", bid_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Bid>(queries::GET_BID)
                    .bind(bid_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

// endregion: --- Query Handlers
