// region:    --- Imports
use crate::audit::{AuditRecorder, RequestContext};
use crate::auth::{can_administer, can_bid, can_create_listing, AuthError, AuthUser};
use crate::bidding::commands::place_bid;
use crate::bidding::model::{Artwork, CreateArtworkRequest, PlaceBidRequest};
use crate::database::DatabaseManager;
use crate::payment::commands::create_payment;
use crate::payment::model::{payment_status, CreatePaymentRequest};
use crate::payment::reconciler::{on_payment_failed, on_payment_succeeded, PaymentWebhookEvent};
use crate::query;
use crate::query::queries;
use crate::realtime::{self, RealtimeHub};
use crate::scheduler::sweep_expired_auctions;
use crate::users::delete_user_cascade;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

/// 라우터 공유 상태
pub type AppState = (Arc<DatabaseManager>, Arc<RealtimeHub>, Arc<AuditRecorder>);

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_create_bid(
    State((db_manager, hub, audit)): State<AppState>,
    user: AuthUser,
    ctx: RequestContext,
    Json(cmd): Json<PlaceBidRequest>,
) -> impl IntoResponse {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    if !can_bid(user.role) {
        return AuthError::Forbidden.into_response();
    }

    match place_bid(
        &db_manager,
        &hub,
        &audit,
        &user,
        &ctx,
        cmd.artwork_id,
        cmd.amount,
    )
    .await
    {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 출품 요청 처리
pub async fn handle_create_artwork(
    State((db_manager, _, audit)): State<AppState>,
    user: AuthUser,
    ctx: RequestContext,
    Json(cmd): Json<CreateArtworkRequest>,
) -> impl IntoResponse {
    info!("{:<12} --> 출품 요청 처리 시작: {}", "Command", cmd.title);

    if !can_create_listing(user.role) {
        return AuthError::Forbidden.into_response();
    }

    // 비밀 기준가 없는 경매는 성립하지 않는다
    if !(cmd.secret_threshold > 0.0) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "비밀 기준가는 0보다 커야 합니다.",
                "code": "INVALID_THRESHOLD"
            })),
        )
            .into_response();
    }

    let seller_id = user.id;
    let created = db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                sqlx::query_as::<_, Artwork>(queries::INSERT_ARTWORK)
                    .bind(seller_id)
                    .bind(&cmd.title)
                    .bind(cmd.artist_name.as_deref())
                    .bind(cmd.category.as_deref())
                    .bind(cmd.description.as_deref())
                    .bind(cmd.image_url.as_deref())
                    .bind(cmd.secret_threshold)
                    .bind(cmd.end_date)
                    .fetch_one(&mut **tx)
                    .await
            })
        })
        .await;

    match created {
        Ok(artwork) => {
            audit
                .record(
                    "artwork_created",
                    "artwork",
                    Some(artwork.id),
                    Some(&user),
                    serde_json::json!({ "title": artwork.title, "end_date": artwork.end_date }),
                    &ctx,
                )
                .await;
            (StatusCode::CREATED, Json(artwork)).into_response()
        }
        Err(e) => {
            tracing::error!("{:<12} --> 출품 처리 실패: {:?}", "Command", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "출품을 처리하지 못했습니다.",
                    "code": "DATABASE_ERROR"
                })),
            )
                .into_response()
        }
    }
}

/// 결제 생성 요청 처리
pub async fn handle_create_payment(
    State((db_manager, _, audit)): State<AppState>,
    user: AuthUser,
    ctx: RequestContext,
    Json(cmd): Json<CreatePaymentRequest>,
) -> impl IntoResponse {
    info!("{:<12} --> 결제 생성 요청 처리 시작: {:?}", "Command", cmd);

    match create_payment(&db_manager, &audit, &user, &ctx, cmd.bid_id).await {
        Ok(payment) => (StatusCode::CREATED, Json(payment)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 결제사 웹훅 처리. 서명 검증은 업스트림 수신 계층의 몫이다.
pub async fn handle_payment_webhook(
    State((db_manager, hub, audit)): State<AppState>,
    ctx: RequestContext,
    Json(event): Json<PaymentWebhookEvent>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 결제 웹훅 수신: type={}, reference={}",
        "Webhook", event.event_type, event.external_reference
    );

    let result = match event.event_type.as_str() {
        "payment.succeeded" => {
            on_payment_succeeded(
                &db_manager,
                &hub,
                &audit,
                &ctx,
                event.external_reference,
                event.charge_reference,
            )
            .await
        }
        "payment.failed" => {
            on_payment_failed(
                &db_manager,
                &hub,
                &audit,
                &ctx,
                event.external_reference,
                event.failure_reason,
            )
            .await
        }
        other => {
            info!("{:<12} --> 처리 대상 아닌 이벤트 타입: {}", "Webhook", other);
            return Json(serde_json::json!({ "status": "ignored" })).into_response();
        }
    };

    match result {
        Ok(_) => Json(serde_json::json!({ "status": "success" })).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 만료 경매 즉시 마감 (관리자 전용)
pub async fn handle_admin_sweep(
    State((db_manager, _, audit)): State<AppState>,
    user: AuthUser,
    ctx: RequestContext,
) -> impl IntoResponse {
    if !can_administer(user.role) {
        return AuthError::Forbidden.into_response();
    }

    match sweep_expired_auctions(db_manager.pool(), Utc::now()).await {
        Ok(closed) => {
            audit
                .record(
                    "expiry_sweep_run",
                    "artwork",
                    None,
                    Some(&user),
                    serde_json::json!({ "closed_count": closed }),
                    &ctx,
                )
                .await;
            Json(serde_json::json!({ "closed_count": closed })).into_response()
        }
        Err(e) => {
            tracing::error!("{:<12} --> 만료 마감 실패: {:?}", "Command", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "만료 경매 마감에 실패했습니다.",
                    "code": "DATABASE_ERROR"
                })),
            )
                .into_response()
        }
    }
}

/// 사용자 하드 삭제 (관리자 전용, 명시적 캐스케이드)
pub async fn handle_admin_delete_user(
    State((db_manager, _, audit)): State<AppState>,
    user: AuthUser,
    ctx: RequestContext,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    if !can_administer(user.role) {
        return AuthError::Forbidden.into_response();
    }

    match delete_user_cascade(&db_manager, user_id).await {
        Ok(report) => {
            audit
                .record(
                    "user_deleted",
                    "user",
                    Some(user_id),
                    Some(&user),
                    serde_json::json!({
                        "bids_deleted": report.bids_deleted,
                        "artworks_deleted": report.artworks_deleted,
                    }),
                    &ctx,
                )
                .await;
            Json(report).into_response()
        }
        Err(e) => e.into_response(),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 작품 목록 조회
pub async fn handle_list_artworks(
    State((db_manager, _, _)): State<AppState>,
) -> impl IntoResponse {
    info!("{:<12} --> 작품 목록 조회", "HandlerQuery");
    match query::handlers::list_artworks(&db_manager).await {
        Ok(artworks) => Json(artworks).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 작품 조회
pub async fn handle_get_artwork(
    State((db_manager, _, _)): State<AppState>,
    Path(artwork_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 작품 조회 id: {}", "HandlerQuery", artwork_id);
    match query::handlers::get_artwork(&db_manager, artwork_id).await {
        Ok(Some(artwork)) => Json(artwork).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "작품을 찾을 수 없습니다.",
                "code": "ARTWORK_NOT_FOUND",
                "artwork_id": artwork_id
            })),
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 작품 입찰 이력 조회
pub async fn handle_list_artwork_bids(
    State((db_manager, _, _)): State<AppState>,
    Path(artwork_id): Path<i64>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 작품 입찰 이력 조회 id: {}",
        "HandlerQuery", artwork_id
    );
    match query::handlers::list_artwork_bids(&db_manager, artwork_id).await {
        Ok(bids) => Json(bids).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 내 입찰 조회
pub async fn handle_my_bids(
    State((db_manager, _, _)): State<AppState>,
    user: AuthUser,
) -> impl IntoResponse {
    info!("{:<12} --> 내 입찰 조회 user: {}", "HandlerQuery", user.id);
    match query::handlers::list_bids_by_bidder(&db_manager, user.id).await {
        Ok(bids) => Json(bids).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

/// 결제 조회. 구매자는 전 상태, 판매자/관리자는 완료된 결제만 볼 수 있다.
pub async fn handle_get_payment(
    State((db_manager, _, _)): State<AppState>,
    user: AuthUser,
    Path(payment_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 결제 조회 id: {}", "HandlerQuery", payment_id);

    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "결제를 찾을 수 없습니다.",
                "code": "PAYMENT_NOT_FOUND"
            })),
        )
            .into_response()
    };

    let payment = match query::handlers::get_payment(&db_manager, payment_id).await {
        Ok(Some(payment)) => payment,
        Ok(None) => return not_found(),
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    };

    let Ok(Some(bid)) = query::handlers::get_bid(&db_manager, payment.bid_id).await else {
        return not_found();
    };
    let Ok(Some(artwork)) = query::handlers::get_artwork(&db_manager, bid.artwork_id).await else {
        return not_found();
    };

    let is_buyer = user.id == bid.bidder_id;
    let is_seller = user.id == artwork.seller_id;
    let is_admin = can_administer(user.role);

    if is_buyer {
        return Json(payment).into_response();
    }

    if (is_seller || is_admin) && payment.status == payment_status::SUCCEEDED {
        return Json(payment).into_response();
    }

    if is_seller || is_admin {
        // 완료 전 결제는 존재 자체를 숨긴다
        return not_found();
    }

    AuthError::Forbidden.into_response()
}

/// 헬스 체크
pub async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// endregion: --- Query Handlers

// region:    --- Realtime Handler

/// WebSocket 업그레이드. 클라이언트는 작품별 룸에 join/leave 한다.
pub async fn handle_ws(
    State((_, hub, _)): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| realtime::handle_socket(socket, hub))
}

// endregion: --- Realtime Handler
