// region:    --- Imports
use crate::audit::AuditRecorder;
use crate::database::DatabaseManager;
use crate::realtime::RealtimeHub;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Modules
mod audit;
mod auction;
mod auth;
mod bidding;
mod database;
mod handlers;
mod payment;
mod query;
mod realtime;
mod scheduler;
mod users;

// endregion: --- Modules

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 스키마 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 실시간 허브 및 감사 기록기 생성
    let hub = Arc::new(RealtimeHub::new());
    let audit = Arc::new(AuditRecorder::postgres(db_manager.get_pool()));

    // 만료 스위퍼 시작 (관리자 API로도 즉시 실행 가능)
    let sweeper = scheduler::AuctionSweeper::new(db_manager.get_pool());
    sweeper.start().await;

    // 브라우저 클라이언트를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route("/health", get(handlers::handle_health))
        .route("/api/artworks", post(handlers::handle_create_artwork))
        .route("/api/artworks", get(handlers::handle_list_artworks))
        .route("/api/artworks/:id", get(handlers::handle_get_artwork))
        .route(
            "/api/artworks/:id/bids",
            get(handlers::handle_list_artwork_bids),
        )
        .route("/api/bids", post(handlers::handle_create_bid))
        .route("/api/bids/mine", get(handlers::handle_my_bids))
        .route("/api/payments", post(handlers::handle_create_payment))
        .route("/api/payments/webhook", post(handlers::handle_payment_webhook))
        .route("/api/payments/:id", get(handlers::handle_get_payment))
        .route("/api/admin/sweep", post(handlers::handle_admin_sweep))
        .route(
            "/api/admin/users/:id",
            delete(handlers::handle_admin_delete_user),
        )
        .route("/ws", get(handlers::handle_ws))
        .layer(cors)
        .with_state((db_manager, hub, audit));

    // 리스너 생성
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = TcpListener::bind(&bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
