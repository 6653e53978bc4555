/// 사용자 모델과 명시적 삭제 캐스케이드
/// ORM의 암묵적 cascade 애너테이션 대신, 어떤 행이 함께 지워지는지를
/// 함수 하나에 드러낸다: 사용자 → 본인 입찰 + 출품작(과 그 위의 입찰).
/// 낙찰/결제가 얽힌 사용자는 하드 삭제를 거부한다.
// region:    --- Imports
use crate::database::DatabaseManager;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

// endregion: --- Imports

// region:    --- Model

// 사용자 모델. 신원 상세(이메일 등)는 외부 IdP가 관리한다.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub auth_subject: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// 캐스케이드 삭제 결과
#[derive(Debug, Clone, Serialize)]
pub struct CascadeReport {
    pub user_id: i64,
    pub bids_deleted: u64,
    pub artworks_deleted: u64,
}

// endregion: --- Model

// region:    --- Errors

#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("사용자를 찾을 수 없습니다.")]
    UserNotFound { user_id: i64 },

    #[error("낙찰 또는 결제 이력이 있는 사용자는 삭제할 수 없습니다.")]
    HasSettledSales,

    #[error("데이터베이스 오류")]
    Database(#[from] sqlx::Error),
}

impl CascadeError {
    pub fn code(&self) -> &'static str {
        match self {
            CascadeError::UserNotFound { .. } => "USER_NOT_FOUND",
            CascadeError::HasSettledSales => "USER_HAS_SETTLED_SALES",
            CascadeError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl IntoResponse for CascadeError {
    fn into_response(self) -> Response {
        let status = match self {
            CascadeError::UserNotFound { .. } => StatusCode::NOT_FOUND,
            CascadeError::HasSettledSales => StatusCode::CONFLICT,
            CascadeError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self {
            CascadeError::Database(_) => "요청을 처리하지 못했습니다.".to_string(),
            ref e => e.to_string(),
        };
        (
            status,
            Json(serde_json::json!({ "error": message, "code": self.code() })),
        )
            .into_response()
    }
}

// endregion: --- Errors

// region:    --- Cascade Delete

const USER_HAS_SETTLED_SALES: &str = r#"
    SELECT EXISTS (
        SELECT 1 FROM bids b
        LEFT JOIN payments p ON p.bid_id = b.id
        WHERE (b.bidder_id = $1
               OR b.artwork_id IN (SELECT id FROM artworks WHERE seller_id = $1))
          AND (b.is_winning OR p.id IS NOT NULL)
    )
"#;

const DELETE_USER_BIDS: &str = r#"
    DELETE FROM bids
    WHERE bidder_id = $1
       OR artwork_id IN (SELECT id FROM artworks WHERE seller_id = $1)
"#;

const DELETE_USER_ARTWORKS: &str = "DELETE FROM artworks WHERE seller_id = $1";

const DELETE_USER: &str = "DELETE FROM users WHERE id = $1";

/// 사용자 하드 삭제 (캐스케이드)
pub async fn delete_user_cascade(
    db: &DatabaseManager,
    user_id: i64,
) -> Result<CascadeReport, CascadeError> {
    info!("{:<12} --> 사용자 삭제 요청: user_id={}", "Users", user_id);

    db.transaction(move |tx| {
        Box::pin(async move {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&mut **tx)
                .await?;
            if !exists {
                return Err(CascadeError::UserNotFound { user_id });
            }

            // 낙찰/결제가 걸린 행은 지우지 않는다
            let settled: bool = sqlx::query_scalar(USER_HAS_SETTLED_SALES)
                .bind(user_id)
                .fetch_one(&mut **tx)
                .await?;
            if settled {
                return Err(CascadeError::HasSettledSales);
            }

            let bids_deleted = sqlx::query(DELETE_USER_BIDS)
                .bind(user_id)
                .execute(&mut **tx)
                .await?
                .rows_affected();

            let artworks_deleted = sqlx::query(DELETE_USER_ARTWORKS)
                .bind(user_id)
                .execute(&mut **tx)
                .await?
                .rows_affected();

            sqlx::query(DELETE_USER)
                .bind(user_id)
                .execute(&mut **tx)
                .await?;

            Ok(CascadeReport {
                user_id,
                bids_deleted,
                artworks_deleted,
            })
        })
    })
    .await
}

// endregion: --- Cascade Delete
