/// 감사 기록 디스패처
/// 기본 트랜잭션 커밋 이후에만 호출되며, 어떤 실패도 호출자에게 전파하지 않는다.
/// 모니터링 계층의 장애가 입찰/결제 같은 본 동작을 막아서는 안 된다.
// region:    --- Imports
use crate::auth::AuthUser;
use async_trait::async_trait;
use axum::async_trait as axum_async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Model

/// 감사 로그 행 (append-only)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<i64>,
    pub details: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 요청 부가 정보 (IP, User-Agent). 없어도 기록은 진행된다.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[axum_async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip_address = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string());

        let user_agent = parts
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        Ok(RequestContext {
            ip_address,
            user_agent,
        })
    }
}

// endregion: --- Model

// region:    --- Audit Sink

/// 감사 로그 저장소 트레이트
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(
        &self,
        user_id: Option<i64>,
        action: &str,
        resource_type: &str,
        resource_id: Option<i64>,
        details: serde_json::Value,
        ctx: &RequestContext,
    ) -> Result<AuditLog, sqlx::Error>;
}

/// 감사 로그 저장소 구현체
pub struct PostgresAuditSink {
    pool: Arc<PgPool>,
}

impl PostgresAuditSink {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditSink for PostgresAuditSink {
    async fn append(
        &self,
        user_id: Option<i64>,
        action: &str,
        resource_type: &str,
        resource_id: Option<i64>,
        details: serde_json::Value,
        ctx: &RequestContext,
    ) -> Result<AuditLog, sqlx::Error> {
        sqlx::query_as::<_, AuditLog>(
            "INSERT INTO audit_logs (user_id, action, resource_type, resource_id, details, ip_address, user_agent)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(user_id)
        .bind(action)
        .bind(resource_type)
        .bind(resource_id)
        .bind(details)
        .bind(ctx.ip_address.as_deref())
        .bind(ctx.user_agent.as_deref())
        .fetch_one(&*self.pool)
        .await
    }
}

// endregion: --- Audit Sink

// region:    --- Audit Recorder

/// 감사 기록기. 저장 실패는 내부에서 잡아 운영 로그로만 남긴다.
pub struct AuditRecorder {
    sink: Box<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Box<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self::new(Box::new(PostgresAuditSink::new(pool)))
    }

    /// 감사 항목 기록. 실패 시 None — 호출자는 오류를 다룰 필요가 없다.
    pub async fn record(
        &self,
        action: &str,
        resource_type: &str,
        resource_id: Option<i64>,
        actor: Option<&AuthUser>,
        details: serde_json::Value,
        ctx: &RequestContext,
    ) -> Option<AuditLog> {
        let user_id = actor.map(|u| u.id);
        match self
            .sink
            .append(user_id, action, resource_type, resource_id, details, ctx)
            .await
        {
            Ok(entry) => {
                info!(
                    "{:<12} --> 감사 기록: {} on {}:{:?} by {:?}",
                    "Audit", action, resource_type, resource_id, user_id
                );
                Some(entry)
            }
            Err(e) => {
                error!("{:<12} --> 감사 기록 실패 (무시됨): {:?}", "Audit", e);
                None
            }
        }
    }
}

// endregion: --- Audit Recorder

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// 항상 실패하는 저장소
    struct FailingSink;

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn append(
            &self,
            _user_id: Option<i64>,
            _action: &str,
            _resource_type: &str,
            _resource_id: Option<i64>,
            _details: serde_json::Value,
            _ctx: &RequestContext,
        ) -> Result<AuditLog, sqlx::Error> {
            Err(sqlx::Error::PoolClosed)
        }
    }

    /// 호출 내용을 기억하는 저장소
    struct RecordingSink {
        actions: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AuditSink for RecordingSink {
        async fn append(
            &self,
            user_id: Option<i64>,
            action: &str,
            resource_type: &str,
            resource_id: Option<i64>,
            details: serde_json::Value,
            _ctx: &RequestContext,
        ) -> Result<AuditLog, sqlx::Error> {
            self.actions.lock().unwrap().push(action.to_string());
            Ok(AuditLog {
                id: 1,
                user_id,
                action: action.to_string(),
                resource_type: resource_type.to_string(),
                resource_id,
                details: Some(details),
                ip_address: None,
                user_agent: None,
                created_at: Utc::now(),
            })
        }
    }

    #[tokio::test]
    async fn test_record_swallows_sink_failure() {
        let recorder = AuditRecorder::new(Box::new(FailingSink));
        let result = recorder
            .record(
                "bid_placed",
                "bid",
                Some(1),
                None,
                serde_json::json!({}),
                &RequestContext::default(),
            )
            .await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_record_returns_entry_on_success() {
        let recorder = AuditRecorder::new(Box::new(RecordingSink {
            actions: Mutex::new(Vec::new()),
        }));
        let user = AuthUser {
            id: 7,
            role: crate::auth::Role::Buyer,
        };
        let entry = recorder
            .record(
                "bid_placed",
                "bid",
                Some(3),
                Some(&user),
                serde_json::json!({"amount": 50.0}),
                &RequestContext::default(),
            )
            .await
            .unwrap();
        assert_eq!(entry.action, "bid_placed");
        assert_eq!(entry.user_id, Some(7));
    }
}

// endregion: --- Tests
