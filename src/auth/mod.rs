/// 인증 컨텍스트
/// 토큰 검증은 업스트림 게이트웨이(외부 IdP 연동) 담당이며,
/// 본 서비스는 게이트웨이가 주입한 인증 결과 헤더만 신뢰한다.
// region:    --- Imports
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// endregion: --- Imports

// region:    --- Role

/// 사용자 역할 (IdP에서 결정되며, 클라이언트가 스스로 선언할 수 없음)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Buyer,
    Seller,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "BUYER",
            Role::Seller => "SELLER",
            Role::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUYER" => Ok(Role::Buyer),
            "SELLER" => Ok(Role::Seller),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

// endregion: --- Role

// region:    --- Capability Guards

/// 입찰 가능 여부
pub fn can_bid(role: Role) -> bool {
    matches!(role, Role::Buyer | Role::Admin)
}

/// 출품(리스팅 생성) 가능 여부
pub fn can_create_listing(role: Role) -> bool {
    matches!(role, Role::Seller | Role::Admin)
}

/// 관리자 작업 가능 여부
pub fn can_administer(role: Role) -> bool {
    matches!(role, Role::Admin)
}

// endregion: --- Capability Guards

// region:    --- AuthUser

/// 인증된 사용자. 모든 핵심 연산은 이 값을 명시적 인자로 받는다.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

/// 인증 실패
#[derive(Debug)]
pub enum AuthError {
    MissingIdentity,
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingIdentity => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "인증 정보가 없습니다.",
                    "code": "UNAUTHENTICATED"
                })),
            )
                .into_response(),
            // 어떤 검증에서 실패했는지는 노출하지 않는다
            AuthError::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({
                    "error": "권한이 없습니다.",
                    "code": "FORBIDDEN"
                })),
            )
                .into_response(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or(AuthError::MissingIdentity)?;

        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<Role>().ok())
            .ok_or(AuthError::MissingIdentity)?;

        Ok(AuthUser { id, role })
    }
}

// endregion: --- AuthUser

// region:    --- Tests


// endregion: --- Tests
