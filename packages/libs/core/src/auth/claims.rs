//! Access Token Claims
//!
//! Access Token의 페이로드 구조입니다. 저장소에 영속되지 않으며
//! 로그인/리프레시 때마다 새로 만들어집니다.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::principal::{Principal, Role};

/// Access Token Claims (PASETO v4.local 페이로드)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (계정 ID)
    pub sub: String,

    /// 표시 이름
    pub display_name: String,

    /// 이메일
    pub email: String,

    /// Role
    pub role: Role,

    /// 발급 시각
    pub iat: DateTime<Utc>,

    /// 만료 시각
    pub exp: DateTime<Utc>,
}

impl AccessClaims {
    /// 계정에서 새 claims 생성
    pub fn from_principal(principal: &Principal, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: principal.id.clone(),
            display_name: principal.display_name.clone(),
            email: principal.email.clone(),
            role: principal.role,
            iat: now,
            exp: now + Duration::seconds(ttl_seconds),
        }
    }

    /// 만료 여부 확인
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.exp
    }

    /// 남은 TTL (초)
    pub fn remaining_ttl(&self) -> i64 {
        let diff = self.exp - Utc::now();
        diff.num_seconds().max(0)
    }
}

/// 요청 스코프의 인증된 사용자
///
/// AuthenticationGate가 토큰 검증 후 요청 컨텍스트에 붙이는 값입니다.
/// 저장소 조회 없이 claims에서만 만들어집니다.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// 계정 ID
    pub id: String,

    /// 표시 이름
    pub display_name: String,

    /// 이메일
    pub email: String,

    /// Role
    pub role: Role,
}

impl From<AccessClaims> for AuthUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            id: claims.sub,
            display_name: claims.display_name,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl AuthUser {
    /// Support role 여부 확인
    pub fn is_support(&self) -> bool {
        matches!(self.role, Role::Support)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_principal() -> Principal {
        Principal {
            id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
            display_name: "Bruno Lima".to_string(),
            email: "bruno@example.com".to_string(),
            password_hash: "x".to_string(),
            role: Role::Support,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_claims_expiry_window() {
        let claims = AccessClaims::from_principal(&sample_principal(), 900);

        assert!(!claims.is_expired());
        assert_eq!((claims.exp - claims.iat).num_seconds(), 900);
        assert!(claims.remaining_ttl() > 895);
    }

    #[test]
    fn test_auth_user_from_claims() {
        let claims = AccessClaims::from_principal(&sample_principal(), 900);
        let user = AuthUser::from(claims);

        assert_eq!(user.id, "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(user.email, "bruno@example.com");
        assert!(user.is_support());
    }
}
