//! 계정(Principal) 타입
//!
//! 인증 가능한 계정과 Role을 정의합니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 계정 Role
///
/// 닫힌 2-값 enum입니다. 문자열 role 대신 tagged variant를 사용해
/// `require_role` 검사가 타입 수준에서 exhaustive하도록 합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// 티켓을 제출하는 사용자
    Requester,

    /// 지원 담당자 (에이전트/관리자)
    Support,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Requester => "requester",
            Role::Support => "support",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "requester" => Some(Role::Requester),
            "support" => Some(Role::Support),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 계정(Principal)
///
/// 저장소에 영속되는 계정 정보입니다. 비밀번호는 argon2id 해시로만
/// 저장되며 평문은 어디에도 남지 않습니다.
#[derive(Debug, Clone)]
pub struct Principal {
    /// 계정 ID (ULID)
    pub id: String,

    /// 표시 이름
    pub display_name: String,

    /// 이메일 (로그인 식별자, unique)
    pub email: String,

    /// argon2id 비밀번호 해시
    pub password_hash: String,

    /// Role
    pub role: Role,

    /// 생성 시각
    pub created_at: DateTime<Utc>,
}

/// 외부 노출용 계정 정보
///
/// 비밀번호 해시를 제외한 필드만 담습니다. 로그인/프로필 응답에 사용됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: Role,
}

impl Principal {
    /// Support role 여부 확인
    pub fn is_support(&self) -> bool {
        matches!(self.role, Role::Support)
    }

    /// 비밀번호 해시를 제외한 프로필로 변환
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::parse("requester"), Some(Role::Requester));
        assert_eq!(Role::parse("support"), Some(Role::Support));
        assert_eq!(Role::parse("admin"), None);
        assert_eq!(Role::Support.as_str(), "support");
    }

    #[test]
    fn test_profile_has_no_password_hash() {
        let principal = Principal {
            id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
            display_name: "Ana Souza".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "$argon2id$v=19$...".to_string(),
            role: Role::Requester,
            created_at: Utc::now(),
        };

        let profile = principal.profile();
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("\"displayName\":\"Ana Souza\""));
        assert!(json.contains("\"role\":\"requester\""));
    }
}
