//! 티켓 조회 범위 결정
//!
//! 조회 결과를 사후 필터링하는 대신, 실행할 쿼리의 범위 자체를 role에
//! 맞춰 결정합니다. Requester는 구조적으로 자기 티켓 밖을 조회할 수
//! 없습니다.

use crate::auth::AuthUser;
use crate::principal::Role;
use crate::ticket::TicketStatus;

/// 호출자가 제시한 조회 필터
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    /// 상태 필터
    pub status: Option<TicketStatus>,

    /// 분류 필터
    pub category: Option<String>,

    /// 제목/본문 대소문자 무시 검색
    pub search: Option<String>,
}

/// role이 반영된 최종 조회 범위
///
/// `requester_id`가 Some이면 해당 계정의 티켓으로 한정됩니다.
#[derive(Debug, Clone)]
pub struct TicketScope {
    pub requester_id: Option<String>,
    pub status: Option<TicketStatus>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl TicketScope {
    /// 호출자 필터를 role 범위로 변환
    ///
    /// - Support: 소유자 제한 없음, 필터 그대로 적용
    /// - Requester: 호출자가 무엇을 보냈든 `requester_id = user.id`로 고정
    pub fn resolve(user: &AuthUser, filter: TicketFilter) -> Self {
        let requester_id = match user.role {
            Role::Support => None,
            Role::Requester => Some(user.id.clone()),
        };

        Self {
            requester_id,
            status: filter.status,
            category: filter.category,
            search: filter.search,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: Role) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            display_name: "tester".to_string(),
            email: "tester@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_support_scope_is_unrestricted() {
        let scope = TicketScope::resolve(
            &user("sup1", Role::Support),
            TicketFilter {
                status: Some(TicketStatus::Open),
                category: Some("network".to_string()),
                search: None,
            },
        );

        assert_eq!(scope.requester_id, None);
        assert_eq!(scope.status, Some(TicketStatus::Open));
        assert_eq!(scope.category.as_deref(), Some("network"));
    }

    #[test]
    fn test_requester_scope_is_owner_forced() {
        let scope = TicketScope::resolve(&user("req1", Role::Requester), TicketFilter::default());
        assert_eq!(scope.requester_id.as_deref(), Some("req1"));
    }

    #[test]
    fn test_requester_keeps_content_filters() {
        let scope = TicketScope::resolve(
            &user("req1", Role::Requester),
            TicketFilter {
                status: None,
                category: None,
                search: Some("printer".to_string()),
            },
        );

        assert_eq!(scope.requester_id.as_deref(), Some("req1"));
        assert_eq!(scope.search.as_deref(), Some("printer"));
    }
}
