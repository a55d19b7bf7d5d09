//! Role/소유권 검사
//!
//! 두 개의 직교하는 검사를 제공합니다. 둘 다 요청이 리소스를 건드리기
//! 전에 호출되어야 합니다.

use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::principal::Role;

/// 특정 role 요구
///
/// Support 전용 작업(계정 생성, 전체 티켓 조회 필터, 상태/우선순위 변경)을
/// 가드합니다. 불일치는 `InsufficientRole`입니다.
pub fn require_role(user: &AuthUser, role: Role) -> Result<()> {
    if user.role == role {
        Ok(())
    } else {
        Err(Error::InsufficientRole)
    }
}

/// 소유권 또는 특정 role 요구
///
/// `user.role == role`이거나 `owner_id == user.id`면 통과합니다.
/// 단일 티켓 조회/변경과 티켓에 속한 메시지/첨부 접근에 적용됩니다.
pub fn require_ownership_or_role(user: &AuthUser, owner_id: &str, role: Role) -> Result<()> {
    if user.role == role || user.id == owner_id {
        Ok(())
    } else {
        Err(Error::Forbidden)
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
    fn test_require_role() {
        let support = user("u1", Role::Support);
        let requester = user("u2", Role::Requester);

        assert!(require_role(&support, Role::Support).is_ok());
        assert!(matches!(
            require_role(&requester, Role::Support),
            Err(Error::InsufficientRole)
        ));
        assert!(require_role(&requester, Role::Requester).is_ok());
    }

    #[test]
    fn test_ownership_or_role() {
        let support = user("u1", Role::Support);
        let owner = user("u2", Role::Requester);
        let stranger = user("u3", Role::Requester);

        // Support는 소유와 무관하게 통과
        assert!(require_ownership_or_role(&support, "u2", Role::Support).is_ok());

        // 소유자는 role과 무관하게 통과
        assert!(require_ownership_or_role(&owner, "u2", Role::Support).is_ok());

        // 둘 다 아니면 Forbidden
        assert!(matches!(
            require_ownership_or_role(&stranger, "u2", Role::Support),
            Err(Error::Forbidden)
        ));
    }
}
