//! 권한 검사 및 조회 범위 결정
//!
//! 모든 판정은 `(role, requester_id, principal.id)`의 순수 함수입니다.
//! 저장소나 다른 엔티티는 접근 판정에 관여하지 않습니다.

mod policy;
mod scope;

pub use policy::{require_ownership_or_role, require_role};
pub use scope::{TicketFilter, TicketScope};
