//! 티켓 도메인 타입

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 티켓 상태
///
/// 상태 전이는 제약하지 않습니다. Support 권한이면 어떤 상태에서 어떤
/// 상태로도 변경할 수 있습니다 (역방향 포함).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Pending,
    Resolved,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::Resolved => "resolved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(TicketStatus::Open),
            "pending" => Some(TicketStatus::Pending),
            "resolved" => Some(TicketStatus::Resolved),
            _ => None,
        }
    }
}

/// 티켓 우선순위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Medium => "medium",
            TicketPriority::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(TicketPriority::Low),
            "medium" => Some(TicketPriority::Medium),
            "high" => Some(TicketPriority::High),
            _ => None,
        }
    }
}

/// 티켓
///
/// 소유자는 `requester_id`의 계정입니다. status/priority/support_id는
/// Support role만 변경할 수 있습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// 티켓 ID (ULID)
    pub id: String,

    /// 제목
    pub title: String,

    /// 본문
    pub description: String,

    /// 분류 (자유 문자열: hardware, network, ...)
    pub category: String,

    /// 상태
    pub status: TicketStatus,

    /// 우선순위
    pub priority: TicketPriority,

    /// 제출한 계정 ID
    pub requester_id: String,

    /// 제출한 계정의 표시 이름 (조회 시 JOIN으로 채움)
    pub requester_name: String,

    /// 마지막으로 처리한 Support 계정 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_id: Option<String>,

    /// 생성 시각
    pub created_at: DateTime<Utc>,
}

/// 티켓 생성 입력
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub category: String,
}

/// 첨부파일 메타데이터 생성 입력
///
/// 파일 바이트 처리는 이 코어의 범위 밖이며, 메타데이터 행만 기록합니다.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub file_name: String,
    pub stored_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [TicketStatus::Open, TicketStatus::Pending, TicketStatus::Resolved] {
            assert_eq!(TicketStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TicketStatus::parse("closed"), None);
    }

    #[test]
    fn test_priority_round_trip() {
        for priority in [TicketPriority::Low, TicketPriority::Medium, TicketPriority::High] {
            assert_eq!(TicketPriority::parse(priority.as_str()), Some(priority));
        }
        assert_eq!(TicketPriority::parse("urgent"), None);
    }
}
