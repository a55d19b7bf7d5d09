//! 티켓 핸들러
//!
//! 모든 조회/변경은 저장소를 건드리기 전에 permissions 검사를 통과해야
//! 합니다. 목록 조회는 `TicketScope`로 쿼리 범위 자체를 제한합니다.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use tkt_core::auth::AuthUser;
use tkt_core::permissions::{self, TicketFilter, TicketScope};
use tkt_core::principal::Role;
use tkt_core::ticket::{NewAttachment, NewTicket, Ticket, TicketPriority, TicketStatus};
use tkt_core::Error;

use crate::db::{AttachmentRow, MessageRow};
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub attachment: Option<AttachmentMeta>,
}

/// 첨부 메타데이터 (파일 바이트는 업로드 계층이 처리)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMeta {
    pub file_name: String,
    pub stored_path: String,
}

#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
    pub priority: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub body: String,
}

/// 티켓 생성
///
/// status=open, priority=low로 시작합니다. 첨부 메타데이터가 있으면
/// 같은 트랜잭션으로 기록됩니다.
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>)> {
    if req.title.is_empty() || req.description.is_empty() || req.category.is_empty() {
        return Err(Error::Validation {
            message: "title, description and category are required".to_string(),
        }
        .into());
    }

    let new_ticket = NewTicket {
        title: req.title,
        description: req.description,
        category: req.category,
    };
    let attachment = req.attachment.map(|a| NewAttachment {
        file_name: a.file_name,
        stored_path: a.stored_path,
    });

    let ticket = state
        .db
        .create_ticket(&user.id, &new_ticket, attachment.as_ref())
        .await?;

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// 티켓 목록 조회 (role 범위 적용)
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(q): Query<ListTicketsQuery>,
) -> Result<Json<Vec<Ticket>>> {
    let status = match q.status.as_deref() {
        Some(value) => Some(TicketStatus::parse(value).ok_or(Error::Validation {
            message: "unknown status filter".to_string(),
        })?),
        None => None,
    };

    let scope = TicketScope::resolve(
        &user,
        TicketFilter {
            status,
            category: q.category,
            search: q.search,
        },
    );

    Ok(Json(state.db.list_tickets(&scope).await?))
}

/// 단일 티켓 조회
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Ticket>> {
    let ticket = fetch_guarded(&state, &user, &id).await?;
    Ok(Json(ticket))
}

/// 상태/우선순위 변경 (Support 전용)
pub async fn update_ticket_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Ticket>> {
    permissions::require_role(&user, Role::Support)?;

    let status = TicketStatus::parse(&req.status).ok_or(Error::Validation {
        message: "status must be open, pending or resolved".to_string(),
    })?;
    let priority = TicketPriority::parse(&req.priority).ok_or(Error::Validation {
        message: "priority must be low, medium or high".to_string(),
    })?;

    let ticket = state
        .db
        .update_ticket_status(&id, status, priority, &user.id)
        .await?;

    Ok(Json(ticket))
}

/// 티켓 메시지 목록
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MessageRow>>> {
    fetch_guarded(&state, &user, &id).await?;
    Ok(Json(state.db.list_messages(&id).await?))
}

/// 티켓 메시지 작성
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(req): Json<CreateMessageRequest>,
) -> Result<(StatusCode, Json<MessageRow>)> {
    fetch_guarded(&state, &user, &id).await?;

    if req.body.is_empty() {
        return Err(Error::Validation {
            message: "message body is required".to_string(),
        }
        .into());
    }

    let message = state.db.create_message(&id, &user.id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// 티켓 첨부 목록
pub async fn list_attachments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AttachmentRow>>> {
    fetch_guarded(&state, &user, &id).await?;
    Ok(Json(state.db.list_attachments(&id).await?))
}

/// 티켓 조회 + 소유권/role 검사
///
/// 소유자가 아니고 Support도 아니면 Forbidden입니다. 메시지/첨부 접근도
/// 소유 티켓을 통해 이 검사를 거칩니다.
async fn fetch_guarded(state: &AppState, user: &AuthUser, id: &str) -> Result<Ticket> {
    let ticket = state
        .db
        .get_ticket(id)
        .await?
        .ok_or(Error::NotFound { resource: "ticket" })?;

    permissions::require_ownership_or_role(user, &ticket.requester_id, Role::Support)?;

    Ok(ticket)
}
