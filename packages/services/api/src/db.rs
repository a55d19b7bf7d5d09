//! 저장소 계층
//!
//! SQLite 위의 좁은 인터페이스입니다. Refresh 세션의 single-session
//! invariant와 티켓+첨부 쓰기의 원자성은 전부 이 파일의 트랜잭션
//! 경계 안에서 보장됩니다.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use tkt_core::auth::{generate_refresh_token, refresh_token_digest};
use tkt_core::permissions::TicketScope;
use tkt_core::principal::{Principal, Role};
use tkt_core::ticket::{NewAttachment, NewTicket, Ticket, TicketPriority, TicketStatus};
use tkt_core::Error;

use crate::error::{ApiError, Result};

#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        if let Some(path) = db_url.strip_prefix("sqlite://") {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    /// 인메모리 DB (테스트/로컬 실험용)
    pub async fn memory() -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.init().await?;
        Ok(db)
    }

    async fn init(&self) -> anyhow::Result<()> {
        let queries = [
            r#"CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                display_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
            // principal_id가 PRIMARY KEY이므로 계정당 세션은 스키마
            // 수준에서도 최대 한 행입니다.
            r#"CREATE TABLE IF NOT EXISTS refresh_sessions (
                principal_id TEXT PRIMARY KEY,
                token_hash TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                status TEXT NOT NULL,
                priority TEXT NOT NULL,
                requester_id TEXT NOT NULL,
                support_id TEXT,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                ticket_id TEXT NOT NULL,
                author_id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS attachments (
                id TEXT PRIMARY KEY,
                ticket_id TEXT NOT NULL,
                file_name TEXT NOT NULL CHECK (file_name <> ''),
                stored_path TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
        ];

        for q in queries {
            sqlx::query(q).execute(&self.pool).await?;
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Users
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn create_principal(
        &self,
        display_name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Principal> {
        let id = ulid::Ulid::new().to_string();
        let created_at = Utc::now();

        sqlx::query(
            r#"INSERT INTO users (id, display_name, email, password_hash, role, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
        )
        .bind(&id)
        .bind(display_name)
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Principal {
            id,
            display_name: display_name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at,
        })
    }

    /// 초기 Support 계정 보장 (이미 있으면 그대로 둠)
    pub async fn ensure_support_account(
        &self,
        display_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO users (id, display_name, email, password_hash, role, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(email) DO NOTHING"#,
        )
        .bind(ulid::Ulid::new().to_string())
        .bind(display_name)
        .bind(email)
        .bind(password_hash)
        .bind(Role::Support.as_str())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_principal_by_email(&self, email: &str) -> Result<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"SELECT id, display_name, email, password_hash, role, created_at
               FROM users WHERE email = ?1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PrincipalRow::into_principal).transpose()
    }

    pub async fn get_principal_by_id(&self, id: &str) -> Result<Option<Principal>> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"SELECT id, display_name, email, password_hash, role, created_at
               FROM users WHERE id = ?1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PrincipalRow::into_principal).transpose()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Refresh Sessions
    // ─────────────────────────────────────────────────────────────────────────────

    /// 새 refresh 세션 발급
    ///
    /// 같은 계정의 기존 세션 삭제와 새 세션 삽입을 하나의 트랜잭션으로
    /// 수행합니다. 동시 로그인이 경합하면 마지막 커밋이 이기고, 앞선
    /// 세션은 에러 없이 대체됩니다.
    pub async fn issue_refresh_session(
        &self,
        principal_id: &str,
        ttl_seconds: i64,
    ) -> Result<String> {
        let token = generate_refresh_token();
        let token_hash = refresh_token_digest(&token);
        let now = Utc::now();
        let expires_at = now + Duration::seconds(ttl_seconds);

        let mut tx = self.pool.begin().await?;

        sqlx::query(r#"DELETE FROM refresh_sessions WHERE principal_id = ?1"#)
            .bind(principal_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"INSERT INTO refresh_sessions (principal_id, token_hash, created_at, expires_at)
               VALUES (?1, ?2, ?3, ?4)"#,
        )
        .bind(principal_id)
        .bind(&token_hash)
        .bind(now.to_rfc3339())
        .bind(expires_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(token)
    }

    /// Opaque 토큰 검증, 계정 ID 반환
    ///
    /// 토큰을 회전시키지 않습니다. 같은 값이 만료/폐기 전까지 계속
    /// 유효합니다.
    pub async fn validate_refresh_session(&self, token: &str) -> Result<String> {
        let token_hash = refresh_token_digest(token);

        let row = sqlx::query_as::<_, RefreshSessionRow>(
            r#"SELECT principal_id, expires_at
               FROM refresh_sessions WHERE token_hash = ?1"#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Err(Error::NotFound {
                resource: "refresh session",
            }
            .into());
        };

        let expires_at = parse_timestamp(&row.expires_at)?;
        if Utc::now() > expires_at {
            return Err(Error::TokenExpired.into());
        }

        Ok(row.principal_id)
    }

    /// 세션 폐기 (멱등: 없는 토큰도 성공)
    pub async fn revoke_refresh_session(&self, token: &str) -> Result<()> {
        let token_hash = refresh_token_digest(token);

        sqlx::query(r#"DELETE FROM refresh_sessions WHERE token_hash = ?1"#)
            .bind(&token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// 계정의 모든 세션 폐기 (방어용)
    pub async fn revoke_all_refresh_sessions(&self, principal_id: &str) -> Result<()> {
        sqlx::query(r#"DELETE FROM refresh_sessions WHERE principal_id = ?1"#)
            .bind(principal_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Tickets
    // ─────────────────────────────────────────────────────────────────────────────

    /// 티켓 생성 (첨부 메타데이터 포함 시 같은 트랜잭션)
    ///
    /// 첨부 삽입이 실패하면 티켓 삽입도 롤백됩니다.
    pub async fn create_ticket(
        &self,
        requester_id: &str,
        ticket: &NewTicket,
        attachment: Option<&NewAttachment>,
    ) -> Result<Ticket> {
        let id = ulid::Ulid::new().to_string();
        let created_at = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"INSERT INTO tickets (id, title, description, category, status, priority, requester_id, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
        )
        .bind(&id)
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(&ticket.category)
        .bind(TicketStatus::Open.as_str())
        .bind(TicketPriority::Low.as_str())
        .bind(requester_id)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;

        if let Some(att) = attachment {
            sqlx::query(
                r#"INSERT INTO attachments (id, ticket_id, file_name, stored_path, created_at)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
            )
            .bind(ulid::Ulid::new().to_string())
            .bind(&id)
            .bind(&att.file_name)
            .bind(&att.stored_path)
            .bind(&created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.get_ticket(&id).await?.ok_or(ApiError::Internal {
            message: "ticket missing after insert".to_string(),
        })
    }

    /// 범위가 결정된 티켓 목록 조회
    ///
    /// WHERE 절은 `TicketScope`에서만 만들어집니다. 결과를 가져온 뒤
    /// 걸러내는 경로는 없습니다.
    pub async fn list_tickets(&self, scope: &TicketScope) -> Result<Vec<Ticket>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            r#"SELECT t.id, t.title, t.description, t.category, t.status, t.priority,
                      t.requester_id, u.display_name AS requester_name, t.support_id, t.created_at
               FROM tickets t JOIN users u ON t.requester_id = u.id
               WHERE 1=1"#,
        );

        if let Some(requester_id) = &scope.requester_id {
            qb.push(" AND t.requester_id = ").push_bind(requester_id);
        }
        if let Some(status) = scope.status {
            qb.push(" AND t.status = ").push_bind(status.as_str());
        }
        if let Some(category) = &scope.category {
            qb.push(" AND t.category = ").push_bind(category);
        }
        if let Some(search) = &scope.search {
            let pattern = format!("%{}%", search.to_lowercase());
            qb.push(" AND (LOWER(t.title) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR LOWER(t.description) LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        qb.push(" ORDER BY t.created_at DESC");

        let rows: Vec<TicketRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(TicketRow::into_ticket).collect()
    }

    pub async fn get_ticket(&self, id: &str) -> Result<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"SELECT t.id, t.title, t.description, t.category, t.status, t.priority,
                      t.requester_id, u.display_name AS requester_name, t.support_id, t.created_at
               FROM tickets t JOIN users u ON t.requester_id = u.id
               WHERE t.id = ?1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TicketRow::into_ticket).transpose()
    }

    /// 상태/우선순위 변경 (Support 전용 작업, 담당자도 함께 기록)
    pub async fn update_ticket_status(
        &self,
        id: &str,
        status: TicketStatus,
        priority: TicketPriority,
        support_id: &str,
    ) -> Result<Ticket> {
        let result = sqlx::query(
            r#"UPDATE tickets SET status = ?1, priority = ?2, support_id = ?3 WHERE id = ?4"#,
        )
        .bind(status.as_str())
        .bind(priority.as_str())
        .bind(support_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound { resource: "ticket" }.into());
        }

        self.get_ticket(id).await?.ok_or(ApiError::Internal {
            message: "ticket missing after update".to_string(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Messages / Attachments
    // ─────────────────────────────────────────────────────────────────────────────

    pub async fn create_message(
        &self,
        ticket_id: &str,
        author_id: &str,
        body: &str,
    ) -> Result<MessageRow> {
        let id = ulid::Ulid::new().to_string();

        sqlx::query(
            r#"INSERT INTO messages (id, ticket_id, author_id, body, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )
        .bind(&id)
        .bind(ticket_id)
        .bind(author_id)
        .bind(body)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, MessageRow>(
            r#"SELECT m.id, m.ticket_id, m.author_id, u.display_name AS author_name,
                      u.role AS author_role, m.body, m.created_at
               FROM messages m JOIN users u ON m.author_id = u.id
               WHERE m.id = ?1"#,
        )
        .bind(&id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_messages(&self, ticket_id: &str) -> Result<Vec<MessageRow>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            r#"SELECT m.id, m.ticket_id, m.author_id, u.display_name AS author_name,
                      u.role AS author_role, m.body, m.created_at
               FROM messages m JOIN users u ON m.author_id = u.id
               WHERE m.ticket_id = ?1 ORDER BY m.created_at ASC"#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_attachments(&self, ticket_id: &str) -> Result<Vec<AttachmentRow>> {
        let rows = sqlx::query_as::<_, AttachmentRow>(
            r#"SELECT id, ticket_id, file_name, stored_path, created_at
               FROM attachments WHERE ticket_id = ?1 ORDER BY created_at DESC"#,
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PrincipalRow {
    id: String,
    display_name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: String,
}

impl PrincipalRow {
    fn into_principal(self) -> Result<Principal> {
        let role = Role::parse(&self.role).ok_or(ApiError::Internal {
            message: format!("invalid role value: {}", self.role),
        })?;
        let created_at = parse_timestamp(&self.created_at)?;

        Ok(Principal {
            id: self.id,
            display_name: self.display_name,
            email: self.email,
            password_hash: self.password_hash,
            role,
            created_at,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct RefreshSessionRow {
    principal_id: String,
    expires_at: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct TicketRow {
    id: String,
    title: String,
    description: String,
    category: String,
    status: String,
    priority: String,
    requester_id: String,
    requester_name: String,
    support_id: Option<String>,
    created_at: String,
}

impl TicketRow {
    fn into_ticket(self) -> Result<Ticket> {
        let status = TicketStatus::parse(&self.status).ok_or(ApiError::Internal {
            message: format!("invalid ticket status: {}", self.status),
        })?;
        let priority = TicketPriority::parse(&self.priority).ok_or(ApiError::Internal {
            message: format!("invalid ticket priority: {}", self.priority),
        })?;
        let created_at = parse_timestamp(&self.created_at)?;

        Ok(Ticket {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            status,
            priority,
            requester_id: self.requester_id,
            requester_name: self.requester_name,
            support_id: self.support_id,
            created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MessageRow {
    pub id: String,
    pub ticket_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_role: String,
    pub body: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRow {
    pub id: String,
    pub ticket_id: String,
    pub file_name: String,
    pub stored_path: String,
    pub created_at: String,
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ApiError::Internal {
            message: format!("invalid timestamp: {}", value),
        })
}
