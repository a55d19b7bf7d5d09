//! ticketkit API 서버
//!
//! 학교 IT 지원 티켓 시스템의 백엔드입니다. 인증(로그인/리프레시/로그아웃),
//! 계정 생성, 티켓/메시지/첨부 접근을 제공합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod state;

use config::Config;
use db::Db;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tkt_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 설정 로드 (서명 비밀키 없으면 여기서 종료)
    let config = Config::from_env()?;

    let db = Db::new(&config.db_url).await?;
    bootstrap_support(&db, &config).await?;

    let state = Arc::new(AppState::new(config, db)?);
    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    tracing::info!("ticketkit API listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 설정된 경우 초기 Support 계정 보장
async fn bootstrap_support(db: &Db, config: &Config) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&config.bootstrap_email, &config.bootstrap_password)
    else {
        return Ok(());
    };

    let password_hash = tkt_core::auth::hash_password(password)?;
    db.ensure_support_account("Support", email, &password_hash)
        .await?;

    tracing::info!("bootstrap support account ensured for {}", email);
    Ok(())
}

/// 라우터 생성
fn create_router(state: Arc<AppState>) -> Router {
    // 인증 게이트 뒤의 라우트
    let protected = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/profile", get(handlers::auth::profile))
        .route(
            "/api/tickets",
            post(handlers::tickets::create_ticket).get(handlers::tickets::list_tickets),
        )
        .route("/api/tickets/{id}", get(handlers::tickets::get_ticket))
        .route(
            "/api/tickets/{id}/status",
            put(handlers::tickets::update_ticket_status),
        )
        .route(
            "/api/tickets/{id}/messages",
            get(handlers::tickets::list_messages).post(handlers::tickets::create_message),
        )
        .route(
            "/api/tickets/{id}/attachments",
            get(handlers::tickets::list_attachments),
        )
        .layer(from_fn_with_state(state.clone(), middleware::auth));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(middleware::request_id))
        .with_state(state)
}
