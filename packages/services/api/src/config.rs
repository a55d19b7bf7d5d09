//! API 서버 설정

use std::env;

use tkt_core::Error;

/// API 서버 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 포트
    pub port: u16,

    /// SQLite DB URL
    pub db_url: String,

    /// Access Token 서명 비밀키 (필수, 32바이트 재료)
    pub token_secret: String,

    /// Access Token TTL (초)
    pub access_ttl_seconds: i64,

    /// Refresh Token TTL (초)
    pub refresh_ttl_seconds: i64,

    /// Refresh 쿠키에 Secure 속성 부여 (로컬 개발에서는 끔)
    pub cookie_secure: bool,

    /// 로그인 rate limit: 윈도우당 최대 시도
    pub login_rate_max: u32,

    /// 로그인 rate limit: 윈도우 길이 (초)
    pub login_rate_window_seconds: u64,

    /// 초기 Support 계정 이메일 (옵션)
    pub bootstrap_email: Option<String>,

    /// 초기 Support 계정 비밀번호 (옵션)
    pub bootstrap_password: Option<String>,
}

impl Config {
    /// 환경변수에서 설정 로드
    ///
    /// `TKT_TOKEN_SECRET`이 없으면 기동 실패입니다. 키 재료 형식 검증은
    /// `CredentialIssuer::new`에서 이어집니다.
    pub fn from_env() -> anyhow::Result<Self> {
        let token_secret = env::var("TKT_TOKEN_SECRET").map_err(|_| Error::Configuration {
            message: "TKT_TOKEN_SECRET must be set".to_string(),
        })?;

        Ok(Self {
            port: env::var("TKT_API_PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,

            db_url: env::var("TKT_API_DB_URL")
                .unwrap_or_else(|_| "sqlite://data/ticketkit.db".to_string()),

            token_secret,

            access_ttl_seconds: env::var("TKT_ACCESS_TTL_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .unwrap_or(900),

            refresh_ttl_seconds: env::var("TKT_REFRESH_TTL_SECS")
                .unwrap_or_else(|_| "2592000".to_string())
                .parse()
                .unwrap_or(2_592_000),

            cookie_secure: env::var("TKT_COOKIE_SECURE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),

            login_rate_max: env::var("TKT_LOGIN_RATE_MAX")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),

            login_rate_window_seconds: env::var("TKT_LOGIN_RATE_WINDOW_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .unwrap_or(900),

            bootstrap_email: env::var("TKT_BOOTSTRAP_EMAIL").ok(),
            bootstrap_password: env::var("TKT_BOOTSTRAP_PASSWORD").ok(),
        })
    }
}
