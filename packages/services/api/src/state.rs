//! API 앱 상태

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use tkt_core::auth::CredentialIssuer;

use crate::config::Config;
use crate::db::Db;

/// 앱 상태
///
/// 모든 핸들러에서 공유하는 상태입니다. 변경 가능한 공유 상태는 로그인
/// rate limit 윈도우 맵 하나뿐입니다.
pub struct AppState {
    /// 설정
    pub config: Config,

    /// 저장소
    pub db: Db,

    /// Access Token 발급기
    pub issuer: CredentialIssuer,

    /// 로그인 rate limit (IP → 윈도우 상태)
    pub login_limits: RwLock<HashMap<String, RateLimitState>>,
}

/// Rate limit 윈도우 상태
pub struct RateLimitState {
    pub window_start: Instant,
    pub count: u32,
}

impl AppState {
    /// 새 상태 생성
    ///
    /// 서명 비밀키가 유효하지 않으면 기동 실패입니다.
    pub fn new(config: Config, db: Db) -> tkt_core::Result<Self> {
        let issuer = CredentialIssuer::new(&config.token_secret, config.access_ttl_seconds)?;

        Ok(Self {
            config,
            db,
            issuer,
            login_limits: RwLock::new(HashMap::new()),
        })
    }

    /// 로그인 시도 rate limit 체크 (fixed window)
    pub fn check_login_rate(&self, ip: Option<&str>) -> bool {
        let key = ip.unwrap_or("unknown").to_string();
        let now = Instant::now();
        let window = Duration::from_secs(self.config.login_rate_window_seconds);

        let mut limits = self.login_limits.write().unwrap();
        let entry = limits.entry(key).or_insert(RateLimitState {
            window_start: now,
            count: 0,
        });

        if now.duration_since(entry.window_start) > window {
            entry.window_start = now;
            entry.count = 0;
        }

        if entry.count >= self.config.login_rate_max {
            return false;
        }

        entry.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            port: 0,
            db_url: "sqlite::memory:".to_string(),
            token_secret: "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef"
                .to_string(),
            access_ttl_seconds: 900,
            refresh_ttl_seconds: 2_592_000,
            cookie_secure: false,
            login_rate_max: 3,
            login_rate_window_seconds: 900,
            bootstrap_email: None,
            bootstrap_password: None,
        }
    }

    #[tokio::test]
    async fn test_login_rate_window() {
        let db = Db::memory().await.unwrap();
        let state = AppState::new(test_config(), db).unwrap();

        assert!(state.check_login_rate(Some("10.0.0.1")));
        assert!(state.check_login_rate(Some("10.0.0.1")));
        assert!(state.check_login_rate(Some("10.0.0.1")));
        assert!(!state.check_login_rate(Some("10.0.0.1")));

        // 다른 IP는 독립 윈도우
        assert!(state.check_login_rate(Some("10.0.0.2")));
    }

    #[tokio::test]
    async fn test_bad_secret_fails_startup() {
        let db = Db::memory().await.unwrap();
        let mut config = test_config();
        config.token_secret = "way-too-short".to_string();

        assert!(AppState::new(config, db).is_err());
    }
}
