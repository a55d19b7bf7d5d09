//! Refresh Token 생성/다이제스트 및 쿠키 유틸리티
//!
//! Refresh Token은 구조 없는 opaque 값입니다. 유효성은 서명이 아니라
//! 저장소 조회로만 판정되며, 저장소에는 SHA-256 다이제스트만 남습니다.

use base64::{engine::general_purpose, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Refresh Token 쿠키 이름 (고정)
pub const REFRESH_COOKIE: &str = "refreshToken";

/// 새 opaque refresh token 생성 (256-bit 랜덤, base64url)
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Refresh token의 저장용 다이제스트 (SHA-256, base64url)
pub fn refresh_token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

/// Refresh 쿠키 Set-Cookie 값 생성
///
/// HttpOnly + SameSite=Strict 고정, `secure`는 배포 환경에서만 켭니다.
pub fn refresh_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict; Max-Age={}",
        REFRESH_COOKIE, token, max_age_seconds
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Refresh 쿠키 삭제용 Set-Cookie 값 생성
pub fn clear_refresh_cookie(secure: bool) -> String {
    refresh_cookie("", 0, secure)
}

/// `Cookie` 헤더에서 특정 쿠키 값 추출
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key == name && !value.is_empty() {
            Some(value)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique_and_opaque() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();

        assert_ne!(a, b);
        // 32바이트 → base64url 43자
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn test_digest_is_deterministic_and_one_way() {
        let token = generate_refresh_token();

        assert_eq!(refresh_token_digest(&token), refresh_token_digest(&token));
        assert_ne!(refresh_token_digest(&token), token);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = refresh_cookie("abc", 2_592_000, false);
        assert!(cookie.starts_with("refreshToken=abc; "));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=2592000"));
        assert!(!cookie.contains("Secure"));

        let secure = refresh_cookie("abc", 60, true);
        assert!(secure.ends_with("; Secure"));

        let cleared = clear_refresh_cookie(false);
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn test_cookie_value_parsing() {
        let header = "theme=dark; refreshToken=tok_123; other=1";
        assert_eq!(cookie_value(header, REFRESH_COOKIE), Some("tok_123"));
        assert_eq!(cookie_value(header, "theme"), Some("dark"));
        assert_eq!(cookie_value(header, "missing"), None);
        assert_eq!(cookie_value("refreshToken=", REFRESH_COOKIE), None);
    }
}
