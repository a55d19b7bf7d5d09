//! 인증 관련 타입 및 로직
//!
//! # 토큰 종류
//!
//! - **Access Token**: PASETO v4.local, 15분 수명, 서버 저장 없음
//! - **Refresh Token**: Opaque 256-bit 랜덤 값, SHA-256 다이제스트로만 저장,
//!   30일 수명, `refreshToken` 쿠키로 전달
//!
//! Access Token은 폐기(revocation)를 지원하지 않습니다. 로그아웃 후에도
//! 탈취된 Access Token은 만료까지(최대 15분) 유효합니다. Refresh Token만
//! 서버에서 폐기됩니다.

mod claims;
mod issuer;
mod password;
mod refresh;

use crate::error::{Error, Result};

pub use claims::{AccessClaims, AuthUser};
pub use issuer::CredentialIssuer;
pub use password::{hash_password, verify_password};
pub use refresh::{
    clear_refresh_cookie, cookie_value, generate_refresh_token, refresh_cookie,
    refresh_token_digest, REFRESH_COOKIE,
};

/// `Authorization` 헤더에서 Bearer 토큰 추출
///
/// # 실패
/// - 헤더 없음 → `MissingCredentials`
/// - 두 부분이 아니거나 스킴이 Bearer가 아님 → `MalformedHeader`
pub fn bearer_token(header: Option<&str>) -> Result<&str> {
    let value = header.ok_or(Error::MissingCredentials)?;

    let parts: Vec<&str> = value.split(' ').collect();
    if parts.len() != 2 {
        return Err(Error::MalformedHeader);
    }

    let (scheme, token) = (parts[0], parts[1]);
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(Error::MalformedHeader);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(Some("bearer abc")).unwrap(), "abc");

        assert!(matches!(bearer_token(None), Err(Error::MissingCredentials)));
        assert!(matches!(
            bearer_token(Some("abc")),
            Err(Error::MalformedHeader)
        ));
        assert!(matches!(
            bearer_token(Some("Basic abc")),
            Err(Error::MalformedHeader)
        ));
        assert!(matches!(
            bearer_token(Some("Bearer a b")),
            Err(Error::MalformedHeader)
        ));
        assert!(matches!(
            bearer_token(Some("Bearer ")),
            Err(Error::MalformedHeader)
        ));
    }
}
