//! Access Token 발급/검증
//!
//! 프로세스 전역 서명 비밀키로 PASETO v4.local 토큰을 발급하고 검증합니다.
//! 검증은 순수 함수이며 저장소를 조회하지 않습니다.

use base64::{engine::general_purpose, Engine as _};
use rusty_paseto::core::{Key, Local, Paseto, PasetoNonce, PasetoSymmetricKey, Payload, V4};

use crate::error::{Error, Result};
use crate::principal::Principal;

use super::claims::AccessClaims;

/// PASETO v4.local 토큰 접두어
const TOKEN_PREFIX: &str = "v4.local.";

/// Access Token 발급기/검증기
///
/// 비밀키는 프로세스 시작 시 설정에서 한 번 주입됩니다. 전역 조회 없이
/// 이 값을 참조로 전달해 사용합니다.
pub struct CredentialIssuer {
    key: PasetoSymmetricKey<V4, Local>,
    access_ttl_seconds: i64,
}

impl CredentialIssuer {
    /// 새 발급기 생성
    ///
    /// `secret`은 32바이트 키 재료여야 합니다 (hex 64자리, base64,
    /// 또는 raw 32바이트 문자열). 그 외에는 `Configuration` 에러입니다.
    pub fn new(secret: &str, access_ttl_seconds: i64) -> Result<Self> {
        let key_bytes = parse_key_material(secret).ok_or_else(|| Error::Configuration {
            message: "token signing secret must be 32 bytes (hex, base64, or raw)".to_string(),
        })?;

        Ok(Self {
            key: PasetoSymmetricKey::<V4, Local>::from(Key::from(key_bytes)),
            access_ttl_seconds,
        })
    }

    /// 계정에 대한 Access Token 발급
    pub fn issue(&self, principal: &Principal) -> Result<String> {
        let claims = AccessClaims::from_principal(principal, self.access_ttl_seconds);
        self.issue_claims(&claims)
    }

    /// 주어진 claims로 토큰 발급
    pub fn issue_claims(&self, claims: &AccessClaims) -> Result<String> {
        let payload = serde_json::to_string(claims)?;

        let encryption_failed = || Error::Configuration {
            message: "access token encryption failed".to_string(),
        };

        let nonce = Key::<32>::try_new_random().map_err(|_| encryption_failed())?;
        let nonce = PasetoNonce::<V4, Local>::from(&nonce);

        Paseto::<V4, Local>::builder()
            .set_payload(Payload::from(payload.as_str()))
            .try_encrypt(&self.key, &nonce)
            .map_err(|_| encryption_failed())
    }

    /// Access Token 검증 및 Claims 추출
    ///
    /// # 실패
    /// - 토큰 형태가 아님 → `MalformedToken`
    /// - 복호화/인증 실패 (변조 포함) → `InvalidSignature`
    /// - `exp` 경과 → `TokenExpired`
    pub fn verify(&self, token: &str) -> Result<AccessClaims> {
        let token = token.trim();

        if !token.starts_with(TOKEN_PREFIX) {
            return Err(Error::MalformedToken);
        }

        let payload = Paseto::<V4, Local>::try_decrypt(token, &self.key, None, None)
            .map_err(|_| Error::InvalidSignature)?;

        let claims: AccessClaims =
            serde_json::from_str(&payload).map_err(|_| Error::MalformedToken)?;

        if claims.is_expired() {
            return Err(Error::TokenExpired);
        }

        Ok(claims)
    }
}

/// 키 재료 파싱 (hex / base64 / raw 32바이트)
fn parse_key_material(raw: &str) -> Option<[u8; 32]> {
    let trimmed = raw.trim();

    if trimmed.len() == 64 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        let bytes = decode_hex(trimmed)?;
        return bytes.as_slice().try_into().ok();
    }

    if let Ok(bytes) = general_purpose::URL_SAFE_NO_PAD.decode(trimmed) {
        if bytes.len() == 32 {
            return bytes.as_slice().try_into().ok();
        }
    }

    if let Ok(bytes) = general_purpose::STANDARD.decode(trimmed) {
        if bytes.len() == 32 {
            return bytes.as_slice().try_into().ok();
        }
    }

    let raw_bytes = trimmed.as_bytes();
    if raw_bytes.len() == 32 {
        return raw_bytes.try_into().ok();
    }

    None
}

fn decode_hex(input: &str) -> Option<Vec<u8>> {
    if input.len() % 2 != 0 {
        return None;
    }

    let mut bytes = Vec::with_capacity(input.len() / 2);
    let mut chars = input.chars();
    while let (Some(h), Some(l)) = (chars.next(), chars.next()) {
        let hi = h.to_digit(16)?;
        let lo = l.to_digit(16)?;
        bytes.push(((hi << 4) | lo) as u8);
    }
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::Role;
    use chrono::{Duration, Utc};

    const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

    fn issuer() -> CredentialIssuer {
        CredentialIssuer::new(TEST_SECRET, 900).unwrap()
    }

    fn sample_principal() -> Principal {
        Principal {
            id: "01ARZ3NDEKTSV4RRFFQ69G5FAV".to_string(),
            display_name: "Carla Mendes".to_string(),
            email: "carla@example.com".to_string(),
            password_hash: "x".to_string(),
            role: Role::Requester,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let issuer = issuer();
        let token = issuer.issue(&sample_principal()).unwrap();

        assert!(token.starts_with("v4.local."));

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "01ARZ3NDEKTSV4RRFFQ69G5FAV");
        assert_eq!(claims.role, Role::Requester);
        assert_eq!((claims.exp - claims.iat).num_seconds(), 900);
    }

    #[test]
    fn test_missing_or_short_secret_is_rejected() {
        assert!(matches!(
            CredentialIssuer::new("", 900),
            Err(Error::Configuration { .. })
        ));
        assert!(matches!(
            CredentialIssuer::new("too-short", 900),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_tampered_token_is_invalid_signature() {
        let issuer = issuer();
        let token = issuer.issue(&sample_principal()).unwrap();

        // 페이로드 영역의 글자를 하나씩 바꿔 본다. 어떤 변조든
        // InvalidSignature여야 하며 조용히 통과해서는 안 된다.
        let bytes = token.as_bytes();
        for pos in [TOKEN_PREFIX.len(), token.len() / 2, token.len() - 1] {
            let mut flipped = bytes.to_vec();
            flipped[pos] = if flipped[pos] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(flipped).unwrap();
            if tampered == token {
                continue;
            }

            assert!(matches!(
                issuer.verify(&tampered),
                Err(Error::InvalidSignature)
            ));
        }
    }

    #[test]
    fn test_wrong_key_is_invalid_signature() {
        let token = issuer().issue(&sample_principal()).unwrap();
        let other = CredentialIssuer::new(
            "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
            900,
        )
        .unwrap();

        assert!(matches!(other.verify(&token), Err(Error::InvalidSignature)));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let issuer = issuer();
        assert!(matches!(
            issuer.verify("not-a-token"),
            Err(Error::MalformedToken)
        ));
        assert!(matches!(
            issuer.verify("v2.local.abcdef"),
            Err(Error::MalformedToken)
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let issuer = issuer();
        let principal = sample_principal();

        let now = Utc::now();
        let claims = AccessClaims {
            sub: principal.id.clone(),
            display_name: principal.display_name.clone(),
            email: principal.email.clone(),
            role: principal.role,
            iat: now - Duration::seconds(1000),
            exp: now - Duration::seconds(100),
        };
        let token = issuer.issue_claims(&claims).unwrap();

        assert!(matches!(issuer.verify(&token), Err(Error::TokenExpired)));
    }

    #[test]
    fn test_key_material_formats() {
        assert!(parse_key_material(TEST_SECRET).is_some());
        assert!(parse_key_material("abcdefghijklmnopqrstuvwxyz012345").is_some());
        assert!(parse_key_material(&general_purpose::STANDARD.encode([7u8; 32])).is_some());
        assert!(parse_key_material("short").is_none());
    }
}
