//! 인증 핸들러
//!
//! 로그인/리프레시/로그아웃/계정 생성/프로필. CredentialIssuer와
//! refresh 세션 저장소는 이 경계에서만 호출됩니다.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use tkt_core::auth::{self, AuthUser};
use tkt_core::permissions;
use tkt_core::principal::{Role, UserProfile};
use tkt_core::Error;

use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 로그인/리프레시 공통 응답
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: String,
}

/// 로그인
///
/// 성공 시 Access Token을 본문으로, Refresh Token을 쿠키로 내립니다.
/// 같은 계정의 기존 refresh 세션은 저장소 트랜잭션 안에서 대체됩니다.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<([(HeaderName, String); 1], Json<TokenResponse>)> {
    let client_ip = client_ip(&headers);
    if !state.check_login_rate(client_ip.as_deref()) {
        return Err(ApiError::TooManyRequests {
            message: "too many login attempts, try again later".to_string(),
        });
    }

    if req.email.is_empty() || req.password.is_empty() {
        return Err(Error::Validation {
            message: "email and password are required".to_string(),
        }
        .into());
    }

    let principal = state
        .db
        .get_principal_by_email(&req.email)
        .await?
        .filter(|p| auth::verify_password(&req.password, &p.password_hash))
        .ok_or_else(invalid_credentials)?;

    let access_token = state.issuer.issue(&principal)?;
    let refresh_token = state
        .db
        .issue_refresh_session(&principal.id, state.config.refresh_ttl_seconds)
        .await?;

    let cookie = auth::refresh_cookie(
        &refresh_token,
        state.config.refresh_ttl_seconds,
        state.config.cookie_secure,
    );

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(TokenResponse {
            access_token,
            user: principal.profile(),
        }),
    ))
}

/// Access Token 재발급
///
/// Refresh 쿠키만 받습니다. 쿠키는 회전시키지 않으며 응답에 Set-Cookie가
/// 없습니다. 세션이 없거나 만료됐으면 구분 없이 401입니다.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>> {
    let token = refresh_cookie_value(&headers).ok_or_else(invalid_refresh)?;

    let principal_id = match state.db.validate_refresh_session(token).await {
        Ok(id) => id,
        Err(ApiError::Core(Error::NotFound { .. })) | Err(ApiError::Core(Error::TokenExpired)) => {
            return Err(invalid_refresh());
        }
        Err(e) => return Err(e),
    };

    let principal = state
        .db
        .get_principal_by_id(&principal_id)
        .await?
        .ok_or(Error::NotFound { resource: "user" })?;

    let access_token = state.issuer.issue(&principal)?;

    Ok(Json(TokenResponse {
        access_token,
        user: principal.profile(),
    }))
}

/// 로그아웃
///
/// 쿠키의 refresh 세션을 폐기하고 쿠키를 지웁니다. 세션이 이미
/// 없거나 만료됐어도 성공입니다.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<([(HeaderName, String); 1], Json<Value>)> {
    if let Some(token) = refresh_cookie_value(&headers) {
        state.db.revoke_refresh_session(token).await?;
    }

    let cookie = auth::clear_refresh_cookie(state.config.cookie_secure);
    Ok(([(header::SET_COOKIE, cookie)], Json(json!({"ok": true}))))
}

/// 계정 생성 (Support 전용)
pub async fn register(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    permissions::require_role(&user, Role::Support)?;

    if req.display_name.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(Error::Validation {
            message: "displayName, email and password are required".to_string(),
        }
        .into());
    }
    let role = Role::parse(&req.role).ok_or(Error::Validation {
        message: "role must be requester or support".to_string(),
    })?;

    if state.db.get_principal_by_email(&req.email).await?.is_some() {
        return Err(Error::Validation {
            message: "email already registered".to_string(),
        }
        .into());
    }

    let password_hash = auth::hash_password(&req.password)?;
    let principal = state
        .db
        .create_principal(&req.display_name, &req.email, &password_hash, role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { id: principal.id }),
    ))
}

/// 내 프로필 조회
pub async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let principal = state
        .db
        .get_principal_by_id(&user.id)
        .await?
        .ok_or(Error::NotFound { resource: "user" })?;

    Ok(Json(principal.profile()))
}

/// 이메일 존재 여부와 비밀번호 불일치를 구분하지 않는 단일 401
fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized {
        message: "invalid email or password".to_string(),
    }
}

/// 세션 없음과 만료를 구분하지 않는 단일 401
fn invalid_refresh() -> ApiError {
    ApiError::Unauthorized {
        message: "invalid or expired refresh token".to_string(),
    }
}

fn refresh_cookie_value(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| auth::cookie_value(h, auth::REFRESH_COOKIE))
}

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}
