//! API 미들웨어
//!
//! 요청 ID 부여와 인증 게이트를 정의합니다.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use tkt_core::auth::{bearer_token, AuthUser};

use crate::error::ApiError;
use crate::state::AppState;

tokio::task_local! {
    static REQUEST_ID: String;
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

pub async fn request_id(req: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    let mut resp = REQUEST_ID
        .scope(id.clone(), async move { next.run(req).await })
        .await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        resp.headers_mut().insert("x-request-id", value);
    }
    resp
}

/// 인증 게이트
///
/// Bearer 토큰을 검증하고 `AuthUser`를 요청 extension에 넣습니다.
/// 저장소 접근 없이 서명/만료 검사만 수행합니다. 실패는 전부 401입니다.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    match authenticate(&state, &req) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

fn authenticate(state: &AppState, req: &Request) -> tkt_core::Result<AuthUser> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = bearer_token(header_value)?;
    let claims = state.issuer.verify(token)?;

    Ok(AuthUser::from(claims))
}
