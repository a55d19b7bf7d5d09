//! API 핸들러

pub mod auth;
pub mod tickets;

use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({"ok": true}))
}
