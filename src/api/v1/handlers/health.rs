/*
 * Responsibility
 * - GET /health (疎通用)
 * - 設定済みの issuer も返す (どの発行者の token を受け付けるかの確認用)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "issuer": state.userinfo.issuer() })),
    )
}
