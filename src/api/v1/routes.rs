/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /userinfo は any() で受ける (GET/POST 以外も pipeline に渡して invalid_request を返すため)
 */
use axum::{
    Router,
    routing::{any, get},
};

use crate::state::AppState;

use crate::api::v1::handlers::{health::health, userinfo::userinfo};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/userinfo", any(userinfo))
}
