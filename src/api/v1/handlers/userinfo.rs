/*
 * Responsibility
 * - /userinfo (method は問わない)
 * - axum の request を TransportRequest に詰め替えて pipeline を実行する
 * - pipeline が送った payload を JSON + no-cache ヘッダで返す
 * - Skipped (false) のときは他に担当 handler がないので 404
 */
use axum::{
    Json,
    body::Bytes,
    extract::{RawQuery, State},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::services::userinfo::{TransportRequest, UserinfoExchange, UserinfoResponse};
use crate::state::AppState;

pub async fn userinfo(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Response, AppError> {
    let mut exchange = UserinfoExchange::new(TransportRequest {
        method,
        headers,
        query,
        body,
    });

    let handled = state.userinfo.handle_userinfo_request(&mut exchange).await?;
    if !handled {
        return Err(AppError::not_found("userinfo handler"));
    }

    Ok(match exchange.into_sent() {
        Some(response) => render(response),
        // A provider handled the request without leaving a payload.
        None => StatusCode::OK.into_response(),
    })
}

fn render(response: UserinfoResponse) -> Response {
    let (status, payload) = response.into_parts();
    (
        status,
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::PRAGMA, "no-cache"),
            (header::EXPIRES, "-1"),
        ],
        Json(payload),
    )
        .into_response()
}
