/*
 * Responsibility
 * - crate の公開面
 *   - services::userinfo: HTTP 非依存の UserInfo pipeline (provider hook / token format の差し込み口)
 *   - api / app / middleware: axum の server 側
 */
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
