/*
 * Responsibility
 * - middleware の公開インターフェース
 * - cors / http (request-id, trace, limit, timeout) / security_headers
 * - bearer token の検証は middleware ではなく userinfo pipeline 側の責務
 */
pub mod cors;
pub mod http;
pub mod security_headers;
