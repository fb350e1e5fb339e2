/*
 * Responsibility
 * - userinfo: OIDC UserInfo pipeline (HTTP 非依存)
 * - auth: access token (JWT) の検証と pipeline の組み立て
 */
pub mod auth;
pub mod userinfo;
