/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - userinfo: UserinfoEndpoint (issuer / provider / token format を保持)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::userinfo::UserinfoEndpoint;

#[derive(Clone, Debug)]
pub struct AppState {
    pub userinfo: Arc<UserinfoEndpoint>,
}

impl AppState {
    pub fn new(userinfo: Arc<UserinfoEndpoint>) -> Self {
        Self { userinfo }
    }
}
