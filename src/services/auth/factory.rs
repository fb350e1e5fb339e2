/// Factory: build the access-token format and the userinfo endpoint from `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{AccessJwtError, AccessJwtFormat};
use crate::services::userinfo::{DefaultUserinfoProvider, UserinfoEndpoint};

pub fn build_access_token_format(config: &Config) -> Result<Arc<AccessJwtFormat>, AccessJwtError> {
    let format = AccessJwtFormat::new(&config.access_jwt_public_key_pem, &config.auth_issuer)?;

    Ok(Arc::new(format))
}

pub fn build_userinfo_endpoint(config: &Config) -> Result<Arc<UserinfoEndpoint>, AccessJwtError> {
    let tokens = build_access_token_format(config)?;
    let endpoint = UserinfoEndpoint::new(
        config.auth_issuer.clone(),
        Arc::new(DefaultUserinfoProvider),
        tokens,
    );

    Ok(Arc::new(endpoint))
}
