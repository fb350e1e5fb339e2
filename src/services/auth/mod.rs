pub mod access_jwt;
pub mod factory;

pub use access_jwt::{AccessJwtError, AccessJwtFormat};
pub use factory::build_userinfo_endpoint;
