//! Bearer token authorization.
//!
//! - `bearer` - pull the token out of the `Authorization` header
//! - `jwks` - fetch and cache the issuer's signing keys
//! - `jwt` - verify signature and standard claims
//! - `permissions` - check the `permissions` claim

pub mod bearer;
pub mod claims;
pub mod jwks;
pub mod jwt;
pub mod permissions;

pub use claims::Claims;
pub use jwks::JwksClient;
pub use jwt::JwtValidator;
