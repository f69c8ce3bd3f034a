//! JWT header utilities shared across Casting Service crates.
//!
//! This module provides the pre-verification steps every bearer token goes
//! through before any key lookup or signature check:
//! - Size limit for DoS prevention
//! - Key ID extraction from the unverified JWT header
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Nothing read here is trusted: the `kid` is only a lookup hint into the
//!   issuer's key set, and the token MUST still be verified afterwards
//! - Error messages are generic to prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{extract_kid, JwtHeaderError};
//!
//! match extract_kid(token) {
//!     Ok(kid) => { /* look up kid in the JWKS */ }
//!     Err(JwtHeaderError::MissingKid) => { /* 401 */ }
//!     Err(_) => { /* 400 */ }
//! }
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this are rejected BEFORE any base64 decoding or
/// cryptographic operation. Identity-provider access tokens carrying a
/// permissions array are typically well under 2KB.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while reading the unverified JWT header.
///
/// Display messages are intentionally generic. Detailed information is
/// logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtHeaderError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token header is well-formed but carries no usable `kid`.
    #[error("The access token is invalid or expired")]
    MissingKid,
}

// =============================================================================
// Functions
// =============================================================================

/// Extract the `kid` (key ID) from a JWT header without verifying the signature.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds [`MAX_JWT_SIZE_BYTES`]
/// - `MalformedToken` - Wrong number of segments, bad base64, or header is not a JSON object
/// - `MissingKid` - Header has no `kid`, or `kid` is not a non-empty string
pub fn extract_kid(token: &str) -> Result<String, JwtHeaderError> {
    let header = decode_header_json(token)?;

    // Extract kid as string, rejecting empty values
    header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| {
            tracing::debug!(target: "common.jwt", "Token rejected: header has no kid");
            JwtHeaderError::MissingKid
        })
}

/// Decode the first JWT segment into a JSON object.
fn decode_header_json(
    token: &str,
) -> Result<serde_json::Map<String, serde_json::Value>, JwtHeaderError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtHeaderError::TokenTooLarge);
    }

    // JWT format: header.payload.signature
    let mut parts = token.split('.');
    let (Some(header_part), Some(_), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
        return Err(JwtHeaderError::MalformedToken);
    };

    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtHeaderError::MalformedToken
    })?;

    match serde_json::from_slice::<serde_json::Value>(&header_bytes) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => {
            tracing::debug!(target: "common.jwt", "JWT header is not a JSON object");
            Err(JwtHeaderError::MalformedToken)
        }
        Err(e) => {
            tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
            Err(JwtHeaderError::MalformedToken)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
