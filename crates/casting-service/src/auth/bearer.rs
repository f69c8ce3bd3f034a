//! Bearer token extraction from the `Authorization` header.

use crate::errors::AuthError;
use axum::http::{header, HeaderMap};

/// Extract the bearer token from request headers.
///
/// The header value is split on whitespace into a scheme and a token. The
/// scheme is matched case-insensitively against `Bearer`.
///
/// # Errors
///
/// - `missing_header` - header absent, empty, or only whitespace
/// - `bearer_scheme_required` - scheme is not `Bearer` (or header is not visible ASCII)
/// - `token_not_found` - `Bearer` with no token
/// - `too_many_header_parts` - more than a scheme and a token
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let Some(raw) = headers.get(header::AUTHORIZATION) else {
        tracing::debug!(target: "casting.auth.bearer", "Missing Authorization header");
        return Err(AuthError::missing_header());
    };

    if raw.as_bytes().iter().all(u8::is_ascii_whitespace) {
        tracing::debug!(target: "casting.auth.bearer", "Empty Authorization header");
        return Err(AuthError::missing_header());
    }

    let value = raw.to_str().map_err(|_| {
        tracing::debug!(target: "casting.auth.bearer", "Authorization header is not valid ASCII");
        AuthError::bearer_scheme_required()
    })?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or_default();

    if !scheme.eq_ignore_ascii_case("bearer") {
        tracing::debug!(target: "casting.auth.bearer", "Authorization scheme is not Bearer");
        return Err(AuthError::bearer_scheme_required());
    }

    let Some(token) = parts.next() else {
        tracing::debug!(target: "casting.auth.bearer", "Bearer scheme without token");
        return Err(AuthError::token_not_found());
    };

    if parts.next().is_some() {
        tracing::debug!(target: "casting.auth.bearer", "Authorization header has extra parts");
        return Err(AuthError::too_many_header_parts());
    }

    Ok(token)
}
