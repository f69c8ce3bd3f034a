//! Permission strings and enforcement.
//!
//! A permission is an `<action>:<resource>` string granted in the token's
//! `permissions` claim. Matching is exact: no hierarchy, no wildcards.

use crate::auth::claims::Claims;
use crate::errors::AuthError;

pub const GET_ACTORS: &str = "get:actors";
pub const GET_ACTOR: &str = "get:actor";
pub const POST_ACTORS: &str = "post:actors";
pub const PATCH_ACTORS: &str = "patch:actors";
pub const DELETE_ACTORS: &str = "delete:actors";

pub const GET_MOVIES: &str = "get:movies";
pub const GET_MOVIE: &str = "get:movie";
pub const POST_MOVIES: &str = "post:movies";
pub const PATCH_MOVIES: &str = "patch:movies";
pub const DELETE_MOVIES: &str = "delete:movies";

/// Confirm the claims grant `required`.
///
/// # Errors
///
/// - `permissions_missing` (403) - no `permissions` claim at all
/// - `permission_denied` (403) - `required` is not in the list
pub fn check_permission(required: &str, claims: &Claims) -> Result<(), AuthError> {
    let Some(granted) = claims.permissions.as_deref() else {
        tracing::debug!(target: "casting.auth.permissions", "Token has no permissions claim");
        return Err(AuthError::permissions_missing());
    };

    if !granted.iter().any(|p| p == required) {
        tracing::debug!(
            target: "casting.auth.permissions",
            required = %required,
            "Required permission not granted"
        );
        return Err(AuthError::permission_denied());
    }

    Ok(())
}
