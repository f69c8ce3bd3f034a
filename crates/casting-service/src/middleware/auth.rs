//! Authorization gate for protected routes.
//!
//! Every protected route is wrapped by [`require_permission`] with its own
//! [`PermissionGuard`]. The gate runs extract -> verify -> enforce and, on
//! success, injects the decoded [`Claims`] into request extensions so the
//! handler receives them as its first argument. Any failure short-circuits
//! with the `AuthError` and the handler is never invoked.

use crate::auth::bearer::extract_bearer_token;
use crate::auth::permissions::check_permission;
use crate::auth::{Claims, JwtValidator};
use crate::errors::AuthError;
use crate::observability::metrics::record_auth_decision;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authorization middleware.
#[derive(Clone)]
pub struct AuthState {
    /// JWT validator with JWKS client.
    pub jwt_validator: Arc<JwtValidator>,
}

impl AuthState {
    pub fn new(jwt_validator: Arc<JwtValidator>) -> Self {
        Self { jwt_validator }
    }

    /// Run the full gate for one request.
    ///
    /// # Errors
    ///
    /// Propagates the first `AuthError` raised by extraction, verification
    /// or permission enforcement.
    pub async fn authorize(&self, headers: &HeaderMap, permission: &str) -> Result<Claims, AuthError> {
        let result = self.authorize_inner(headers, permission).await;

        let outcome = match &result {
            Ok(_) => "allowed",
            Err(e) => e.code().as_str(),
        };
        record_auth_decision(outcome, permission);

        result
    }

    async fn authorize_inner(&self, headers: &HeaderMap, permission: &str) -> Result<Claims, AuthError> {
        let token = extract_bearer_token(headers)?;
        let claims = self.jwt_validator.validate(token).await?;
        check_permission(permission, &claims)?;
        Ok(claims)
    }
}

/// Per-route gate configuration: the shared auth state plus the one
/// permission string the route requires.
#[derive(Clone)]
pub struct PermissionGuard {
    auth: AuthState,
    permission: &'static str,
}

impl PermissionGuard {
    pub fn new(auth: AuthState, permission: &'static str) -> Self {
        Self { auth, permission }
    }

    pub fn permission(&self) -> &'static str {
        self.permission
    }
}

/// Authorization middleware.
///
/// # Response
///
/// - 400/401/403 with the `AuthError` body if the gate rejects the request
/// - Continues to next handler with `Claims` in extensions otherwise
#[instrument(skip_all, name = "casting.middleware.auth")]
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let claims = guard
        .auth
        .authorize(req.headers(), guard.permission)
        .await
        .map_err(|e| {
            tracing::debug!(
                target: "casting.middleware.auth",
                permission = guard.permission,
                code = e.code().as_str(),
                status = e.status().as_u16(),
                "Request rejected by authorization gate"
            );
            e
        })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
