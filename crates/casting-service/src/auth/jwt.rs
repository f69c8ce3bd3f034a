//! JWT validation for the Casting Service.
//!
//! Validates incoming JWTs using public keys fetched from the issuer's JWKS
//! endpoint.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only RS256 is accepted; HS256, `none` and every other algorithm are
//!   rejected even when the signature would otherwise check out
//! - `exp`, `iss` and `aud` are required; expiry has no leeway and a token
//!   is expired at its `exp` second
//! - Only the RSA key matching the header `kid` is tried

use crate::auth::claims::Claims;
use crate::auth::jwks::{Jwk, JwksClient};
use crate::errors::AuthError;
use common::jwt::{extract_kid, JwtHeaderError};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tracing::instrument;

/// JWT validator using the issuer's JWKS.
pub struct JwtValidator {
    /// JWKS client for fetching public keys.
    jwks_client: Arc<JwksClient>,

    /// Expected `aud` value.
    audience: String,

    /// Expected `iss` value.
    issuer: String,
}

impl JwtValidator {
    /// Create a new JWT validator.
    ///
    /// # Arguments
    ///
    /// * `jwks_client` - Client for fetching public keys
    /// * `audience` - Value the `aud` claim must equal or contain
    /// * `issuer` - Value the `iss` claim must equal
    pub fn new(jwks_client: Arc<JwksClient>, audience: String, issuer: String) -> Self {
        Self {
            jwks_client,
            audience,
            issuer,
        }
    }

    /// Validate a JWT and return the claims.
    ///
    /// # Security Checks
    ///
    /// 1. Size check - reject tokens > 8KB before parsing
    /// 2. Extract kid from header to find the correct key
    /// 3. Fetch public key from JWKS
    /// 4. Verify RS256 signature
    /// 5. Validate exp, aud and iss
    ///
    /// # Errors
    ///
    /// - `malformed_authorization` (401) - header has no `kid`
    /// - `signing_keys_unavailable` (400) - JWKS could not be fetched
    /// - `signing_key_not_found` (400) - no usable key with this `kid`
    /// - `token_expired` (401), `incorrect_claims` (401)
    /// - `unparseable_token` (400) - anything else
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let kid = extract_kid(token).map_err(|e| {
            tracing::debug!(target: "casting.auth.jwt", error = ?e, "Token kid extraction failed");
            match e {
                JwtHeaderError::MissingKid => AuthError::malformed_authorization(),
                JwtHeaderError::TokenTooLarge | JwtHeaderError::MalformedToken => {
                    AuthError::unparseable_token()
                }
            }
        })?;

        let jwk = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| {
                tracing::warn!(target: "casting.auth.jwt", error = %e, "Signing keys unavailable");
                AuthError::signing_keys_unavailable()
            })?
            .ok_or_else(|| {
                tracing::debug!(target: "casting.auth.jwt", kid = %kid, "No signing key for kid");
                AuthError::signing_key_not_found()
            })?;

        let claims = verify_token(token, &jwk, &self.audience, &self.issuer)?;

        tracing::debug!(target: "casting.auth.jwt", "Token validated successfully");
        Ok(claims)
    }
}

/// Verify JWT signature and standard claims, returning the decoded claims.
///
/// Uses RS256 exclusively.
fn verify_token(token: &str, jwk: &Jwk, audience: &str, issuer: &str) -> Result<Claims, AuthError> {
    if !jwk.is_rs256_capable() {
        tracing::warn!(
            target: "casting.auth.jwt",
            kty = %jwk.kty,
            alg = ?jwk.alg,
            "JWK matched by kid is not an RS256 signing key"
        );
        return Err(AuthError::signing_key_not_found());
    }

    let (Some(n), Some(e)) = (jwk.n.as_deref(), jwk.e.as_deref()) else {
        return Err(AuthError::signing_key_not_found());
    };

    let decoding_key = DecodingKey::from_rsa_components(n, e).map_err(|e| {
        tracing::error!(target: "casting.auth.jwt", error = %e, "Invalid RSA key components");
        AuthError::unparseable_token()
    })?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = 0;
    validation.validate_exp = true;
    validation.set_audience(&[audience]);
    validation.set_issuer(&[issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "aud"]);

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(target: "casting.auth.jwt", error = %e, "Token verification failed");
        map_decode_error(e.kind())
    })?;

    // Expired at the exp second, not one after it
    let now = chrono::Utc::now().timestamp();
    if token_data.claims.exp <= now {
        tracing::debug!(target: "casting.auth.jwt", "Token expired");
        return Err(AuthError::token_expired());
    }

    Ok(token_data.claims)
}

fn map_decode_error(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::ExpiredSignature => AuthError::token_expired(),
        ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer => AuthError::incorrect_claims(),
        ErrorKind::MissingRequiredClaim(claim) if claim == "aud" || claim == "iss" => {
            AuthError::incorrect_claims()
        }
        _ => AuthError::unparseable_token(),
    }
}
