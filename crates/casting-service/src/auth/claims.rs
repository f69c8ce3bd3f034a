//! JWT claims structure.
//!
//! Contains the claims extracted from validated JWTs. The `sub` field is
//! redacted in Debug output to prevent exposure in logs. Claims the service
//! does not interpret are carried in `extra` so the decoded mapping is
//! returned unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The `aud` claim: a single audience string or an array of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    /// Whether `audience` equals (or is a member of) this claim.
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == audience,
            Audience::Multiple(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}

/// JWT Claims structure for validated tokens.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer (`https://<domain>/`).
    ///
    /// Optional here so a token without it reaches claim validation and is
    /// rejected as `MissingRequiredClaim` rather than as a parse failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Subject (user or client id) - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Audience. Optional for the same reason as `iss`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Granted permission strings (`<action>:<resource>`).
    ///
    /// `None` means the claim is absent, which is distinct from an empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,

    /// Remaining claims (`azp`, `scope`, `gty`, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Custom Debug implementation that redacts the `sub` field.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("iss", &self.iss)
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("aud", &self.aud)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("permissions", &self.permissions)
            .field("extra_claims", &self.extra.len())
            .finish()
    }
}

impl Claims {
    /// Check if the token grants a permission (exact match).
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_deref()
            .is_some_and(|perms| perms.iter().any(|p| p == permission))
    }
}
