//! Builder patterns for test token claims
//!
//! Defaults match the tenant the test harness configures, so a default
//! build passes issuer and audience validation.

use chrono::{Duration, Utc};
use serde_json::json;

/// Issuer domain configured by the test harness.
pub const TEST_DOMAIN: &str = "casting-test.eu.auth0.com";

/// Audience configured by the test harness.
pub const TEST_AUDIENCE: &str = "casting";

/// Issuer configured by the test harness (`https://<domain>/`).
pub const TEST_ISSUER: &str = "https://casting-test.eu.auth0.com/";

/// Every permission the API knows about.
pub const ALL_PERMISSIONS: [&str; 10] = [
    "get:actors",
    "get:actor",
    "post:actors",
    "patch:actors",
    "delete:actors",
    "get:movies",
    "get:movie",
    "post:movies",
    "patch:movies",
    "delete:movies",
];

/// Read-only permissions (a "casting assistant").
pub const READ_ONLY_PERMISSIONS: [&str; 4] = ["get:actors", "get:actor", "get:movies", "get:movie"];

/// Builder for creating test JWT claims
///
/// # Example
/// ```rust,ignore
/// let claims = TestTokenBuilder::new()
///     .with_permissions(&["get:actors"])
///     .expires_in(3600)
///     .build();
/// let token = TestKeypair::primary().sign(&claims);
/// ```
pub struct TestTokenBuilder {
    iss: String,
    aud: serde_json::Value,
    sub: String,
    exp: i64,
    iat: i64,
    permissions: Option<Vec<String>>,
    extra: serde_json::Map<String, serde_json::Value>,
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            iss: TEST_ISSUER.to_string(),
            aud: json!(TEST_AUDIENCE),
            sub: "auth0|test-subject".to_string(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            permissions: Some(Vec::new()),
            extra: serde_json::Map::new(),
        }
    }

    /// Set the subject
    pub fn for_subject(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the issuer
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = issuer.to_string();
        self
    }

    /// Set a single audience
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = json!(audience);
        self
    }

    /// Set an audience array
    pub fn with_audiences(mut self, audiences: &[&str]) -> Self {
        self.aud = json!(audiences);
        self
    }

    /// Set the granted permissions
    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = Some(permissions.iter().map(ToString::to_string).collect());
        self
    }

    /// Omit the `permissions` claim entirely
    pub fn without_permissions(mut self) -> Self {
        self.permissions = None;
        self
    }

    /// Set expiration in seconds from now (negative for an expired token)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set expiration timestamp
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.exp = timestamp;
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Add a claim the service does not interpret
    pub fn with_claim(mut self, name: &str, value: serde_json::Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> serde_json::Value {
        let mut claims = json!({
            "iss": self.iss,
            "sub": self.sub,
            "aud": self.aud,
            "exp": self.exp,
            "iat": self.iat,
        });
        if let Some(map) = claims.as_object_mut() {
            if let Some(permissions) = self.permissions {
                map.insert("permissions".to_string(), json!(permissions));
            }
            map.extend(self.extra);
        }
        claims
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
