//! JWKS client for fetching and caching the issuer's public keys.
//!
//! The JWKS (JSON Web Key Set) client fetches public keys from the issuer's
//! `/.well-known/jwks.json` endpoint and caches them with a configurable TTL.
//!
//! # Security
//!
//! - Every fetch is bounded by a timeout; a slow issuer fails closed
//! - An expired cache is never served. If the refresh fails the caller gets
//!   an error, not the old keys
//! - A key id missing from a fresh cache triggers at most one refetch per
//!   [`MIN_REFETCH_INTERVAL`] so rotated keys are picked up without letting
//!   bogus `kid` values hammer the issuer
//! - After a failed fetch, callers finding an empty or expired cache fail
//!   fast for [`FAILED_FETCH_BACKOFF`] instead of queueing behind another
//!   fetch that is likely to time out
//! - Keys without a `kid` cannot be selected and are skipped, not rejected

use crate::observability::metrics::record_jwks_fetch;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Default cache TTL in seconds (5 minutes).
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Default fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECONDS: u64 = 5;

/// Minimum time between refetches triggered by an unknown key id.
pub const MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(10);

/// How long a failed fetch is reused as the answer for a stale cache.
pub const FAILED_FETCH_BACKOFF: Duration = Duration::from_secs(2);

/// JSON Web Key from the JWKS endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" for RS256 keys).
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    ///
    /// Optional in a key set; keys without one are never selected.
    #[serde(default)]
    pub kid: Option<String>,

    /// Algorithm (should be "RS256" when present).
    #[serde(default)]
    pub alg: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// RSA modulus (base64url encoded).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url encoded).
    #[serde(default)]
    pub e: Option<String>,
}

impl Jwk {
    /// Whether this key can verify an RS256 signature.
    pub fn is_rs256_capable(&self) -> bool {
        self.kty == "RSA"
            && self.alg.as_deref().map_or(true, |alg| alg == "RS256")
            && self.key_use.as_deref().map_or(true, |u| u == "sig")
            && self.n.is_some()
            && self.e.is_some()
    }
}

/// JWKS response from the issuer.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// List of JSON Web Keys.
    pub keys: Vec<Jwk>,
}

/// Failure to obtain a fresh key set.
#[derive(Debug, Error)]
pub enum JwksError {
    #[error("JWKS request failed: {0}")]
    Request(String),

    #[error("JWKS endpoint returned HTTP {0}")]
    Status(u16),

    #[error("JWKS response could not be parsed: {0}")]
    Parse(String),

    #[error("JWKS fetch failed recently, not retrying yet")]
    Backoff,
}

/// Cached JWKS data with expiry time.
struct CachedJwks {
    /// Map of key ID to JWK.
    keys: HashMap<String, Jwk>,

    /// When this cache entry expires.
    expires_at: Instant,
}

/// Bookkeeping guarded by the refresh lock.
#[derive(Debug, Default)]
struct RefreshState {
    /// Last fetch attempt, successful or not.
    last_attempt: Option<Instant>,

    /// Last failed fetch attempt.
    last_failure: Option<Instant>,
}

/// Result of consulting the cache without fetching.
#[derive(Debug)]
enum CacheLookup {
    /// Key is present in an unexpired cache.
    Hit(Jwk),
    /// Cache is unexpired but does not contain the key.
    Miss,
    /// Cache is empty or expired.
    Stale,
}

/// JWKS client for fetching and caching public keys.
///
/// Safe to share between requests; concurrent cache misses are collapsed
/// into a single fetch.
pub struct JwksClient {
    /// URL to the JWKS endpoint.
    jwks_url: String,

    /// HTTP client for fetching JWKS.
    http_client: reqwest::Client,

    /// Cached JWKS data.
    cache: RwLock<Option<CachedJwks>>,

    /// Serializes refreshes; records when fetches were last tried.
    refresh_lock: Mutex<RefreshState>,

    /// Cache TTL duration.
    cache_ttl: Duration,

    /// Per-fetch timeout.
    fetch_timeout: Duration,
}

impl JwksClient {
    /// Create a new JWKS client with default TTL and timeout.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL to the issuer's JWKS endpoint
    pub fn new(jwks_url: String) -> Self {
        Self::with_settings(
            jwks_url,
            Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECONDS),
        )
    }

    /// Create a new JWKS client with custom cache TTL and fetch timeout.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - URL to the issuer's JWKS endpoint
    /// * `cache_ttl` - How long to cache JWKS before refreshing
    /// * `fetch_timeout` - Upper bound on a single fetch
    pub fn with_settings(jwks_url: String, cache_ttl: Duration, fetch_timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "casting.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(RefreshState::default()),
            cache_ttl,
            fetch_timeout,
        }
    }

    /// Get a JWK by key ID.
    ///
    /// Returns `Ok(None)` when the issuer's key set has no key with this id.
    ///
    /// # Errors
    ///
    /// Returns `JwksError` when a fetch was needed and failed (network,
    /// timeout, non-2xx status, unparseable body), or
    /// `JwksError::Backoff` when the cache is stale and the last fetch failed
    /// within [`FAILED_FETCH_BACKOFF`].
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn get_key(&self, kid: &str) -> Result<Option<Jwk>, JwksError> {
        if let CacheLookup::Hit(key) = self.lookup(kid).await {
            tracing::debug!(target: "casting.auth.jwks", "JWKS cache hit");
            return Ok(Some(key));
        }

        let mut state = self.refresh_lock.lock().await;

        // Another request may have refreshed while we waited for the lock
        match self.lookup(kid).await {
            CacheLookup::Hit(key) => return Ok(Some(key)),
            CacheLookup::Miss => {
                if state.last_attempt.is_some_and(|at| at.elapsed() < MIN_REFETCH_INTERVAL) {
                    tracing::debug!(target: "casting.auth.jwks", "Key not found in JWKS cache, refetch suppressed");
                    return Ok(None);
                }
                tracing::debug!(target: "casting.auth.jwks", "Key not found in JWKS cache, refetching");
            }
            CacheLookup::Stale => {
                if state.last_failure.is_some_and(|at| at.elapsed() < FAILED_FETCH_BACKOFF) {
                    tracing::debug!(target: "casting.auth.jwks", "JWKS cache stale and last fetch failed, backing off");
                    return Err(JwksError::Backoff);
                }
                tracing::debug!(target: "casting.auth.jwks", "JWKS cache empty or expired");
            }
        }

        state.last_attempt = Some(Instant::now());
        if let Err(e) = self.refresh_cache().await {
            state.last_failure = Some(Instant::now());
            // An expired cache must not outlive a failed refresh
            let mut cache = self.cache.write().await;
            if cache.as_ref().is_some_and(|c| c.expires_at <= Instant::now()) {
                *cache = None;
            }
            return Err(e);
        }
        state.last_failure = None;

        match self.lookup(kid).await {
            CacheLookup::Hit(key) => Ok(Some(key)),
            CacheLookup::Miss | CacheLookup::Stale => {
                tracing::warn!(target: "casting.auth.jwks", "Key not found in JWKS after refresh");
                Ok(None)
            }
        }
    }

    async fn lookup(&self, kid: &str) -> CacheLookup {
        let cache = self.cache.read().await;
        match cache.as_ref() {
            Some(cached) if cached.expires_at > Instant::now() => match cached.keys.get(kid) {
                Some(key) => CacheLookup::Hit(key.clone()),
                None => CacheLookup::Miss,
            },
            _ => CacheLookup::Stale,
        }
    }

    /// Refresh the JWKS cache by fetching from the issuer.
    #[instrument(skip(self))]
    async fn refresh_cache(&self) -> Result<(), JwksError> {
        let start = Instant::now();
        let result = self.fetch_jwks().await;
        let status = if result.is_ok() { "success" } else { "error" };
        record_jwks_fetch(status, start.elapsed());

        let jwks = result?;

        let keys: HashMap<String, Jwk> = jwks
            .keys
            .into_iter()
            .filter_map(|key| key.kid.clone().map(|kid| (kid, key)))
            .collect();

        tracing::info!(
            target: "casting.auth.jwks",
            key_count = keys.len(),
            "JWKS cache refreshed"
        );

        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            keys,
            expires_at: Instant::now() + self.cache_ttl,
        });

        Ok(())
    }

    async fn fetch_jwks(&self) -> Result<JwksResponse, JwksError> {
        tracing::debug!(target: "casting.auth.jwks", url = %self.jwks_url, "Fetching JWKS from issuer");

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::error!(
                        target: "casting.auth.jwks",
                        timeout_secs = self.fetch_timeout.as_secs(),
                        "JWKS fetch timed out"
                    );
                } else {
                    tracing::error!(target: "casting.auth.jwks", error = %e, "Failed to fetch JWKS");
                }
                JwksError::Request(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "casting.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(JwksError::Status(response.status().as_u16()));
        }

        response.json::<JwksResponse>().await.map_err(|e| {
            tracing::error!(target: "casting.auth.jwks", error = %e, "Failed to parse JWKS response");
            JwksError::Parse(e.to_string())
        })
    }

    /// Clear the cache.
    #[cfg(test)]
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }
}
