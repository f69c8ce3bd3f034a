//! Test server harness for E2E testing
//!
//! Provides `TestCastingServer` for spawning real Casting Service instances
//! backed by the in-memory store, with the issuer's JWKS endpoint mocked by
//! wiremock.

use crate::crypto_fixtures::{jwks_document, TestKeypair};
use crate::token_builders::{TestTokenBuilder, TEST_AUDIENCE, TEST_DOMAIN, TEST_ISSUER};
use casting_service::config::Config;
use casting_service::repositories::InMemoryCastingStore;
use casting_service::routes::{self, AppState};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the harness serves the key set on.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_test_metrics_handle() -> PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            // The recorder can only be installed once per process; fall back
            // to a standalone recorder if another test got there first
            routes::init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

/// Test harness for spawning the Casting Service in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_list_actors() -> Result<(), anyhow::Error> {
///     let server = TestCastingServer::spawn().await?;
///     let token = server.token_with_permissions(&["get:actors"]);
///
///     let response = reqwest::Client::new()
///         .get(format!("{}/actors", server.url()))
///         .bearer_auth(token)
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestCastingServer {
    addr: SocketAddr,
    store: Arc<InMemoryCastingStore>,
    config: Config,
    jwks_server: MockServer,
    _handle: JoinHandle<()>,
}

impl TestCastingServer {
    /// Spawn a server whose key set holds the primary test key.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_vars(HashMap::new()).await
    }

    /// Spawn a server with extra or overriding environment variables.
    ///
    /// The server will:
    /// - Serve the primary test key at the mocked JWKS endpoint
    /// - Expect `TEST_ISSUER` and `TEST_AUDIENCE` in tokens
    /// - Bind to a random available port (127.0.0.1:0)
    pub async fn spawn_with_vars(overrides: HashMap<String, String>) -> Result<Self, anyhow::Error> {
        let jwks_server = MockServer::start().await;
        mount_jwks(
            &jwks_server,
            ResponseTemplate::new(200).set_body_json(jwks_document(&[&TestKeypair::primary()])),
        )
        .await;

        let mut vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("AUTH0_DOMAIN".to_string(), TEST_DOMAIN.to_string()),
            ("API_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
            ("JWT_ISSUER".to_string(), TEST_ISSUER.to_string()),
            (
                "JWKS_URL".to_string(),
                format!("{}{}", jwks_server.uri(), JWKS_PATH),
            ),
        ]);
        vars.extend(overrides);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let store = Arc::new(InMemoryCastingStore::new());
        let state = Arc::new(AppState {
            store: store.clone(),
            config: config.clone(),
        });

        // Build routes using casting-service's real route builder
        let app = routes::build_routes(state, get_test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            store,
            config,
            jwks_server,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the store the server reads and writes.
    pub fn store(&self) -> &Arc<InMemoryCastingStore> {
        &self.store
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the mocked issuer.
    pub fn jwks_server(&self) -> &MockServer {
        &self.jwks_server
    }

    /// Replace the mocked JWKS response.
    pub async fn set_jwks_response(&self, response: ResponseTemplate) {
        self.jwks_server.reset().await;
        mount_jwks(&self.jwks_server, response).await;
    }

    /// Publish a new key set, as an issuer does when rotating keys.
    pub async fn rotate_keys(&self, keys: &[&TestKeypair]) {
        self.set_jwks_response(ResponseTemplate::new(200).set_body_json(jwks_document(keys)))
            .await;
    }

    /// Number of key set fetches the server has made.
    pub async fn jwks_fetch_count(&self) -> usize {
        self.jwks_server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// A valid token signed with the primary key carrying `permissions`.
    pub fn token_with_permissions(&self, permissions: &[&str]) -> String {
        TestKeypair::primary().sign(&TestTokenBuilder::new().with_permissions(permissions).build())
    }
}

async fn mount_jwks(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(response)
        .mount(server)
        .await;
}

impl Drop for TestCastingServer {
    fn drop(&mut self) {
        // Abort the server task so the port is released when the test ends
        self._handle.abort();
    }
}
