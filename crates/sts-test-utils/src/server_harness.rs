//! Test server harness for E2E testing
//!
//! Provides [`TestStsServer`] for spawning real token service instances in
//! tests. Each server gets its own in-memory store and client repository,
//! so tests never need Redis or Postgres and never share state.

use crate::crypto_fixtures::{default_test_clients, TEST_JWT_SECRET};
use anyhow::Context;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use sts_service::config::Config;
use sts_service::models::TokenResponse;
use sts_service::observability::metrics::init_metrics_recorder;
use sts_service::repositories::InMemoryClientRepository;
use sts_service::routes::{self, AppState};
use sts_service::services::TokenService;
use sts_service::store::{InMemoryStore, SharedStore};
use tokio::task::JoinHandle;

/// Rate limit used unless a test asks for one; high enough to stay out of
/// the way of functional tests.
const DEFAULT_TEST_RATE_LIMIT: u64 = 1000;

/// Builder for [`TestStsServer`]
///
/// # Example
/// ```rust,ignore
/// let server = TestStsServer::builder()
///     .rate_limit(3)
///     .admin_endpoints(false)
///     .spawn()
///     .await?;
/// ```
pub struct TestStsServerBuilder {
    vars: HashMap<String, String>,
    repository: Option<InMemoryClientRepository>,
}

impl TestStsServerBuilder {
    fn new() -> Self {
        let vars = HashMap::from([
            ("STS_JWT_SECRET".to_string(), TEST_JWT_SECRET.to_string()),
            ("REDIS_URL".to_string(), "memory://".to_string()),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("ADMIN_ENDPOINTS_ENABLED".to_string(), "true".to_string()),
            (
                "RATE_LIMIT_REQUESTS".to_string(),
                DEFAULT_TEST_RATE_LIMIT.to_string(),
            ),
        ]);
        Self {
            vars,
            repository: None,
        }
    }

    /// Requests allowed per window
    pub fn rate_limit(self, requests: u64) -> Self {
        self.var("RATE_LIMIT_REQUESTS", requests)
    }

    pub fn rate_limit_window_seconds(self, seconds: u64) -> Self {
        self.var("RATE_LIMIT_WINDOW_SECONDS", seconds)
    }

    pub fn rate_limit_enabled(self, enabled: bool) -> Self {
        self.var("RATE_LIMIT_ENABLED", enabled)
    }

    pub fn admin_endpoints(self, enabled: bool) -> Self {
        self.var("ADMIN_ENDPOINTS_ENABLED", enabled)
    }

    pub fn token_validity_seconds(self, seconds: u64) -> Self {
        self.var("TOKEN_VALIDITY_SECONDS", seconds)
    }

    pub fn token_cache_enabled(self, enabled: bool) -> Self {
        self.var("TOKEN_CACHE_ENABLED", enabled)
    }

    /// Set any configuration variable
    pub fn var(mut self, name: &str, value: impl ToString) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    /// Replace the default seeded clients
    pub fn clients(mut self, repository: InMemoryClientRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Bind to a random port and serve in the background
    pub async fn spawn(self) -> Result<TestStsServer, anyhow::Error> {
        let config = Config::from_vars(&self.vars).context("invalid test configuration")?;

        let store = InMemoryStore::new();
        let shared: Arc<dyn SharedStore> = Arc::new(store.clone());
        let repository = Arc::new(
            self.repository
                .unwrap_or_else(|| InMemoryClientRepository::with_clients(default_test_clients())),
        );

        let service = TokenService::new(&config, shared.clone(), repository.clone())
            .context("failed to build token service")?;

        let state = Arc::new(AppState {
            service,
            store: shared,
            config,
        });

        // The global recorder can only be installed once per process; later
        // servers get a standalone handle.
        let metrics_handle = match init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                PrometheusBuilder::new().build_recorder().handle()
            }
        };

        let app = routes::build_routes(state.clone(), metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test server")?;
        let addr = listener
            .local_addr()
            .context("failed to get local address")?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(TestStsServer {
            addr,
            store,
            repository,
            state,
            client: reqwest::Client::new(),
            _handle: handle,
        })
    }
}

/// Running token service bound to a random local port
pub struct TestStsServer {
    addr: SocketAddr,
    store: InMemoryStore,
    repository: Arc<InMemoryClientRepository>,
    state: Arc<AppState>,
    client: reqwest::Client,
    _handle: JoinHandle<()>,
}

impl TestStsServer {
    /// Spawn with default settings: seeded clients, admin endpoints on,
    /// generous rate limit
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::builder().spawn().await
    }

    pub fn builder() -> TestStsServerBuilder {
        TestStsServerBuilder::new()
    }

    /// Base URL of the server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The server's store, for inspection and failure injection
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    /// The server's client repository, for inspection and failure injection
    pub fn repository(&self) -> &InMemoryClientRepository {
        &self.repository
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    /// The service behind the HTTP layer
    pub fn service(&self) -> &TokenService {
        &self.state.service
    }

    /// Shared HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// POST credentials as JSON to the token endpoint
    pub async fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<reqwest::Response, anyhow::Error> {
        let response = self
            .client
            .post(format!("{}/api/v1/auth/token", self.url()))
            .json(&serde_json::json!({
                "client_id": client_id,
                "client_secret": client_secret,
            }))
            .send()
            .await?;
        Ok(response)
    }

    /// Request a token and return it, failing unless the server answers 200
    pub async fn issue_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, anyhow::Error> {
        let response = self.request_token(client_id, client_secret).await?;
        anyhow::ensure!(
            response.status() == reqwest::StatusCode::OK,
            "token request failed with {}",
            response.status()
        );
        let body: TokenResponse = response.json().await?;
        Ok(body.access_token)
    }

    /// GET the validate endpoint with `Authorization: Bearer <token>`
    pub async fn validate(&self, token: &str) -> Result<reqwest::Response, anyhow::Error> {
        let response = self
            .client
            .get(format!("{}/api/v1/auth/validate", self.url()))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(response)
    }
}

impl Drop for TestStsServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
