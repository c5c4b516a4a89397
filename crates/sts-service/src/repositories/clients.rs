use crate::config::ConfigError;
use crate::errors::StsError;
use crate::models::ClientIdentity;
use crate::observability::metrics::record_db_query;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Instant;

/// Lookup of client records by id.
#[async_trait::async_trait]
pub trait ClientRepository: Send + Sync {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<ClientIdentity>, StsError>;
}

/// Row shape of the `clients` table.
#[derive(Debug, FromRow)]
struct ClientRow {
    client_id: String,
    display_name: String,
    secret_hash: String,
    scopes: Vec<String>,
    active: bool,
}

impl From<ClientRow> for ClientIdentity {
    fn from(row: ClientRow) -> Self {
        Self {
            client_id: row.client_id,
            display_name: row.display_name,
            secret_hash: row.secret_hash,
            scopes: row.scopes.into_iter().collect(),
            active: row.active,
        }
    }
}

/// Postgres-backed repository over the `clients` table.
#[derive(Clone)]
pub struct PgClientRepository {
    pool: PgPool,
}

impl PgClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ClientRepository for PgClientRepository {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<ClientIdentity>, StsError> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, ClientRow>(
            r#"
            SELECT client_id, display_name, secret_hash, scopes, active
            FROM clients
            WHERE client_id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await;

        let status = if result.is_ok() { "success" } else { "error" };
        record_db_query("select", "clients", status, start.elapsed());

        let row = result.map_err(|e| StsError::Database(format!("Failed to fetch client: {}", e)))?;

        Ok(row.map(ClientIdentity::from))
    }
}

/// In-process repository for development and tests.
///
/// Counts lookups so callers can assert whether the client cache was used,
/// and can be switched into a failing state.
#[derive(Debug, Default)]
pub struct InMemoryClientRepository {
    clients: RwLock<HashMap<String, ClientIdentity>>,
    lookups: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryClientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clients(clients: impl IntoIterator<Item = ClientIdentity>) -> Self {
        let repo = Self::new();
        for client in clients {
            repo.insert(client);
        }
        repo
    }

    /// Parse a JSON array of client records.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let clients: Vec<ClientIdentity> =
            serde_json::from_str(json).map_err(|e| ConfigError::InvalidValue {
                name: "STS_CLIENTS_FILE".to_string(),
                value: e.to_string(),
            })?;
        Ok(Self::with_clients(clients))
    }

    /// Load a JSON array of client records from `path`.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidValue {
            name: "STS_CLIENTS_FILE".to_string(),
            value: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json_str(&json)
    }

    pub fn insert(&self, client: ClientIdentity) {
        self.clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(client.client_id.clone(), client);
    }

    pub fn remove(&self, client_id: &str) -> Option<ClientIdentity> {
        self.clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(client_id)
    }

    pub fn len(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `find_by_client_id` calls so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ClientRepository for InMemoryClientRepository {
    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<ClientIdentity>, StsError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StsError::Database("client repository unavailable".to_string()));
        }

        Ok(self
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(client_id)
            .cloned())
    }
}
