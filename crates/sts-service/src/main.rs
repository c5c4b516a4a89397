//! Security Token Service
//!
//! Entry point: configuration, shared store, client repository and HTTP server.

use sts_service::config::Config;
use sts_service::observability::metrics::init_metrics_recorder;
use sts_service::repositories::{ClientRepository, InMemoryClientRepository, PgClientRepository};
use sts_service::routes::{self, AppState};
use sts_service::services::TokenService;
use sts_service::store::{InMemoryStore, RedisStore, SharedStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Security Token Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        rate_limit_enabled = config.rate_limit_enabled,
        admin_endpoints_enabled = config.admin_endpoints_enabled,
        "Configuration loaded successfully"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to install metrics recorder: {}", e);
        e
    })?;

    let store: Arc<dyn SharedStore> = if config.uses_in_memory_store() {
        warn!("Using in-process store; state is not shared between instances");
        Arc::new(InMemoryStore::new())
    } else {
        info!("Connecting to Redis...");
        let store = RedisStore::connect(&config.redis_url, config.store_timeout)
            .await
            .map_err(|e| {
                error!("Failed to connect to Redis: {}", e);
                e
            })?;
        info!("Redis connection established");
        Arc::new(store)
    };

    let repository = client_repository(&config).await?;

    let service = TokenService::new(&config, store.clone(), repository)?;

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let state = Arc::new(AppState {
        service,
        store,
        config,
    });
    let app = routes::build_routes(state, metrics_handle);

    info!("Security Token Service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Security Token Service shutdown complete");

    Ok(())
}

/// `RUST_LOG` filter, plain text unless `LOG_FORMAT=json`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sts_service=info,tower_http=info".into());

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Postgres when `DATABASE_URL` is set, else the clients file, else empty.
async fn client_repository(
    config: &Config,
) -> Result<Arc<dyn ClientRepository>, Box<dyn std::error::Error>> {
    if let Some(database_url) = &config.database_url {
        info!("Connecting to database...");
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                e
            })?;
        sqlx::migrate!("../../migrations").run(&pool).await?;
        info!("Database connection established");
        return Ok(Arc::new(PgClientRepository::new(pool)));
    }

    if let Some(path) = &config.clients_file {
        let repository = InMemoryClientRepository::from_json_file(path)?;
        info!(clients = repository.len(), "Loaded clients from file");
        return Ok(Arc::new(repository));
    }

    warn!("No client source configured; every token request will be rejected");
    Ok(Arc::new(InMemoryClientRepository::new()))
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
