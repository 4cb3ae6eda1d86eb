use opinion_search::{
    api::{build_router, AppState},
    config::{Config, ObservabilityConfig},
    search::{IndexMaintenance, QueryClient, TantivyBackend},
    state::{create_store, load_fixtures, OpinionStore},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "opinion_search={},tower_http=info",
            observability.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (default_config(), Some(e)),
    };

    // Initialize tracing
    init_tracing(&config.observability);
    if let Some(e) = config_error {
        tracing::warn!("Failed to load configuration: {}", e);
        tracing::warn!("Using default configuration");
    }

    tracing::info!("Starting opinion search v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = opinion_search::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("Prometheus metrics initialized");
        }
    } else {
        tracing::info!("Prometheus metrics disabled in configuration");
    }

    // Initialize storage backend
    tracing::info!("Storage backend: {:?}", config.store.backend);
    let store = create_store(&config.store)?;
    if let Some(path) = &config.store.fixture_path {
        load_fixtures(store.as_ref(), path).await?;
    }
    tracing::info!(opinions = store.count().await?, "Storage backend initialized");

    // Initialize search backend
    let backend = Arc::new(TantivyBackend::new(config.search.clone()));
    if config.search.reindex_on_start {
        let indexed = backend.reindex(store.as_ref()).await?;
        tracing::info!(documents = indexed, "Search index built");
    }
    if config.search.autostart {
        backend.start().await?;
    } else {
        tracing::info!("Search index not started; POST /admin/index/start to begin serving");
    }

    let client = QueryClient::new(backend.clone(), store.clone(), config.search.clone());
    let state = AppState::new(client, backend.clone(), store, config.site.clone())
        .with_request_timeout(config.server.request_timeout());
    let app = build_router(state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("HTTP server listening on {}", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, app).await {
            tracing::error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = http_handle => {
            tracing::warn!("HTTP server stopped");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
        }
    }

    backend.stop().await?;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn default_config() -> Config {
    Config {
        server: Default::default(),
        search: Default::default(),
        store: Default::default(),
        site: Default::default(),
        observability: Default::default(),
    }
}
