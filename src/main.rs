use std::sync::Arc;
use std::time::Duration;

use pokedex::{CatalogStore, Config, FileStore, PokeApi, routes};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CACHE_CLEANUP_PERIOD: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() {
    let json_logs = std::env::var("POKEDEX_LOG_FORMAT").is_ok_and(|format| format == "json");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                format!(
                    "{}=debug,tower_http=debug,axum::rejection=trace",
                    env!("CARGO_CRATE_NAME")
                )
                .into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let api = match PokeApi::new(&config.pokemon) {
        Ok(api) => api,
        Err(e) => {
            tracing::error!("Failed to build PokeAPI client: {}", e);
            std::process::exit(1);
        }
    };

    let storage = FileStore::new(&config.storage.data_dir);
    tracing::info!("Storing favorites under {}", storage.root().display());

    let store = Arc::new(CatalogStore::new(api, storage, &config));
    store.initialize().await;

    store.spawn_cache_cleanup(CACHE_CLEANUP_PERIOD);

    let app = routes::router(store);

    let listener = match tokio::net::TcpListener::bind(&config.server.address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", config.server.address, e);
            std::process::exit(1);
        }
    };

    match listener.local_addr() {
        Ok(address) => tracing::info!("listening on {}", address),
        Err(e) => tracing::warn!("listening on unknown address: {}", e),
    }

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
