use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use reelvote_api::{
    api::{create_router, AppState},
    config::Config,
    db::{connect, create_redis_client, Cache},
    services::{MovieService, MovieServiceSettings, TmdbCatalog},
    store::RedisReactionStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let client = create_redis_client(&config.redis_url)?;
    let conn = connect(&client).await?;
    info!(namespace = %config.reaction_namespace, "Connected to Redis");

    let store = RedisReactionStore::new(conn.clone(), config.reaction_namespace.clone());
    let (cache, cache_handle) = Cache::new(conn);

    let catalog = TmdbCatalog::new(
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.catalog_timeout(),
    )?
    .with_language(config.tmdb_language.clone())
    .with_max_retries(config.catalog_max_retries)
    .with_cache(cache, config.catalog_cache_ttl_secs);

    let movies = MovieService::new(
        Arc::new(store),
        Arc::new(catalog),
        MovieServiceSettings::from_config(&config),
    );
    let app = create_router(AppState::new(movies));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_handle.shutdown().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
