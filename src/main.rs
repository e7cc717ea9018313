use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_matcher::{
    config::Config,
    routes::{create_router, AppState, RecommendationSettings},
    services::{OmdbProvider, PosterProvider},
    store::{create_redis_client, Cache, CacheWriterHandle, Corpus},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=info,tower_http=info", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let corpus = Corpus::load(&config.movies_path, &config.vectors_path)
        .map_err(|e| {
            tracing::error!(
                error = %e,
                movies_path = %config.movies_path,
                vectors_path = %config.vectors_path,
                "Model files not found or invalid"
            );
            e
        })
        .context("Failed to load movie corpus")?;

    if config.omdb_api_key().is_none() {
        tracing::warn!("OMDB_API_KEY is not set; every poster will be a placeholder");
    }

    let (cache, cache_handle) = match &config.redis_url {
        Some(redis_url) => {
            let client = create_redis_client(redis_url)?;
            let (cache, handle) = Cache::with_timeout(client, config.cache_timeout());
            tracing::info!(
                timeout_ms = config.cache_timeout_ms,
                "Poster cache enabled"
            );
            (Some(cache), Some(handle))
        }
        None => (None, None),
    };

    let provider = OmdbProvider::new(
        config.omdb_api_key().map(str::to_string),
        config.omdb_api_url.clone(),
        config.poster_timeout(),
        cache,
    )?;
    let poster_provider: Arc<dyn PosterProvider> = Arc::new(provider);

    let state = Arc::new(AppState::new(
        Arc::new(corpus),
        poster_provider,
        RecommendationSettings::from(&config),
    ));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    tracing::info!(address = %config.bind_address(), "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_cache(cache_handle).await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn shutdown_cache(handle: Option<CacheWriterHandle>) {
    if let Some(handle) = handle {
        handle.shutdown().await;
    }
}
