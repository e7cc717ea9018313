//! Poster lookup providers
//!
//! A provider turns a normalized title into a poster URL. Lookups fail with a
//! typed [`PosterLookupError`]; the resolver functions below recover every
//! failure into [`Poster::Placeholder`] so one bad lookup never breaks the
//! grid.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::instrument;

use crate::{
    error::PosterLookupError,
    models::Poster,
    services::title_normalizer::normalize,
};

pub mod omdb;

pub use omdb::OmdbProvider;

/// Trait for poster lookup services
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterProvider: Send + Sync {
    /// Fetches the poster URL for an already normalized title
    async fn fetch_poster(&self, title: &str) -> Result<String, PosterLookupError>;

    /// Clone provider for parallel task execution
    fn clone_for_task(&self) -> Box<dyn PosterProvider>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Resolves the poster for a raw corpus title, falling back to the placeholder
///
/// The title is normalized first. A missing API key is logged at debug level;
/// every other failure is a warning.
#[instrument(skip(provider), fields(provider_name = provider.name()))]
pub async fn resolve_poster(provider: &dyn PosterProvider, raw_title: &str) -> Poster {
    let title = normalize(raw_title);

    match provider.fetch_poster(&title).await {
        Ok(url) => Poster::Found(url),
        Err(PosterLookupError::MissingApiKey) => {
            tracing::debug!(title = %title, "No API key, using placeholder poster");
            Poster::Placeholder
        }
        Err(e) => {
            tracing::warn!(title = %title, error = %e, "Poster lookup failed, using placeholder");
            Poster::Placeholder
        }
    }
}

/// Resolves posters for many titles with at most `concurrency` lookups in flight
///
/// Each title runs through [`resolve_poster`] on its own Tokio task with a
/// provider from [`PosterProvider::clone_for_task`]. A semaphore caps how many
/// lookups run at once; a `concurrency` of zero is treated as one.
///
/// Output order matches `titles`. Every lookup succeeds or falls back to
/// [`Poster::Placeholder`] on its own, and a panicked task also yields the
/// placeholder, so the result always has one poster per title.
///
/// How long a single lookup may take is up to the provider; the OMDb
/// provider bounds it by its request and cache timeouts.
pub async fn resolve_posters(
    provider: &dyn PosterProvider,
    titles: &[String],
    concurrency: usize,
) -> Vec<Poster> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::with_capacity(titles.len());

    for title in titles {
        let provider = provider.clone_for_task();
        let permits = Arc::clone(&permits);
        let title = title.clone();

        let task = tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            resolve_poster(provider.as_ref(), &title).await
        });
        tasks.push(task);
    }

    let mut posters = Vec::with_capacity(tasks.len());
    for task in tasks {
        match task.await {
            Ok(poster) => posters.push(poster),
            Err(e) => {
                tracing::error!(error = %e, "Poster task join error");
                posters.push(Poster::Placeholder);
            }
        }
    }

    let found = posters.iter().filter(|poster| poster.is_found()).count();
    tracing::info!(
        requested = titles.len(),
        found,
        placeholders = posters.len() - found,
        provider = provider.name(),
        "Posters resolved"
    );

    posters
}
