//! OMDb poster provider
//!
//! Looks a movie up by exact title (`GET /?t=<title>&apikey=<key>`) and reads
//! the `Poster` field of the response. OMDb reports "not found" in-band with
//! `Response: "False"` and uses the literal `"N/A"` when it has no poster.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client as HttpClient;

use crate::{
    cached,
    error::{AppError, AppResult, PosterLookupError},
    models::{CachedPoster, OmdbTitleResponse},
    services::providers::PosterProvider,
    store::{Cache, CacheKey},
};

const POSTER_CACHE_TTL: u64 = 604800; // 1 week

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    timeout: Duration,
    cache: Option<Cache>,
}

impl OmdbProvider {
    /// Creates an OMDb provider
    ///
    /// A blank `api_key` counts as missing; every lookup then fails fast with
    /// [`PosterLookupError::MissingApiKey`] and no request is sent.
    ///
    /// `timeout` bounds the HTTP request. The whole lookup, cache read
    /// included, is bounded by `timeout` plus the cache's own
    /// [`Cache::op_timeout`], so a stalled Redis cannot hold a poster slot
    /// longer than that.
    ///
    /// With `cache` set, found posters are read through Redis and written
    /// back in the background for a week.
    pub fn new(
        api_key: Option<String>,
        api_url: String,
        timeout: Duration,
        cache: Option<Cache>,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            api_url,
            timeout,
            cache,
        })
    }

    /// Upper bound on one `fetch_poster` call
    pub fn lookup_deadline(&self) -> Duration {
        match &self.cache {
            Some(cache) => self.timeout + cache.op_timeout(),
            None => self.timeout,
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    async fn cached_poster(
        &self,
        api_key: &str,
        title: &str,
    ) -> Result<CachedPoster, PosterLookupError> {
        cached!(
            self.cache.as_ref(),
            CacheKey::Poster(title.to_string()),
            POSTER_CACHE_TTL,
            async move {
                let url = self.request_poster(api_key, title).await?;
                Ok::<_, PosterLookupError>(CachedPoster {
                    url,
                    cached_at: Utc::now(),
                })
            }
        )
    }

    /// Single attempt against the OMDb API
    async fn request_poster(&self, api_key: &str, title: &str) -> Result<String, PosterLookupError> {
        let url = format!("{}/", self.api_url.trim_end_matches('/'));

        let response = self
            .http_client
            .get(&url)
            .query(&[("t", title), ("apikey", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PosterLookupError::Status(status.as_u16()));
        }

        let body: OmdbTitleResponse = response.json().await?;

        match body.poster_url() {
            Some(poster) => {
                tracing::debug!(
                    title = %title,
                    matched_title = body.title.as_deref().unwrap_or_default(),
                    provider = "omdb",
                    "Poster found"
                );
                Ok(poster.to_string())
            }
            None => {
                if let Some(reason) = &body.error {
                    tracing::debug!(title = %title, reason = %reason, "OMDb lookup unsuccessful");
                }
                Err(PosterLookupError::NotFound(title.to_string()))
            }
        }
    }
}

#[async_trait::async_trait]
impl PosterProvider for OmdbProvider {
    async fn fetch_poster(&self, title: &str) -> Result<String, PosterLookupError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(PosterLookupError::MissingApiKey)?;

        if title.trim().is_empty() {
            return Err(PosterLookupError::NotFound(title.to_string()));
        }

        let lookup = self.cached_poster(api_key, title);
        let entry = tokio::time::timeout(self.lookup_deadline(), lookup)
            .await
            .map_err(|_| PosterLookupError::Timeout)??;
        Ok(entry.url)
    }

    fn clone_for_task(&self) -> Box<dyn PosterProvider> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
