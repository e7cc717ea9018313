use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::error::AppResult;

/// Default bound on a single Redis round trip, connection setup included
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(500);

/// Writes queued beyond this are dropped rather than buffered
const WRITE_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Poster URL keyed by normalized title
    Poster(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Poster(title) => write!(f, "poster:{}", title.trim().to_lowercase()),
        }
    }
}

/// Opens a Redis client for the poster cache
///
/// Connections are established lazily on first use, so a bad URL is the only
/// failure reported here.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Pending write for the background writer
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed cache with writes offloaded to a background task
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::Sender<CacheWriteMessage>,
    op_timeout: Duration,
}

/// Stops the background writer after it drains queued writes
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
    grace: Duration,
}

impl CacheWriterHandle {
    /// Signals the writer and waits for it to flush pending writes
    ///
    /// Every flushed write is individually bounded by the cache timeout, and
    /// the whole flush by a grace period proportional to it. A writer stuck
    /// past the grace period is aborted so shutdown always completes.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;

        let mut task = self.task;
        match tokio::time::timeout(self.grace, &mut task).await {
            Ok(Ok(())) => tracing::info!("Cache writer stopped"),
            Ok(Err(e)) => tracing::error!(error = %e, "Cache writer task failed"),
            Err(_) => {
                task.abort();
                tracing::warn!(
                    grace_ms = self.grace.as_millis() as u64,
                    "Cache writer did not stop in time, aborted"
                );
            }
        }
    }
}

/// Runs one Redis operation under `limit`, turning an elapsed deadline into an error
async fn bounded<T>(
    limit: Duration,
    operation: impl Future<Output = AppResult<T>>,
) -> AppResult<T> {
    tokio::time::timeout(limit, operation).await.map_err(|_| {
        AppError::Internal(format!(
            "Redis did not respond within {}ms",
            limit.as_millis()
        ))
    })?
}

impl Cache {
    /// Creates the cache with [`DEFAULT_CACHE_TIMEOUT`] and spawns its writer task
    ///
    /// The writer runs in the background so poster lookups never wait on a
    /// Redis write. Keep the returned [`CacheWriterHandle`] and call
    /// [`CacheWriterHandle::shutdown`] on exit to flush queued writes.
    ///
    /// See [`Cache::with_timeout`] for the timeout and queueing rules.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        Self::with_timeout(redis_client, DEFAULT_CACHE_TIMEOUT)
    }

    /// Creates the cache and spawns its writer task
    ///
    /// `op_timeout` bounds every Redis round trip, reads and background
    /// writes alike, including connection setup. A Redis that accepts
    /// connections but never answers therefore costs a reader at most
    /// `op_timeout` before the lookup falls through as a miss.
    ///
    /// Writes are queued on a bounded channel. When Redis is slower than the
    /// request rate the queue fills and further writes are dropped with a
    /// warning; the cache is an optimization, so losing entries is fine.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_timeout(redis_client: Client, op_timeout: Duration) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::channel(WRITE_QUEUE_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let client = redis_client.clone();
        let task = tokio::spawn(async move {
            Self::cache_writer_task(client, op_timeout, write_rx, shutdown_rx).await;
        });

        let cache = Self {
            redis_client,
            write_tx,
            op_timeout,
        };

        let handle = CacheWriterHandle {
            shutdown_tx,
            task,
            grace: op_timeout * 4,
        };

        (cache, handle)
    }

    /// Upper bound on a single Redis round trip
    pub fn op_timeout(&self) -> Duration {
        self.op_timeout
    }

    /// Background task that applies queued writes
    ///
    /// Handles one write at a time until the shutdown signal, then flushes
    /// whatever is still queued before exiting.
    async fn cache_writer_task(
        client: Client,
        op_timeout: Duration,
        mut write_rx: mpsc::Receiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&client, op_timeout, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    // Senders live on in cloned caches, so drain what is queued
                    // instead of waiting for the channel to close.
                    let mut flushed = 0usize;
                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&client, op_timeout, msg).await {
                            tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                        } else {
                            flushed += 1;
                        }
                    }

                    tracing::info!(flushed, "Cache writer flushed pending writes");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(
        client: &Client,
        op_timeout: Duration,
        msg: CacheWriteMessage,
    ) -> AppResult<()> {
        bounded(op_timeout, async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
            Ok(())
        })
        .await
    }

    /// Retrieves a value from the cache by key
    ///
    /// The value is stored as JSON and deserialized into `T`. Returns `None`
    /// when the key is absent. Connection failures, a Redis that does not
    /// answer within [`Cache::op_timeout`], and undecodable payloads are all
    /// errors.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let cached: Option<String> = bounded(self.op_timeout, async {
            let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
            let cached: Option<String> = conn.get(key.to_string()).await?;
            Ok(cached)
        })
        .await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Like [`Cache::get_from_cache`], but logs failures and reports them as a miss
    pub async fn lookup<T: serde::de::DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.get_from_cache(key).await {
            Ok(hit) => {
                tracing::debug!(key = %key, hit = hit.is_some(), "Cache lookup");
                hit
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Stores a value in the cache without waiting for Redis
    ///
    /// The value is serialized to JSON here and handed to the background
    /// writer, which applies it with `SETEX` and a `ttl` in seconds. The call
    /// returns immediately; a failed or dropped write is only logged.
    ///
    /// Writes are dropped when the queue is full (Redis stalled or slower
    /// than traffic) or after the writer has shut down.
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        match self.write_tx.try_send(msg) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(msg)) => {
                tracing::warn!(key = %msg.key, "Cache write queue full, dropping write");
            }
            Err(mpsc::error::TrySendError::Closed(msg)) => {
                tracing::error!(key = %msg.key, "Cache writer stopped, dropping write");
            }
        }
    }
}
