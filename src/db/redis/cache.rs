use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Catalog details of one movie, per response language
    MovieDetails {
        movie_id: String,
        language: Option<String>,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::MovieDetails {
                movie_id,
                language: Some(language),
            } => write!(f, "catalog:movie:{}:{}", movie_id, language.to_lowercase()),
            CacheKey::MovieDetails {
                movie_id,
                language: None,
            } => write!(f, "catalog:movie:{}", movie_id),
        }
    }
}

/// Creates a Redis client
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Opens a reconnecting, multiplexed Redis connection
///
/// The returned manager is cheap to clone and shared by the reaction store
/// and the details cache.
pub async fn connect(client: &Client) -> anyhow::Result<ConnectionManager> {
    let manager = client.get_connection_manager().await?;
    Ok(manager)
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Cache of catalog responses stored in Redis
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task and waits until pending writes are flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
    }
}

impl Cache {
    /// Creates a new Cache and spawns its background writer
    ///
    /// Writes go through a channel so that storing a catalog response never
    /// delays the request that fetched it.
    pub fn new(conn: ConnectionManager) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let writer_conn = conn.clone();
        let task = tokio::spawn(async move {
            Self::cache_writer_task(writer_conn, write_rx, shutdown_rx).await;
        });

        let cache = Self { conn, write_tx };
        let handle = CacheWriterHandle { shutdown_tx, task };

        (cache, handle)
    }

    /// Background task that processes cache write messages
    ///
    /// On shutdown the channel is closed to new writes and drained before
    /// the task exits.
    async fn cache_writer_task(
        mut conn: ConnectionManager,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&mut conn, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis cache");
                    }
                }
                _ = shutdown_rx.recv() => {
                    write_rx.close();
                    let mut flushed = 0usize;
                    while let Some(msg) = write_rx.recv().await {
                        match Self::write_to_redis(&mut conn, msg).await {
                            Ok(()) => flushed += 1,
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to flush cache write during shutdown");
                            }
                        }
                    }

                    tracing::info!(flushed, "Cache writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(conn: &mut ConnectionManager, msg: CacheWriteMessage) -> AppResult<()> {
        let _: () = conn.set_ex(msg.key, msg.value, msg.ttl).await?;
        Ok(())
    }

    /// Retrieves and deserializes a cached value, `None` on a miss
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.conn.clone();
        let cached: Option<String> = conn.get(key.to_string()).await?;

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

    /// Queues a value for storage without waiting for the write
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

        if let Err(e) = self.write_tx.send(msg) {
            tracing::error!(error = %e, "Failed to send cache write message");
        }
    }
}
