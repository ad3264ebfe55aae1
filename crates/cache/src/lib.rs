//! CityFlow - Cache
//!
//! Redis wrapper used as a read-through cache and as the pub/sub backbone
//! for live fan-out.
//!
//! # Degraded mode
//!
//! Connecting retries for a bounded window (sidecar proxies come up after
//! the app container). A client that never reaches Redis degrades instead
//! of failing: reads report a miss, writes and publishes become no-ops.
//! Stages that cannot run without pub/sub use [`Cache::connect_required`]
//! and treat the error as fatal at startup.

use std::time::Duration;

use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Connection attempts before degrading.
const CONNECT_ATTEMPTS: u32 = 10;

/// Delay between connection attempts.
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Errors from the cache client
#[derive(Debug, Error)]
pub enum CacheError {
    /// The client is degraded and cannot serve this operation
    #[error("cache unavailable")]
    Unavailable,

    /// Underlying Redis error
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Value could not be encoded as JSON
    #[error("cache encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Shared Redis handle.
///
/// Cloning is cheap; all clones share one multiplexed connection.
#[derive(Clone)]
pub struct Cache {
    inner: Option<Inner>,
}

#[derive(Clone)]
struct Inner {
    client: redis::Client,
    manager: ConnectionManager,
}

impl Cache {
    /// Connect with bounded retry, degrading on exhaustion.
    pub async fn connect(url: &str) -> Self {
        match Self::try_connect(url).await {
            Ok(cache) => cache,
            Err(err) => {
                warn!(error = %err, "redis unreachable, cache degraded to no-op");
                Self { inner: None }
            }
        }
    }

    /// Connect with bounded retry, failing on exhaustion.
    ///
    /// For stages whose output channel is not optional.
    pub async fn connect_required(url: &str) -> Result<Self> {
        Self::try_connect(url).await
    }

    /// A permanently degraded handle (used in tests and as an explicit
    /// cache-off mode).
    pub fn disconnected() -> Self {
        Self { inner: None }
    }

    async fn try_connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;

        let mut last_err: Option<redis::RedisError> = None;
        for attempt in 1..=CONNECT_ATTEMPTS {
            match ConnectionManager::new(client.clone()).await {
                Ok(manager) => {
                    info!(url = %redacted(url), "redis connected");
                    return Ok(Self {
                        inner: Some(Inner { client, manager }),
                    });
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts = CONNECT_ATTEMPTS,
                        error = %err,
                        "redis connection attempt failed"
                    );
                    last_err = Some(err);
                    if attempt < CONNECT_ATTEMPTS {
                        tokio::time::sleep(CONNECT_RETRY_DELAY).await;
                    }
                }
            }
        }

        Err(last_err.map(CacheError::Redis).unwrap_or(CacheError::Unavailable))
    }

    /// Whether the client reached Redis at startup.
    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }

    /// Read and JSON-decode a cached value. Degraded clients and decode
    /// failures both report a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let inner = self.inner.as_ref()?;
        let mut conn = inner.manager.clone();
        let raw: Option<String> = match conn.get(key).await {
            Ok(value) => value,
            Err(err) => {
                debug!(key, error = %err, "cache get failed, treating as miss");
                return None;
            }
        };
        raw.and_then(|s| serde_json::from_str(&s).ok())
    }

    /// JSON-encode and store a value with a TTL. A no-op when degraded.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let Some(inner) = self.inner.as_ref() else {
            return Ok(());
        };
        let payload = serde_json::to_string(value)?;
        let mut conn = inner.manager.clone();
        let _: () = conn.set_ex(key, payload, ttl.as_secs()).await?;
        Ok(())
    }

    /// Remove a key. A no-op when degraded.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let Some(inner) = self.inner.as_ref() else {
            return Ok(());
        };
        let mut conn = inner.manager.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    /// Publish raw bytes on a channel. A no-op when degraded.
    pub async fn publish_raw(&self, channel: &str, payload: &[u8]) -> Result<()> {
        let Some(inner) = self.inner.as_ref() else {
            return Ok(());
        };
        let mut conn = inner.manager.clone();
        let _: () = conn.publish(channel, payload).await?;
        Ok(())
    }

    /// JSON-encode and publish a value on a channel. A no-op when degraded.
    pub async fn publish_json<T: Serialize>(&self, channel: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_vec(value)?;
        self.publish_raw(channel, &payload).await
    }

    /// Subscribe to a channel on a dedicated connection.
    ///
    /// Fails when degraded: a subscriber cannot meaningfully no-op.
    pub async fn subscribe(&self, channel: &str) -> Result<Subscription> {
        let inner = self.inner.as_ref().ok_or(CacheError::Unavailable)?;
        let mut pubsub = inner.client.get_async_pubsub().await?;
        pubsub.subscribe(channel).await?;
        Ok(Subscription { pubsub })
    }
}

/// An active pub/sub subscription.
pub struct Subscription {
    pubsub: redis::aio::PubSub,
}

impl Subscription {
    /// Next message payload, or `None` when the connection closes.
    ///
    /// Payloads that are not valid UTF-8 are skipped.
    pub async fn next_message(&mut self) -> Option<String> {
        loop {
            let msg = self.pubsub.on_message().next().await?;
            match msg.get_payload::<String>() {
                Ok(payload) => return Some(payload),
                Err(err) => {
                    debug!(error = %err, "skipping undecodable pub/sub payload");
                }
            }
        }
    }
}

/// Strip credentials from a Redis URL for logging.
fn redacted(url: &str) -> String {
    match url.rsplit_once('@') {
        Some((_, tail)) => format!("redis://{tail}"),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_degraded_get_is_a_miss() {
        let cache = Cache::disconnected();
        let value: Option<String> = cache.get("some-key").await;
        assert!(value.is_none());
        assert!(!cache.is_available());
    }

    #[tokio::test]
    async fn test_degraded_writes_are_noops() {
        let cache = Cache::disconnected();
        cache
            .set("k", &"v", Duration::from_secs(5))
            .await
            .unwrap();
        cache.delete("k").await.unwrap();
        cache.publish_raw("chan", b"payload").await.unwrap();
    }

    #[tokio::test]
    async fn test_degraded_subscribe_fails() {
        let cache = Cache::disconnected();
        assert!(matches!(
            cache.subscribe("chan").await,
            Err(CacheError::Unavailable)
        ));
    }

    #[test]
    fn test_redacted_url() {
        assert_eq!(
            redacted("redis://:hunter2@cache:6379/0"),
            "redis://cache:6379/0"
        );
        assert_eq!(redacted("redis://cache:6379/0"), "redis://cache:6379/0");
    }
}
