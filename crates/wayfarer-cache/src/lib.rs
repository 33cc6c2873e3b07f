//! Fail-soft key-value cache and pub/sub façade
//!
//! [`CacheContext`] stores JSON values with a mandatory TTL and fans
//! published JSON messages out to typed handlers. Backend failures are
//! logged and degrade to cache-miss behaviour; only [`CacheContext::connect`]
//! returns an error.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod storage;
mod subscriptions;

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use wayfarer_config::{CacheConfig, CacheStorage};

pub use self::error::CacheError;
use self::storage::{Backend, MemoryStore, RedisStore};
use self::subscriptions::RawHandler;

/// Shortest TTL ever written; a zero TTL would mean no expiry
const MIN_TTL: Duration = Duration::from_secs(1);

/// Shared handle to the cache and pub/sub connections
#[derive(Clone)]
pub struct CacheContext {
    backend: Backend,
    default_ttl: Duration,
}

impl CacheContext {
    /// Connect the configured backend
    ///
    /// For Redis this opens the command, publisher and subscriber
    /// connections before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if any Redis connection cannot be established
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        let backend = match config.storage {
            CacheStorage::Memory => Backend::Memory(MemoryStore::new()),
            CacheStorage::Redis(ref redis) => {
                Backend::Redis(RedisStore::connect(redis.url.as_str(), &config.reconnect).await?)
            }
        };

        tracing::info!(backend = backend.name(), ttl = config.default_ttl_seconds, "cache connected");

        Ok(Self {
            backend,
            default_ttl: config.default_ttl(),
        })
    }

    /// In-process cache, used by tests and single-node development
    pub fn in_memory(default_ttl: Duration) -> Self {
        Self {
            backend: Backend::Memory(MemoryStore::new()),
            default_ttl,
        }
    }

    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store a value as JSON, expiring after `ttl` or the default TTL
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key, error = %e, "failed to serialize cache value");
                return;
            }
        };

        let ttl = ttl.unwrap_or(self.default_ttl).max(MIN_TTL);

        if let Err(e) = self.backend.set_ex(key, json, ttl).await {
            tracing::error!(key, error = %e, "cache set failed");
        }
    }

    /// Fetch and deserialize a value
    ///
    /// Returns `None` for a missing key, a backend failure, or a value that
    /// does not deserialize as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key, "cache miss");
                return None;
            }
            Err(e) => {
                tracing::error!(key, error = %e, "cache get failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                tracing::debug!(key, "cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding undeserializable cache value");
                None
            }
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.backend.del(&[key.to_owned()]).await {
            tracing::error!(key, error = %e, "cache delete failed");
        }
    }

    /// Delete every key matching a glob pattern in a single batch
    pub async fn delete_by_pattern(&self, pattern: &str) {
        let keys = match self.backend.keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!(pattern, error = %e, "cache key scan failed");
                return;
            }
        };

        if keys.is_empty() {
            tracing::debug!(pattern, "no keys matched pattern");
            return;
        }

        match self.backend.del(&keys).await {
            Ok(deleted) => tracing::debug!(pattern, deleted, "deleted keys by pattern"),
            Err(e) => tracing::error!(pattern, error = %e, "cache pattern delete failed"),
        }
    }

    /// Publish a JSON message without waiting for subscribers
    pub async fn publish<T: Serialize + ?Sized>(&self, channel: &str, message: &T) {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(channel, error = %e, "failed to serialize pub/sub message");
                return;
            }
        };

        match self.backend.publish(channel, payload).await {
            Ok(receivers) => tracing::trace!(channel, receivers, "message published"),
            Err(e) => tracing::error!(channel, error = %e, "publish failed"),
        }
    }

    /// Invoke `handler` once for every later message on `channel`
    ///
    /// Messages that do not deserialize as `T` are logged and skipped; the
    /// handler stays registered.
    pub async fn subscribe<T, F>(&self, channel: &str, handler: F)
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let name = channel.to_owned();
        let raw: RawHandler = Arc::new(move |payload: &str| match serde_json::from_str::<T>(payload) {
            Ok(message) => handler(message),
            Err(e) => tracing::warn!(channel = %name, error = %e, "failed to deserialize pub/sub message"),
        });

        if let Err(e) = self.backend.subscribe(channel, raw).await {
            tracing::error!(channel, error = %e, "subscribe failed");
        }
    }

    /// Tear down all connections; later calls behave like transport failures
    pub fn close(&self) {
        self.backend.close();
    }
}
