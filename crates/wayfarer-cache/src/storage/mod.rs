pub mod memory;
pub mod redis;

use std::time::Duration;

use crate::error::CacheError;
use crate::subscriptions::RawHandler;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Storage backend behind the façade
#[derive(Clone)]
pub(crate) enum Backend {
    Memory(MemoryStore),
    Redis(RedisStore),
}

impl Backend {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Redis(_) => "redis",
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self {
            Self::Memory(m) => m.get(key),
            Self::Redis(r) => r.get(key).await,
        }
    }

    pub async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        match self {
            Self::Memory(m) => m.set_ex(key, value, ttl),
            Self::Redis(r) => r.set_ex(key, value, ttl).await,
        }
    }

    pub async fn del(&self, keys: &[String]) -> Result<usize, CacheError> {
        match self {
            Self::Memory(m) => m.del(keys),
            Self::Redis(r) => r.del(keys).await,
        }
    }

    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        match self {
            Self::Memory(m) => m.keys(pattern),
            Self::Redis(r) => r.keys(pattern).await,
        }
    }

    pub async fn publish(&self, channel: &str, payload: String) -> Result<usize, CacheError> {
        match self {
            Self::Memory(m) => m.publish(channel, &payload),
            Self::Redis(r) => r.publish(channel, payload).await,
        }
    }

    pub async fn subscribe(&self, channel: &str, handler: RawHandler) -> Result<(), CacheError> {
        match self {
            Self::Memory(m) => m.subscribe(channel, handler),
            Self::Redis(r) => r.subscribe(channel, handler).await,
        }
    }

    pub fn close(&self) {
        match self {
            Self::Memory(m) => m.close(),
            Self::Redis(r) => r.close(),
        }
    }
}
