use thiserror::Error;

/// Cache errors
///
/// Raised by the storage backends. The façade logs them and degrades to
/// cache-miss behaviour; they only escape from `CacheContext::connect`.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Redis connection or command error
    #[error("cache backend: {0}")]
    Backend(String),
    /// The context was closed
    #[error("cache connections are closed")]
    Closed,
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        Self::Backend(e.to_string())
    }
}
