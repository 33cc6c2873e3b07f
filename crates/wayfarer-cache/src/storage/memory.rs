use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::error::CacheError;
use crate::subscriptions::{RawHandler, Subscriptions};

/// In-process store with expiring entries and synchronous fan-out
///
/// Single instance only: nothing is shared across processes.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: DashMap<String, Entry>,
    subscriptions: Subscriptions,
    closed: AtomicBool,
}

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<(), CacheError> {
        if self.inner.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.ensure_open()?;

        let now = Instant::now();
        let value = self
            .inner
            .entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone());

        if value.is_none() {
            self.inner.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }

        Ok(value)
    }

    pub fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.ensure_open()?;

        self.inner.entries.insert(
            key.to_owned(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    pub fn del(&self, keys: &[String]) -> Result<usize, CacheError> {
        self.ensure_open()?;

        Ok(keys.iter().filter(|key| self.inner.entries.remove(key.as_str()).is_some()).count())
    }

    /// Live keys matching a glob pattern
    pub fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        self.ensure_open()?;

        let now = Instant::now();
        Ok(self
            .inner
            .entries
            .iter()
            .filter(|entry| entry.value().is_live(now) && fast_glob::glob_match(pattern, entry.key().as_str()))
            .map(|entry| entry.key().clone())
            .collect())
    }

    /// Deliver to the handlers registered at publish time
    pub fn publish(&self, channel: &str, payload: &str) -> Result<usize, CacheError> {
        self.ensure_open()?;

        Ok(self.inner.subscriptions.dispatch(channel, payload))
    }

    pub fn subscribe(&self, channel: &str, handler: RawHandler) -> Result<(), CacheError> {
        self.ensure_open()?;

        self.inner.subscriptions.register(channel, handler);
        Ok(())
    }

    /// Drop all entries and handlers; later calls fail with `Closed`
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            self.inner.entries.clear();
            self.inner.subscriptions.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire() {
        let store = MemoryStore::new();
        store.set_ex("trip:1", "{}".to_owned(), Duration::ZERO).unwrap();
        store.set_ex("trip:2", "{}".to_owned(), Duration::from_secs(60)).unwrap();

        assert_eq!(store.get("trip:1").unwrap(), None);
        assert_eq!(store.get("trip:2").unwrap().as_deref(), Some("{}"));
        assert_eq!(store.keys("trip:*").unwrap(), ["trip:2"]);
    }

    #[test]
    fn keys_match_glob_patterns() {
        let store = MemoryStore::new();
        for key in ["trip:1", "trip:22", "user:1"] {
            store.set_ex(key, "1".to_owned(), Duration::from_secs(60)).unwrap();
        }

        let mut trips = store.keys("trip:*").unwrap();
        trips.sort();
        assert_eq!(trips, ["trip:1", "trip:22"]);
        assert_eq!(store.keys("trip:?").unwrap(), ["trip:1"]);
        assert!(store.keys("flight:*").unwrap().is_empty());
    }

    #[test]
    fn del_counts_removed_keys() {
        let store = MemoryStore::new();
        store.set_ex("a", "1".to_owned(), Duration::from_secs(60)).unwrap();

        assert_eq!(store.del(&["a".to_owned(), "missing".to_owned()]).unwrap(), 1);
    }

    #[test]
    fn close_is_idempotent_and_rejects_later_calls() {
        let store = MemoryStore::new();
        store.set_ex("a", "1".to_owned(), Duration::from_secs(60)).unwrap();

        store.close();
        store.close();

        assert!(matches!(store.get("a"), Err(CacheError::Closed)));
        assert!(matches!(store.publish("chat:1", "{}"), Err(CacheError::Closed)));
    }
}
