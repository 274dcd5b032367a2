// Local cache - TTL entries on top of client storage
use crate::application::client_store::ClientStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CACHE_PREFIX: &str = "neocare360_cache_";
pub const DEFAULT_TTL: Duration = Duration::from_millis(300_000);

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualClock(std::sync::atomic::AtomicI64);

#[cfg(test)]
impl ManualClock {
    pub fn at(ms: i64) -> Self {
        Self(std::sync::atomic::AtomicI64::new(ms))
    }

    pub fn advance(&self, by: Duration) {
        self.0
            .fetch_add(by.as_millis() as i64, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    payload: Value,
    stored_at: i64,
    /// milliseconds
    ttl: u64,
}

impl CacheEntry {
    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.stored_at) > self.ttl as i64
    }
}

#[derive(Clone)]
pub struct LocalCache {
    store: Arc<dyn ClientStore>,
    clock: Arc<dyn Clock>,
    prefix: String,
    default_ttl: Duration,
}

impl LocalCache {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            prefix: DEFAULT_CACHE_PREFIX.to_string(),
            default_ttl: DEFAULT_TTL,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    fn storage_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Store `payload` under `key` for the default TTL.
    pub fn cache_data<T: Serialize>(&self, key: &str, payload: &T) {
        self.cache_data_for(key, payload, self.default_ttl);
    }

    pub fn cache_data_for<T: Serialize>(&self, key: &str, payload: &T, ttl: Duration) {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, "Cannot serialize cache payload: {}", e);
                return;
            }
        };

        let entry = CacheEntry {
            payload,
            stored_at: self.clock.now_ms(),
            ttl: ttl.as_millis() as u64,
        };

        let serialized = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(key, "Cannot serialize cache entry: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.set_item(&self.storage_key(key), &serialized) {
            tracing::warn!(key, "Cache write failed: {}", e);
        }
    }

    /// Fetch a live entry. Absent, malformed and expired entries are all a miss;
    /// expired ones are evicted on the way out.
    pub fn get_cached_data<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let storage_key = self.storage_key(key);
        let raw = self.store.get_item(&storage_key)?;

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(key, "Ignoring malformed cache entry: {}", e);
                return None;
            }
        };

        if entry.is_expired(self.clock.now_ms()) {
            tracing::debug!(key, "Cache entry expired");
            self.store.remove_item(&storage_key);
            return None;
        }

        serde_json::from_value(entry.payload).ok()
    }

    pub fn invalidate(&self, key: &str) {
        self.store.remove_item(&self.storage_key(key));
    }
}
