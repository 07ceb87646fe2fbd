// Cache store for timestamped JSON payloads.
// Wraps a storage backend; every failure is logged and treated as a cache miss.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::warn;

use super::storage::Storage;

/// Default TTL for the repository list: 1 hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Storage key for the filtered repository list.
pub const REPOSITORIES_KEY: &str = "github_portfolio_data_v2";

/// Wrapper for cached data with the time it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// The cached data.
    pub data: T,
}

impl<T> CacheEntry<T> {
    /// Create an entry stamped with the current time.
    pub fn new(data: T) -> Self {
        Self::at(data, Utc::now())
    }

    pub fn at(data: T, stored_at: DateTime<Utc>) -> Self {
        Self {
            timestamp: stored_at.timestamp_millis(),
            data,
        }
    }

    /// Whether the entry is younger than `ttl` at `now`.
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let age_ms = now.timestamp_millis().saturating_sub(self.timestamp);
        if age_ms < 0 {
            return true;
        }
        (age_ms as u128) < ttl.as_millis()
    }
}

/// Typed access to a storage backend.
pub struct CacheStore {
    storage: Box<dyn Storage>,
}

impl CacheStore {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Read an entry. Missing, unreadable and unparseable entries are all `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(key, error = %e, "discarding unparseable cache entry");
                None
            }
        }
    }

    /// Store `data` stamped with the current time. Failures are logged, never retried.
    pub fn set<T: Serialize>(&self, key: &str, data: &T) {
        self.put(key, &CacheEntry::new(data));
    }

    /// Store a prepared entry.
    pub fn put<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) {
        let json = match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "cache entry not serializable");
                return;
            }
        };

        if let Err(e) = self.storage.set_item(key, &json) {
            warn!(key, error = %e, "cache write failed");
        }
    }

    /// Drop an entry.
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.storage.remove_item(key) {
            warn!(key, error = %e, "cache remove failed");
        }
    }
}
