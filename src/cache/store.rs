// TTL cache store for reading and writing cached data.
// Handles JSON serialization, TTL checking, and eviction of expired entries.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::CacheError;

use super::backend::{CacheBackend, MemoryBackend};
use super::paths::sanitize_name;

/// Default TTL for the repository feed: 1 hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Prefix applied to every key this crate writes, so `clear_all` leaves
/// foreign entries in a shared store alone.
pub const KEY_PREFIX: &str = "repofeed_";

/// Wrapper for cached data with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached data.
    pub payload: T,
    /// When the data was fetched.
    pub fetched_at: DateTime<Utc>,
    /// How long the data stays valid.
    #[serde(with = "crate::config::duration_millis")]
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// Create an entry fetched now.
    pub fn new(payload: T, ttl: Duration) -> Self {
        Self {
            payload,
            fetched_at: Utc::now(),
            ttl,
        }
    }

    /// Valid iff `now - fetched_at < ttl`. Entries stamped in the future count
    /// as just fetched.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now
            .signed_duration_since(self.fetched_at)
            .to_std()
            .unwrap_or(Duration::ZERO);

        elapsed < self.ttl
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Check if this cached data has expired.
    pub fn is_expired(&self) -> bool {
        !self.is_valid()
    }
}

/// Result of looking a key up, before validity is collapsed to present/absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Fresh(T),
    /// The entry was expired and has been evicted; its payload is returned once.
    Expired(T),
    Missing,
}

impl<T> Lookup<T> {
    pub fn fresh(self) -> Option<T> {
        match self {
            Lookup::Fresh(value) => Some(value),
            _ => None,
        }
    }
}

/// Key-value cache with per-entry TTL over a pluggable backend.
#[derive(Clone)]
pub struct TtlCache {
    backend: Arc<dyn CacheBackend>,
}

impl TtlCache {
    pub fn new(backend: impl CacheBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Cache backed by process memory only.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Read the raw entry under `key` without checking or evicting it.
    pub fn get_entry<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<CacheEntry<T>>, CacheError> {
        match self.backend.read(&storage_key(key))? {
            Some(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            None => Ok(None),
        }
    }

    /// Store a prepared entry as-is.
    pub fn put_entry<T: Serialize>(&self, key: &str, entry: &CacheEntry<T>) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(entry)?;
        self.backend.write(&storage_key(key), &json)
    }

    /// Look `key` up, evicting it if expired.
    ///
    /// An entry that no longer deserializes as `T` is evicted and reported
    /// missing.
    pub fn lookup<T: DeserializeOwned>(&self, key: &str) -> Result<Lookup<T>, CacheError> {
        let entry = match self.get_entry::<T>(key) {
            Ok(Some(entry)) => entry,
            Ok(None) => return Ok(Lookup::Missing),
            Err(CacheError::Json(e)) => {
                debug!("Discarding unreadable cache entry {}: {}", key, e);
                self.clear(key)?;
                return Ok(Lookup::Missing);
            }
            Err(e) => return Err(e),
        };

        if entry.is_valid() {
            Ok(Lookup::Fresh(entry.payload))
        } else {
            debug!("Cache entry {} expired at {}", key, entry.fetched_at);
            self.clear(key)?;
            Ok(Lookup::Expired(entry.payload))
        }
    }

    /// Cached value for `key`, if present and not expired.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        self.lookup(key).map(Lookup::fresh)
    }

    /// Store `value` under `key`, fetched now, valid for `ttl`.
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError> {
        self.put_entry(key, &CacheEntry::new(value, ttl))
    }

    /// Remove the entry under `key`.
    pub fn clear(&self, key: &str) -> Result<(), CacheError> {
        self.backend.remove(&storage_key(key))
    }

    /// Remove every entry this crate owns in the backend.
    pub fn clear_all(&self) -> Result<(), CacheError> {
        let prefix = sanitize_name(KEY_PREFIX);
        for key in self.backend.keys()? {
            if key.starts_with(&prefix) {
                self.backend.remove(&key)?;
            }
        }
        Ok(())
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn storage_key(key: &str) -> String {
    format!("{}{}", KEY_PREFIX, key)
}
