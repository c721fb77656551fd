//! Persistent TTL cache.
//!
//! The whole store lives in one JSON file shaped as
//! `{ key: { expiration, comment, item } }`. It is read once when the cache is
//! opened and rewritten in full on every `set`; writes happen at most once
//! per location and day so the full rewrite stays cheap.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::CacheError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Epoch milliseconds after which the entry is treated as absent.
    pub expiration: i64,
    /// Human-readable copy of `expiration`.
    pub comment: String,
    pub item: Value,
}

impl CacheEntry {
    fn new(item: Value, expiration: i64) -> Self {
        let comment = Utc
            .timestamp_millis_opt(expiration)
            .single()
            .map(|at| at.to_rfc3339())
            .unwrap_or_default();
        Self {
            expiration,
            comment,
            item,
        }
    }

    pub fn is_live(&self, now_millis: i64) -> bool {
        self.expiration > now_millis
    }
}

pub struct TtlCache {
    path: Option<PathBuf>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl TtlCache {
    /// Loads the store at `path`, dropping entries that have already expired.
    /// A missing, unreadable or corrupt file gives an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::open_at(path, Utc::now().timestamp_millis())
    }

    pub fn open_at(path: impl Into<PathBuf>, now_millis: i64) -> Self {
        let path = path.into();
        let entries = load_entries(&path, now_millis);
        Self {
            path: Some(path),
            entries: Mutex::new(entries),
        }
    }

    /// A cache without a backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_at(key, Utc::now().timestamp_millis())
    }

    /// Expired entries stay in place; only a later load or overwrite removes
    /// them.
    pub fn get_at<T: DeserializeOwned>(&self, key: &str, now_millis: i64) -> Option<T> {
        let item = {
            let entries = self.entries.lock();
            let entry = entries.get(key)?;
            if !entry.is_live(now_millis) {
                debug!(target: "dial_cache", "Entry {key} expired at {}", entry.comment);
                return None;
            }
            entry.item.clone()
        };

        match serde_json::from_value(item) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(target: "dial_cache", "Entry {key} has an unexpected shape: {e}");
                None
            }
        }
    }

    /// Stores `item` and synchronously rewrites the backing file.
    pub fn set<T: Serialize>(
        &self,
        key: &str,
        item: &T,
        expires_at_millis: i64,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry::new(serde_json::to_value(item)?, expires_at_millis);

        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), entry);

        if let Some(path) = &self.path {
            persist(path, &entries)?;
            debug!(target: "dial_cache", "Persisted {} entries to {}", entries.len(), path.display());
        }
        Ok(())
    }
}

fn load_entries(path: &Path, now_millis: i64) -> HashMap<String, CacheEntry> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(target: "dial_cache", "No cache at {}: {e}", path.display());
            return HashMap::new();
        }
    };

    let mut entries: HashMap<String, CacheEntry> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(target: "dial_cache", "Ignoring unreadable cache {}: {e}", path.display());
            return HashMap::new();
        }
    };

    let before = entries.len();
    entries.retain(|_, entry| entry.is_live(now_millis));
    info!(
        target: "dial_cache",
        "Loaded {} cache entries from {} ({} expired)",
        entries.len(),
        path.display(),
        before - entries.len()
    );
    entries
}

fn persist(path: &Path, entries: &HashMap<String, CacheEntry>) -> Result<(), CacheError> {
    let write_err = |source| CacheError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = serde_json::to_string_pretty(entries)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_set_then_get_until_expiry() {
        let cache = TtlCache::in_memory();
        cache.set("k", &"v".to_string(), NOW + 1_000).unwrap();

        assert_eq!(cache.get_at::<String>("k", NOW), Some("v".to_string()));
        assert_eq!(cache.get_at::<String>("k", NOW + 999), Some("v".to_string()));
        // expiry is exclusive
        assert_eq!(cache.get_at::<String>("k", NOW + 1_000), None);
        assert_eq!(cache.get_at::<String>("k", NOW + 5_000), None);
        // a miss does not evict
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let cache = TtlCache::in_memory();
        assert_eq!(cache.get_at::<String>("nope", NOW), None);
    }

    #[test]
    fn test_overwrite_replaces_entry() {
        let cache = TtlCache::in_memory();
        cache.set("k", &1u32, NOW + 10).unwrap();
        cache.set("k", &2u32, NOW + 10).unwrap();
        assert_eq!(cache.get_at::<u32>("k", NOW), Some(2));
    }

    #[test]
    fn test_reload_drops_expired_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        let cache = TtlCache::open_at(&path, NOW);
        cache.set("old", &"stale".to_string(), NOW + 100).unwrap();
        cache.set("new", &"fresh".to_string(), NOW + 10_000).unwrap();

        let reloaded = TtlCache::open_at(&path, NOW + 500);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get_at::<String>("new", NOW + 500), Some("fresh".to_string()));
        assert_eq!(reloaded.get_at::<String>("old", NOW + 50), None);

        // the swept entry is still on disk until the next write
        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("\"old\""));
    }

    #[test]
    fn test_file_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        let cache = TtlCache::open_at(&path, NOW);
        cache.set("lat:1-lon:2-date:2024-06-01", &serde_json::json!({"a": 1}), NOW + 1).unwrap();

        let stored: HashMap<String, Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &stored["lat:1-lon:2-date:2024-06-01"];
        assert_eq!(entry["expiration"], NOW + 1);
        assert!(entry["comment"].as_str().unwrap().starts_with("2023-11-14T"));
        assert_eq!(entry["item"]["a"], 1);
    }

    #[test]
    fn test_corrupt_file_gives_empty_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, "{ not json").unwrap();

        let cache = TtlCache::open_at(&path, NOW);
        assert!(cache.is_empty());

        // and it recovers on the next write
        cache.set("k", &true, NOW + 10).unwrap();
        assert_eq!(TtlCache::open_at(&path, NOW).get_at::<bool>("k", NOW), Some(true));
    }
}
