//! Memoization of reader and builder outputs with a staleness window.
//!
//! Entries are keyed by source identity (kind + location). The source
//! version lives in the entry, so a rewritten file replaces its old entry
//! instead of adding another. Each entry holds an immutable `Arc` of the
//! loaded value. On expiry or a version change the next access reloads
//! and *replaces* the entry; a caller holding the old `Arc` keeps a
//! complete old value, never a half-updated one.
//!
//! The cache is an ordinary value handed to whoever needs memoized reads.
//! There is no process global.
//!
//! # Clock injection
//! `get_or_load_at` takes `now: DateTime<Utc>` rather than calling
//! `Utc::now()` internally, so expiry is deterministic in tests.

use std::any::Any;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

use crate::ingest::transport::is_remote;
use crate::logging::{self, SourceKind};

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Identity of a cached value: the slot (`kind:location`) plus an
/// optional version of the content behind it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    slot: String,
    version: Option<String>,
}

impl CacheKey {
    pub fn new(kind: &str, location: &str) -> Self {
        CacheKey {
            slot: format!("{}:{}", kind, location),
            version: None,
        }
    }

    /// Key for a source location, versioned by the file's modification
    /// time when it is a readable local file. Rewriting the file therefore
    /// forces a reload even inside the TTL window.
    pub fn for_source(kind: &str, location: &str) -> Self {
        let key = CacheKey::new(kind, location);
        match local_version(location) {
            Some(version) => key.with_version(&version),
            None => key,
        }
    }

    pub fn with_version(self, version: &str) -> Self {
        CacheKey {
            version: Some(version.to_string()),
            ..self
        }
    }

    /// The slot this key occupies; keys differing only by version share it.
    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.slot, version),
            None => write!(f, "{}", self.slot),
        }
    }
}

fn local_version(location: &str) -> Option<String> {
    if location.trim().is_empty() || is_remote(location) {
        return None;
    }
    let modified = std::fs::metadata(Path::new(location)).ok()?.modified().ok()?;
    let modified: DateTime<Utc> = modified.into();
    Some(modified.to_rfc3339())
}

// ---------------------------------------------------------------------------
// Staleness
// ---------------------------------------------------------------------------

/// Returns `true` if an entry loaded at `loaded_at` is older than `ttl`
/// relative to `now`.
///
/// Expiry is strictly greater than the window:
///   age > ttl   →  expired
///   age == ttl  →  still fresh
pub fn is_expired(loaded_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    now - loaded_at > ttl
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    version: Option<String>,
    loaded_at: DateTime<Utc>,
}

/// One entry per slot, whatever its version.
#[derive(Default)]
pub struct SourceCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, loading it with `loader` when
    /// absent, expired or held under a different version.
    pub fn get_or_load<T, F>(&self, key: &CacheKey, ttl: Duration, loader: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        self.get_or_load_at(key, ttl, Utc::now(), loader)
    }

    /// `get_or_load` with an explicit clock.
    pub fn get_or_load_at<T, F>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        now: DateTime<Utc>,
        loader: F,
    ) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let label = key.to_string();
        if let Some(hit) = self.fresh_entry::<T>(key, ttl, now) {
            logging::debug(SourceKind::Cache, Some(&label), "cache hit");
            return hit;
        }

        // Loaders are idempotent, so two callers racing on a miss may both
        // load; the later insert simply replaces the earlier one.
        logging::debug(SourceKind::Cache, Some(&label), "cache miss, loading");
        let value = Arc::new(loader());
        let stored: Arc<dyn Any + Send + Sync> = value.clone();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.slot.clone(),
            CacheEntry {
                value: stored,
                version: key.version.clone(),
                loaded_at: now,
            },
        );
        value
    }

    fn fresh_entry<T: Any + Send + Sync>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Option<Arc<T>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(&key.slot)?;
        if entry.version != key.version || is_expired(entry.loaded_at, ttl, now) {
            return None;
        }
        entry.value.clone().downcast::<T>().ok()
    }

    /// Drops the entry in `key`'s slot, whatever version it holds.
    pub fn invalidate(&self, key: &CacheKey) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key.slot);
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::cell::Cell;

    /// A fixed "now" used across all tests: 2024-05-01 13:00:00 UTC.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 13, 0, 0).unwrap()
    }

    #[test]
    fn test_entry_exactly_at_ttl_is_not_expired() {
        let loaded = fixed_now() - Duration::minutes(60);
        assert!(!is_expired(loaded, Duration::minutes(60), fixed_now()));
        assert!(is_expired(loaded - Duration::seconds(1), Duration::minutes(60), fixed_now()));
    }

    #[test]
    fn test_second_access_within_ttl_is_memoized() {
        let cache = SourceCache::new();
        let key = CacheKey::new("cs", "data/a.csv");
        let loads = Cell::new(0);

        let first = cache.get_or_load_at(&key, Duration::hours(1), fixed_now(), || {
            loads.set(loads.get() + 1);
            vec![1u64, 2, 3]
        });
        let second = cache.get_or_load_at(&key, Duration::hours(1), fixed_now() + Duration::minutes(59), || {
            loads.set(loads.get() + 1);
            vec![9u64]
        });

        assert_eq!(loads.get(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_expired_entry_is_replaced_not_mutated() {
        let cache = SourceCache::new();
        let key = CacheKey::new("cs", "data/a.csv");

        let old = cache.get_or_load_at(&key, Duration::hours(1), fixed_now(), || "old".to_string());
        let new = cache.get_or_load_at(&key, Duration::hours(1), fixed_now() + Duration::hours(2), || {
            "new".to_string()
        });

        assert_eq!(*old, "old", "a caller's existing handle must keep the old value");
        assert_eq!(*new, "new");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_type_mismatch_reloads() {
        let cache = SourceCache::new();
        let key = CacheKey::new("x", "y");
        let _ = cache.get_or_load_at(&key, Duration::hours(1), fixed_now(), || 5u32);
        let s = cache.get_or_load_at(&key, Duration::hours(1), fixed_now(), || "five".to_string());
        assert_eq!(*s, "five");
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = SourceCache::new();
        let a = CacheKey::new("cs", "a");
        let b = CacheKey::new("cs", "b");
        cache.get_or_load_at(&a, Duration::hours(1), fixed_now(), || 1u8);
        cache.get_or_load_at(&b, Duration::hours(1), fixed_now(), || 2u8);
        cache.invalidate(&a);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_versioned_keys_differ() {
        let base = CacheKey::new("grid", "data/CO_UTM2.geojson");
        assert_ne!(base.clone().with_version("v1"), base.clone().with_version("v2"));
        // unreadable files carry no version
        assert_eq!(
            CacheKey::for_source("grid", "/no/such/file"),
            CacheKey::new("grid", "/no/such/file")
        );
        let v1 = base.clone().with_version("v1");
        assert_eq!(v1.slot(), base.slot());
        assert_eq!(v1.version(), Some("v1"));
        assert_eq!(v1.to_string(), "grid:data/CO_UTM2.geojson@v1");
    }

    #[test]
    fn test_new_version_replaces_entry_in_same_slot() {
        let cache = SourceCache::new();
        let base = CacheKey::new("cs", "data/a.csv");
        let loads = Cell::new(0);

        for (i, version) in ["v1", "v2", "v3"].iter().enumerate() {
            let key = base.clone().with_version(version);
            let value = cache.get_or_load_at(&key, Duration::hours(1), fixed_now(), || {
                loads.set(loads.get() + 1);
                i
            });
            assert_eq!(*value, i, "a rewritten source must reload inside the TTL");
            assert_eq!(cache.len(), 1);
        }
        assert_eq!(loads.get(), 3);

        // the current version is still memoized
        let key = base.with_version("v3");
        let again = cache.get_or_load_at(&key, Duration::hours(1), fixed_now(), || 99usize);
        assert_eq!(*again, 2);
        assert_eq!(loads.get(), 3);
    }
}
