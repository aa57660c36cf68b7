use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::DomainError;

/// Cache key for a loaded artifact.
///
/// Each artifact family has its own prefix so keys from different backends
/// can never alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelKey(String);

impl ModelKey {
    /// Key for a model stored in a directory (primary backend).
    pub fn for_directory(dir: &Path) -> Self {
        Self(format!("dir:{}", dir.display()))
    }

    /// Key for an installed translation package.
    pub fn for_package(package_id: &str) -> Self {
        Self(format!("pkg:{}", package_id))
    }

    /// Key for an offline speech model.
    pub fn for_speech_model(model_name: &str) -> Self {
        Self(format!("speech:{}", model_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Load-count instrumentation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Requests served from an already loaded entry.
    pub hits: u64,
    /// Loader invocations (successful or not).
    pub loads: u64,
    /// Loader invocations that failed.
    pub failures: u64,
}

/// Keyed lazy loader for heavyweight models.
///
/// - A loaded entry is returned without touching the loader again.
/// - Failures are never cached; the next request for the key retries.
/// - At most one load per key runs at a time. Concurrent requests for a key
///   that is being loaded wait for that load and share its result.
/// - With a capacity, the least recently used loaded entry is evicted.
///   Loads in flight are tracked apart from the LRU and never count
///   against the capacity.
pub struct ModelCache<V> {
    entries: Mutex<Entries<V>>,
    hits: AtomicU64,
    loads: AtomicU64,
    failures: AtomicU64,
}

struct Entries<V> {
    loaded: LruCache<ModelKey, V>,
    pending: HashMap<ModelKey, Arc<OnceCell<V>>>,
}

impl<V: Clone> ModelCache<V> {
    /// Cache that keeps every entry for the process lifetime.
    pub fn unbounded() -> Self {
        Self::with_lru(LruCache::unbounded())
    }

    /// Cache holding at most `capacity` entries; 0 means unbounded.
    pub fn bounded(capacity: usize) -> Self {
        match NonZeroUsize::new(capacity) {
            Some(cap) => Self::with_lru(LruCache::new(cap)),
            None => Self::unbounded(),
        }
    }

    fn with_lru(loaded: LruCache<ModelKey, V>) -> Self {
        Self {
            entries: Mutex::new(Entries {
                loaded,
                pending: HashMap::new(),
            }),
            hits: AtomicU64::new(0),
            loads: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Return the entry for `key`, invoking `loader` if it is not loaded yet.
    pub fn get_or_load<F>(&self, key: &ModelKey, loader: F) -> Result<V, DomainError>
    where
        F: FnOnce() -> Result<V, DomainError>,
    {
        let cell = {
            let mut entries = self.entries.lock();
            if let Some(value) = entries.loaded.get(key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Model cache hit");
                return Ok(value.clone());
            }
            Arc::clone(
                entries
                    .pending
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        // The map lock is released here so loads of other keys can proceed.
        let mut loaded_here = false;
        let result = cell.get_or_try_init(|| {
            loaded_here = true;
            self.loads.fetch_add(1, Ordering::Relaxed);
            loader()
        });

        match result {
            Ok(value) => {
                if loaded_here {
                    info!(key = %key, "Model loaded");
                    self.promote(key, &cell, value.clone());
                } else {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                }
                Ok(value.clone())
            }
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %err, "Model load failed");
                self.forget_failed(key, &cell);
                Err(err)
            }
        }
    }

    /// Move a finished load from the pending set into the LRU.
    fn promote(&self, key: &ModelKey, cell: &Arc<OnceCell<V>>, value: V) {
        let mut entries = self.entries.lock();
        if entries
            .pending
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, cell))
        {
            entries.pending.remove(key);
        }
        if let Some((evicted, _)) = entries.loaded.push(key.clone(), value) {
            if &evicted != key {
                debug!(key = %evicted, "Model evicted");
            }
        }
    }

    /// Drop the pending cell of a failed load unless another request is
    /// still waiting on it and will retry.
    fn forget_failed(&self, key: &ModelKey, cell: &Arc<OnceCell<V>>) {
        let mut entries = self.entries.lock();
        let stale = entries.pending.get(key).is_some_and(|current| {
            Arc::ptr_eq(current, cell)
                && current.get().is_none()
                && Arc::strong_count(current) == 2
        });
        if stale {
            entries.pending.remove(key);
        }
    }

    /// Whether `key` has a loaded entry.
    pub fn contains(&self, key: &ModelKey) -> bool {
        self.entries.lock().loaded.contains(key)
    }

    /// Number of loaded entries.
    pub fn len(&self) -> usize {
        self.entries.lock().loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            loads: self.loads.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
