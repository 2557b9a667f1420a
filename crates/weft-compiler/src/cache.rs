//! Proxy cache stores
//!
//! Compiled proxy code is stored under the normalized class name (see
//! [`cache_key`]). [`MemoryCacheStore`] keeps entries in a moka cache,
//! [`FileCacheStore`] writes one file per entry.

use crate::error::CacheError;
use moka::sync::Cache;
use std::fs;
use std::path::{Path, PathBuf};

/// Normalized cache key of a class: namespace separators become `_`
#[must_use]
pub fn cache_key(class_name: &str) -> String {
    class_name.trim_start_matches('\\').replace('\\', "_")
}

/// Key/value store for compiled proxy code
#[cfg_attr(test, mockall::automock)]
pub trait CacheStore: Send + Sync {
    /// Entry exists
    fn has(&self, key: &str) -> bool;

    /// Stored code of an entry
    fn get(&self, key: &str) -> Option<String>;

    /// Store code, replacing an existing entry
    fn set(&self, key: &str, code: &str) -> Result<(), CacheError>;
}

/// In-memory cache store
#[derive(Debug, Clone)]
pub struct MemoryCacheStore {
    inner: Cache<String, String>,
}

impl MemoryCacheStore {
    /// Create unbounded store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Cache::builder().build(),
        }
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    /// Remove all entries
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore for MemoryCacheStore {
    fn has(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, code: &str) -> Result<(), CacheError> {
        self.inner.insert(key.to_string(), code.to_string());
        Ok(())
    }
}

/// Cache store writing `<key>.php` files into a directory
#[derive(Debug, Clone)]
pub struct FileCacheStore {
    directory: PathBuf,
}

impl FileCacheStore {
    /// Create store; the directory is created on first write
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    #[inline]
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.php"))
    }
}

impl CacheStore for FileCacheStore {
    fn has(&self, key: &str) -> bool {
        self.entry_path(key).is_file()
    }

    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(key)).ok()
    }

    fn set(&self, key: &str, code: &str) -> Result<(), CacheError> {
        fs::create_dir_all(&self.directory).map_err(|e| CacheError::io_error(key, e))?;
        fs::write(self.entry_path(key), code).map_err(|e| CacheError::io_error(key, e))
    }
}
