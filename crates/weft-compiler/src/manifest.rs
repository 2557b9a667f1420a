//! Stored class manifest and proxy class loading
//!
//! The manifest lists the cache keys of all classes with a cache entry. It is
//! written once per compile run as a loadable mapping so the class loader can
//! test membership without touching the cache store.

use crate::cache::{cache_key, CacheStore};
use crate::error::ManifestError;
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use weft_model::quote_single;

static ENTRY_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*'((?:[^'\\]|\\.)*)'\s*=>\s*true,\s*$").expect("valid manifest entry pattern")
});

const HEADER: &str = "<?php\n/**\n * Classes with a proxy cache entry. Generated, do not edit.\n */\nreturn array (\n";
const FOOTER: &str = ");";

/// Set of cache keys with a stored proxy class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredClassManifest {
    keys: IndexSet<String>,
}

impl StoredClassManifest {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache key; returns false if it was present already
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Recorded keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Render as loadable mapping of key to `true`
    #[must_use]
    pub fn render(&self) -> String {
        let mut code = String::from(HEADER);
        for key in &self.keys {
            code.push_str(&format!("  {} => true,\n", quote_single(key)));
        }
        code.push_str(FOOTER);
        code
    }

    /// Parse a manifest produced by [`render`](Self::render)
    pub fn load(artifact: &str) -> Result<Self, ManifestError> {
        let body_start = artifact
            .find("return array (")
            .ok_or_else(|| ManifestError::Malformed("missing mapping".to_string()))?;
        let body = artifact[body_start..]
            .trim_end()
            .strip_suffix(FOOTER)
            .ok_or_else(|| ManifestError::Malformed("unterminated mapping".to_string()))?;

        let mut manifest = Self::new();
        for line in body.lines().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let captures = ENTRY_LINE
                .captures(line)
                .ok_or_else(|| ManifestError::Malformed(format!("unexpected line: {line}")))?;
            manifest.insert(unescape(&captures[1]));
        }
        Ok(manifest)
    }
}

fn unescape(quoted: &str) -> String {
    let mut text = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                if escaped != '\\' && escaped != '\'' {
                    text.push('\\');
                }
                text.push(escaped);
            }
        } else {
            text.push(c);
        }
    }
    text
}

/// Resolves proxied classes through a loaded manifest
pub struct ProxyClassLoader {
    manifest: StoredClassManifest,
    cache: Arc<dyn CacheStore>,
}

impl ProxyClassLoader {
    #[must_use]
    pub fn new(manifest: StoredClassManifest, cache: Arc<dyn CacheStore>) -> Self {
        Self { manifest, cache }
    }

    /// Class has a stored proxy
    #[must_use]
    pub fn is_proxied(&self, class_name: &str) -> bool {
        self.manifest.contains(&cache_key(class_name))
    }

    /// Cached code (original plus proxy) of a proxied class
    ///
    /// Classes not listed in the manifest are left to the regular loader,
    /// even if the cache still holds an entry for them.
    #[must_use]
    pub fn load_class_code(&self, class_name: &str) -> Option<String> {
        let key = cache_key(class_name);
        if !self.manifest.contains(&key) {
            return None;
        }
        let code = self.cache.get(&key);
        if code.is_none() {
            tracing::warn!("Proxy class {} is listed but has no cache entry", class_name);
        }
        code
    }
}

impl std::fmt::Debug for ProxyClassLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyClassLoader")
            .field("manifest", &self.manifest)
            .finish_non_exhaustive()
    }
}
