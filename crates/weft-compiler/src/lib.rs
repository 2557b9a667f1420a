//! Weft Proxy Compiler
//!
//! Decides which classes get a proxy, collects their proxy models during
//! weaving and writes the compiled result to the proxy cache.
//!
//! # Core Concepts
//!
//! - [`Compiler`]: Eligibility gate, memoized proxy models, compile run
//! - [`rewrite_original_source`]: Renames the original class next to its proxy
//! - [`CacheStore`]: Key/value contract of the proxy cache ([`MemoryCacheStore`], [`FileCacheStore`])
//! - [`StoredClassManifest`]: Loadable list of classes with a cache entry
//! - [`ProxyClassLoader`]: Serves cached classes listed in the manifest
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use weft_compiler::{ClassRegistry, Compiler, FileCacheStore};
//!
//! let mut compiler = Compiler::new(metadata, Arc::new(FileCacheStore::new("Cache/Proxies")));
//! if let Some(proxy) = compiler.proxy_class("Acme\\Shop\\Cart") {
//!     proxy.method("checkout").add_pre_parent_call_code("        $this->audit();\n");
//! }
//!
//! let compiled = compiler.compile(&registry)?;
//! std::fs::write("Cache/AvailableProxyClasses.php", compiler.stored_class_manifest())?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod cache;
mod compiler;
mod config;
mod error;
mod manifest;
mod registry;
mod rewrite;
mod source;

pub use cache::{cache_key, CacheStore, FileCacheStore, MemoryCacheStore};
pub use compiler::{Compiler, Ineligible};
pub use config::{CompilerConfig, DEFAULT_PROXY_BANNER};
pub use error::{CacheError, CompilerError, CompilerResult, ManifestError, SourceError};
pub use manifest::{ProxyClassLoader, StoredClassManifest};
pub use registry::ClassRegistry;
pub use rewrite::{rename_original_class, rewrite_original_source, strip_final_from_overridden_methods};
pub use source::{FsSourceReader, SourceReader};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
