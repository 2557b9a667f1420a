//! Error types for the proxy compiler
//!
//! - [`CacheError`]: proxy cache writes
//! - [`SourceError`]: reading original class sources
//! - [`ManifestError`]: loading the stored class manifest
//! - [`CompilerError`]: anything aborting a compile run

use std::path::PathBuf;
use weft_model::BuildError;

/// Errors of a cache store
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// IO error while writing or reading an entry
    #[error("io error on cache entry {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    /// Create IO error for a cache key
    pub fn io_error(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            key: key.into(),
            source,
        }
    }
}

/// Errors reading original sources
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata does not know where the class is declared
    #[error("no source path known for class {class_name}")]
    MissingSourcePath { class_name: String },
}

impl SourceError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Stored class manifest could not be read
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("malformed stored class manifest: {0}")]
    Malformed(String),
}

/// Errors aborting a compile run
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),
}

/// Result type alias for compiler operations
pub type CompilerResult<T> = Result<T, CompilerError>;
