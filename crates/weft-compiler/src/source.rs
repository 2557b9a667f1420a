//! Access to original class sources

use crate::error::SourceError;
use std::fs;
use std::path::Path;

/// Reads the source text declaring a class
pub trait SourceReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<String, SourceError>;
}

/// Reads sources from the filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSourceReader;

impl SourceReader for FsSourceReader {
    fn read(&self, path: &Path) -> Result<String, SourceError> {
        fs::read_to_string(path).map_err(|e| SourceError::io_error(path, e))
    }
}
