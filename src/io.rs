//! File helpers for snapshots and configuration documents.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Write `data` to `path`, returning the absolute path written.
pub fn to_file(path: impl AsRef<Path>, data: impl AsRef<[u8]>) -> Result<PathBuf> {
    let path = path.as_ref();
    fs::write(path, data)?;
    Ok(fs::canonicalize(path)?)
}

/// Read the whole file at `path`.
pub fn from_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    Ok(fs::read(path)?)
}
