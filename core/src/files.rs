//! Read-through, memoized static file cache.
//!
//! Serves one purpose: map a path below a configured root to its bytes,
//! reading the file from disk at most once per path for the lifetime of
//! the process. No directory listing, no per-file ACL.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::errors::FileError;

pub struct FileCache {
    root: PathBuf,
    entries: RwLock<HashMap<PathBuf, Arc<Vec<u8>>>>,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Read `relative_path` (interpreted relative to the cache root),
    /// serving from cache on repeat requests.
    pub fn read(&self, relative_path: &str) -> Result<Arc<Vec<u8>>, FileError> {
        let key = normalize(relative_path);

        if let Some(bytes) = self.entries.read().expect("cache lock poisoned").get(&key) {
            return Ok(bytes.clone());
        }

        let mut entries = self.entries.write().expect("cache lock poisoned");
        if let Some(bytes) = entries.get(&key) {
            return Ok(bytes.clone());
        }

        let full_path = self.root.join(&key);
        let bytes = std::fs::read(&full_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FileError::NotFound(full_path.display().to_string())
            } else {
                FileError::Io(e)
            }
        })?;
        let bytes = Arc::new(bytes);
        entries.insert(key, bytes.clone());
        Ok(bytes)
    }
}

/// Strips a leading `/` and rejects `..` components so a request path
/// cannot escape the configured root.
fn normalize(path: &str) -> PathBuf {
    let trimmed = path.trim_start_matches('/');
    let trimmed = if trimmed.is_empty() { "index.html" } else { trimmed };
    Path::new(trimmed)
        .components()
        .filter(|c| !matches!(c, std::path::Component::ParentDir))
        .collect()
}
