//! Read-through JSON cache keyed by experiment id
//!
//! One JSON document per key, stored as `<prefix><key>.json` under a cache
//! directory. An entry that exists is returned as-is: there is no TTL and no
//! freshness check, so re-running an analysis against the same cache always
//! sees the same data. Delete the file to force a refetch.

use crate::error::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Prefix of detailed-result cache files
pub const RESULT_PREFIX: &str = "result_";

/// Directory-backed key-value store of JSON documents
#[derive(Debug, Clone)]
pub struct JsonCache {
    root: PathBuf,
    prefix: String,
}

impl JsonCache {
    /// Create a cache rooted at `root` whose files are named `<prefix><key>.json`
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
        }
    }

    /// Cache of raw batch lists, `<experiment_id>.json`
    pub fn batches(root: impl Into<PathBuf>) -> Self {
        Self::new(root, "")
    }

    /// Cache of detailed results, `result_<experiment_id>.json`
    pub fn results(root: impl Into<PathBuf>) -> Self {
        Self::new(root, RESULT_PREFIX)
    }

    /// Get a cached value, `None` if no entry exists
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let cache_file = self.path_for(key)?;

        if !cache_file.is_file() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&cache_file)?;
        let value = serde_json::from_str(&contents)?;
        debug!("Cache hit: {}", cache_file.display());

        Ok(Some(value))
    }

    /// Store a value, replacing any existing entry
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(&self.root)?;

        let cache_file = self.path_for(key)?;
        let json = serde_json::to_string(value)?;

        // Write atomically
        let temp_file = cache_file.with_extension("json.tmp");
        fs::write(&temp_file, json)?;
        fs::rename(temp_file, &cache_file)?;
        debug!("Cache write: {}", cache_file.display());

        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.path_for(key).is_ok_and(|path| path.is_file())
    }

    /// Get the cache file path for a key
    ///
    /// Keys map to file names one to one; a key that is not a plain file
    /// name is rejected rather than rewritten.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let invalid = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0']);
        if invalid {
            return Err(Error::InvalidCacheKey(key.to_string()));
        }

        Ok(self.root.join(format!("{}{key}.json", self.prefix)))
    }
}
