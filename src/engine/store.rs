// On-disk cache store — maps cache keys to fully materialized files.
// Downloads land in a temp file first and are renamed into place, so a path
// returned from lookup is never a partial write.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{CACHE_FILE_EXTENSION, MAX_CACHE_FILENAME_LEN, TEMP_FILE_SUFFIX};
use crate::error::LoadError;

pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, LoadError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            LoadError::cache_write(format!("cannot create cache dir {}", root.display()), e)
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a complete file is published under `key`.
    pub fn exists(&self, key: &str) -> bool {
        self.target_path(key).is_file()
    }

    /// Path of the published file for `key`, if present. Temp files in
    /// progress are invisible here: they use a different name entirely.
    pub fn lookup(&self, key: &str) -> Option<PathBuf> {
        let path = self.target_path(key);
        if path.is_file() {
            Some(path)
        } else {
            None
        }
    }

    /// The path a published entry for `key` lives at (whether or not it
    /// exists yet).
    pub fn target_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}{}", sanitize_key(key), CACHE_FILE_EXTENSION))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.root.join(format!(
            "{}{}{}",
            sanitize_key(key),
            TEMP_FILE_SUFFIX,
            CACHE_FILE_EXTENSION
        ))
    }

    /// Write `bytes` under `key`: temp file first, then an atomic rename
    /// into the published name. Returns the published path.
    ///
    /// Concurrent publish of the same key is last-writer-wins; the registry
    /// already prevents concurrent fetches of one key in normal operation.
    pub async fn write_and_publish(&self, key: &str, bytes: &[u8]) -> Result<PathBuf, LoadError> {
        let temp = self.temp_path(key);
        let target = self.target_path(key);

        tokio::fs::write(&temp, bytes).await.map_err(|e| {
            LoadError::cache_write(format!("cannot write temp file {}", temp.display()), e)
        })?;

        tokio::fs::rename(&temp, &target).await.map_err(|e| {
            // Don't leave the orphaned temp file behind.
            let _ = fs::remove_file(&temp);
            LoadError::cache_write(
                format!("cannot publish {} -> {}", temp.display(), target.display()),
                e,
            )
        })?;

        debug!(
            "published {} bytes for key {} at {}",
            bytes.len(),
            key,
            target.display()
        );
        Ok(target)
    }

    /// Delete every published and temp cache file under the root.
    pub fn clear(&self) -> Result<(), LoadError> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            LoadError::cache_write(format!("cannot read cache dir {}", self.root.display()), e)
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_cache_file = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(CACHE_FILE_EXTENSION));
            if is_cache_file {
                if let Err(e) = fs::remove_file(&path) {
                    warn!("failed to remove cache file {}: {}", path.display(), e);
                }
            }
        }
        Ok(())
    }
}

/// Map a cache key to a filesystem-safe filename stem. Anything outside
/// `[A-Za-z0-9._-]` becomes `_`, and the stem is capped to stay well under
/// OS filename limits. An over-long stem is truncated and suffixed with a
/// hash of the full key, so keys sharing a long prefix still get distinct
/// files.
fn sanitize_key(key: &str) -> String {
    let mut stem: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.len() > MAX_CACHE_FILENAME_LEN {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let digest = format!("{:016x}", hasher.finish());
        stem.truncate(MAX_CACHE_FILENAME_LEN - digest.len() - 1);
        stem.push('_');
        stem.push_str(&digest);
    }
    stem
}
