//! Memoized workspace file listing.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::enumerate::FileEnumerator;
use crate::error::SearchResult;
use crate::tool::ToolDetector;

/// Cached listing for one workspace root.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The root the listing was taken from.
    pub root: PathBuf,

    /// Workspace-relative file paths.
    pub files: Arc<Vec<String>>,

    /// When the listing was taken.
    pub updated_at: Instant,
}

/// Holds the file list of the most recently enumerated workspace root.
///
/// Asking for another root replaces the entry. There is no expiry: the host
/// decides when a re-scan is due and calls [`FileCache::clear`].
#[derive(Debug, Default)]
pub struct FileCache {
    entry: Option<CacheEntry>,

    /// Statistics: cache hits.
    hits: AtomicU64,

    /// Statistics: cache misses.
    misses: AtomicU64,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the cached listing if it belongs to `root`.
    pub fn get(&self, root: &Path) -> Option<Arc<Vec<String>>> {
        match &self.entry {
            Some(entry) if entry.root == root => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(&entry.files))
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores the listing for `root`, replacing any other root's listing.
    pub fn insert(&mut self, root: PathBuf, files: Vec<String>) -> Arc<Vec<String>> {
        let files = Arc::new(files);
        self.entry = Some(CacheEntry {
            root,
            files: Arc::clone(&files),
            updated_at: Instant::now(),
        });
        files
    }

    /// Returns the listing for `root`, enumerating on a miss.
    pub async fn get_all_files(
        &mut self,
        root: &Path,
        detector: &ToolDetector,
        enumerator: &FileEnumerator,
    ) -> SearchResult<Arc<Vec<String>>> {
        if let Some(files) = self.get(root) {
            return Ok(files);
        }

        let tool = detector.detect();
        let files = enumerator.enumerate(tool, root).await?;
        Ok(self.insert(root.to_path_buf(), files))
    }

    /// Drops the cached listing.
    pub fn clear(&mut self) {
        self.entry = None;
    }

    /// The current entry, if any.
    pub fn entry(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        CacheStats {
            files: self.entry.as_ref().map_or(0, |e| e.files.len()),
            hits,
            misses,
            hit_rate: if hits + misses > 0 {
                hits as f64 / (hits + misses) as f64
            } else {
                0.0
            },
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of files in the cached listing.
    pub files: usize,

    /// Number of cache hits.
    pub hits: u64,

    /// Number of cache misses.
    pub misses: u64,

    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}
