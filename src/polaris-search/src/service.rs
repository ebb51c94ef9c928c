//! The operations a search panel calls.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::cache::FileCache;
use crate::config::SearchConfig;
use crate::content::ContentSearchEngine;
use crate::enumerate::FileEnumerator;
use crate::error::{SearchError, SearchResult};
use crate::host::{LocalFs, WorkspaceFs};
use crate::matcher::FuzzyMatcher;
use crate::preview::{FilePreview, read_preview};
use crate::replace::ReplaceCoordinator;
use crate::result::{
    ContentMatch, FileMatch, MatchOptions, ReplaceOutcome, ReplacementOp, SearchQuery,
    SearchSnapshot,
};
use crate::tool::{SearchTool, ToolDetector};

/// Search and replace over one workspace.
///
/// Remembers the last content search so replacements can be checked against
/// it, and refreshes it after every replace.
pub struct SearchService {
    config: SearchConfig,
    detector: ToolDetector,
    enumerator: FileEnumerator,
    cache: tokio::sync::Mutex<FileCache>,
    matcher: Mutex<FuzzyMatcher>,
    engine: Arc<ContentSearchEngine>,
    replacer: ReplaceCoordinator,
    fs: Arc<dyn WorkspaceFs>,
    snapshot: Mutex<Option<SearchSnapshot>>,
    search_generation: AtomicU64,
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("root", &self.config.root)
            .field("detector", &self.detector)
            .finish_non_exhaustive()
    }
}

impl SearchService {
    /// Creates a service working directly on the filesystem.
    pub fn new(config: SearchConfig) -> Self {
        Self::with_fs(config, Arc::new(LocalFs))
    }

    /// Creates a service whose file access goes through `fs`.
    pub fn with_fs(config: SearchConfig, fs: Arc<dyn WorkspaceFs>) -> Self {
        let detector = ToolDetector::new(&config);
        let enumerator = FileEnumerator::new(&config);
        let engine = ContentSearchEngine::new(&config);
        Self::with_components(config, detector, enumerator, engine, fs)
    }

    /// Assembles a service from explicitly constructed parts.
    pub fn with_components(
        config: SearchConfig,
        detector: ToolDetector,
        enumerator: FileEnumerator,
        engine: ContentSearchEngine,
        fs: Arc<dyn WorkspaceFs>,
    ) -> Self {
        let engine = Arc::new(engine);
        let replacer =
            ReplaceCoordinator::new(Arc::clone(&engine), Arc::clone(&fs), &config.root);
        Self {
            matcher: Mutex::new(FuzzyMatcher::with_limit(config.file_result_limit)),
            config,
            detector,
            enumerator,
            cache: tokio::sync::Mutex::new(FileCache::new()),
            engine,
            replacer,
            fs,
            snapshot: Mutex::new(None),
            search_generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// A query for `text` carrying the configured result cap.
    pub fn query(&self, text: impl Into<String>) -> SearchQuery {
        SearchQuery::new(text).max_results(self.config.max_results)
    }

    /// Ranks the workspace's files against `query`.
    pub async fn find_files(
        &self,
        query: &str,
        options: MatchOptions,
    ) -> SearchResult<Vec<FileMatch>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let files = self
            .cache
            .lock()
            .await
            .get_all_files(self.root(), &self.detector, &self.enumerator)
            .await?;

        let matches = self.matcher.lock().find_files(query, &files, options);
        tracing::debug!(
            "'{}' matched {} of {} files",
            query,
            matches.len(),
            files.len()
        );
        Ok(matches)
    }

    /// Searches file contents and records the outcome for later replaces.
    pub async fn find_in_files(&self, query: SearchQuery) -> SearchResult<Vec<ContentMatch>> {
        let generation = self.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let results = self.engine.search(&query, self.root()).await?;

        if query.cancellation.is_cancelled() {
            return Ok(results);
        }
        // A newer search owns the snapshot.
        if self.search_generation.load(Ordering::SeqCst) == generation {
            *self.snapshot.lock() = Some(SearchSnapshot {
                query,
                results: results.clone(),
            });
        }
        Ok(results)
    }

    /// Searches only the given workspace-relative files.
    pub async fn find_in_open_files(
        &self,
        query: SearchQuery,
        open_paths: &[String],
    ) -> SearchResult<Vec<ContentMatch>> {
        self.find_in_files(query.restrict_to(open_paths.iter().cloned())).await
    }

    /// Replaces one match of the last content search.
    pub async fn replace_one(&self, op: &ReplacementOp) -> SearchResult<ReplaceOutcome> {
        let Some(snapshot) = self.snapshot() else {
            return Err(SearchError::StaleReference {
                path: op.path.clone(),
                line: op.line_number,
            });
        };

        let result = self.replacer.replace_one(&snapshot, op).await;
        match &result {
            Err(e) if !e.is_stale() => {}
            _ => self.refresh_snapshot(&snapshot).await,
        }
        result
    }

    /// Replaces every match of the last content search.
    ///
    /// Without recorded matches this does nothing and reports zero attempts.
    pub async fn replace_all(&self, replacement_text: &str) -> ReplaceOutcome {
        let Some(snapshot) = self.snapshot().filter(|s| !s.results.is_empty()) else {
            tracing::debug!("No search results to replace");
            return ReplaceOutcome::default();
        };

        let outcome = self.replacer.replace_all(&snapshot, replacement_text).await;
        self.refresh_snapshot(&snapshot).await;
        outcome
    }

    /// Re-runs the recorded query so the snapshot matches the files again.
    async fn refresh_snapshot(&self, previous: &SearchSnapshot) {
        let query = SearchQuery {
            cancellation: CancellationToken::new(),
            ..previous.query.clone()
        };
        if let Err(e) = self.find_in_files(query).await {
            tracing::warn!("Could not refresh search results: {}", e);
            *self.snapshot.lock() = None;
        }
    }

    /// The last content search and its results.
    pub fn snapshot(&self) -> Option<SearchSnapshot> {
        self.snapshot.lock().clone()
    }

    /// Stops the content search in flight.
    pub fn cancel_search(&self) {
        self.engine.cancel();
    }

    /// The file enumeration strategy in use.
    pub fn detect_search_tool(&self) -> SearchTool {
        self.detector.detect()
    }

    /// Forgets the cached file listing.
    pub async fn clear_file_cache(&self) {
        self.cache.lock().await.clear();
    }

    /// Forgets the detected tool so the next enumeration probes again.
    pub fn clear_tool_detection(&self) {
        self.detector.clear();
    }

    /// Reads a file for the preview pane.
    pub async fn preview(
        &self,
        relative_path: &str,
        highlight_line: Option<u64>,
    ) -> SearchResult<FilePreview> {
        read_preview(self.fs.as_ref(), self.root(), relative_path, highlight_line).await
    }
}
