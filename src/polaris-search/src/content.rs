//! Content search: one ripgrep process per query, streamed and cancellable.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::OwnedMutexGuard;
use tokio_util::sync::CancellationToken;

use crate::config::SearchConfig;
use crate::enumerate::validate_root;
use crate::error::{SearchError, SearchResult};
use crate::process::{ToolCommand, collect_stderr, kill, spawn_stderr_reader, terminate};
use crate::result::{ContentMatch, SearchQuery};
use crate::ripgrep::{MatchCollector, content_search_args};

#[derive(Debug)]
struct ActiveSearch {
    id: u64,
    token: CancellationToken,
}

/// Runs content searches, at most one process at a time.
///
/// Starting a search cancels the one in flight, and the new process is only
/// spawned once the previous one has exited.
#[derive(Debug)]
pub struct ContentSearchEngine {
    command: ToolCommand,
    grace: Duration,
    next_id: AtomicU64,
    active: Mutex<Option<ActiveSearch>>,
    process_slot: Arc<tokio::sync::Mutex<()>>,
}

impl ContentSearchEngine {
    pub fn new(config: &SearchConfig) -> Self {
        Self::with_command(ToolCommand::new(config.ripgrep_program()), config.cancel_grace)
    }

    /// Creates an engine that runs `command` in place of `rg`.
    pub fn with_command(command: ToolCommand, grace: Duration) -> Self {
        Self {
            command,
            grace,
            next_id: AtomicU64::new(0),
            active: Mutex::new(None),
            process_slot: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn command(&self) -> &ToolCommand {
        &self.command
    }

    /// Searches file contents under `root`.
    ///
    /// Returns an empty list without spawning anything for a blank query, an
    /// already cancelled token or an empty file restriction. Cancellation
    /// while running also yields an empty list.
    pub async fn search(
        &self,
        query: &SearchQuery,
        root: &Path,
    ) -> SearchResult<Vec<ContentMatch>> {
        if query.text.trim().is_empty()
            || query.cancellation.is_cancelled()
            || query.max_results == 0
        {
            return Ok(Vec::new());
        }
        if query.restrict_to_paths.as_ref().is_some_and(Vec::is_empty) {
            return Ok(Vec::new());
        }
        validate_root(root)?;

        let token = query.cancellation.child_token();
        let id = self.begin(token.clone());
        let result = self.run(query, root, &token).await;
        self.finish(id);
        result
    }

    /// Cancels the search in flight, if any.
    pub fn cancel(&self) {
        if let Some(active) = self.active.lock().take() {
            active.token.cancel();
        }
    }

    /// Whether a search is currently running.
    pub fn is_searching(&self) -> bool {
        self.active.lock().is_some()
    }

    fn begin(&self, token: CancellationToken) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let previous = self.active.lock().replace(ActiveSearch { id, token });
        if let Some(previous) = previous {
            tracing::debug!("Superseding content search #{}", previous.id);
            previous.token.cancel();
        }
        id
    }

    fn finish(&self, id: u64) {
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|a| a.id == id) {
            *active = None;
        }
    }

    async fn run(
        &self,
        query: &SearchQuery,
        root: &Path,
        token: &CancellationToken,
    ) -> SearchResult<Vec<ContentMatch>> {
        let slot = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(Vec::new()),
            slot = Arc::clone(&self.process_slot).lock_owned() => slot,
        };

        let args = content_search_args(query, root);
        tracing::debug!(
            "Running {} for '{}' under {}",
            self.command.display_name(),
            query.text,
            root.display()
        );

        let mut cmd = self.command.command(&args);
        cmd.current_dir(root);
        let mut child = cmd
            .spawn()
            .map_err(|e| SearchError::spawn(self.command.display_name(), e))?;

        let stdout = child.stdout.take().ok_or_else(|| SearchError::StreamUnavailable {
            program: self.command.display_name(),
            stream: "stdout",
        })?;
        let stderr_task = spawn_stderr_reader(&mut child);

        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        let mut collector = MatchCollector::new(root, query.max_results);

        loop {
            buf.clear();
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    self.abandon(child, slot);
                    return Ok(Vec::new());
                }
                read = reader.read_until(b'\n', &mut buf) => match read {
                    Ok(0) => break,
                    Ok(_) => {
                        let Ok(line) = std::str::from_utf8(&buf) else {
                            tracing::trace!("Skipping search output line that is not UTF-8");
                            continue;
                        };
                        if collector.push_line(line).await {
                            tracing::debug!(
                                "Result cap of {} reached, stopping search",
                                query.max_results
                            );
                            kill(&mut child).await;
                            return Ok(collector.into_results());
                        }
                    }
                    Err(e) => {
                        kill(&mut child).await;
                        return Err(e.into());
                    }
                },
            }
        }

        let status = tokio::select! {
            biased;
            _ = token.cancelled() => {
                self.abandon(child, slot);
                return Ok(Vec::new());
            }
            status = child.wait() => status?,
        };
        let stderr = collect_stderr(stderr_task).await;

        match status.code() {
            // 1 means the search ran and found nothing.
            Some(0 | 1) => {
                tracing::info!("Content search found {} matching lines", collector.len());
                Ok(collector.into_results())
            }
            code => Err(SearchError::process_failed(
                self.command.display_name(),
                code,
                stderr,
            )),
        }
    }

    /// Stops a cancelled process in the background.
    ///
    /// The process slot stays held until the process is gone, so the next
    /// search cannot overlap it.
    fn abandon(&self, mut child: Child, slot: OwnedMutexGuard<()>) {
        tracing::debug!("Content search cancelled");
        let grace = self.grace;
        tokio::spawn(async move {
            terminate(&mut child, grace).await;
            drop(slot);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn engine() -> ContentSearchEngine {
        ContentSearchEngine::with_command(
            ToolCommand::new("/nonexistent/rg"),
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn test_blank_query_does_not_spawn() {
        let temp_dir = TempDir::new().unwrap();
        let results = engine()
            .search(&SearchQuery::new("  \t"), temp_dir.path())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_token_does_not_spawn() {
        let temp_dir = TempDir::new().unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let query = SearchQuery::new("foo").cancellation(token);
        let results = engine().search(&query, temp_dir.path()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_restriction_does_not_spawn() {
        let temp_dir = TempDir::new().unwrap();
        let query = SearchQuery::new("foo").restrict_to(Vec::<String>::new());
        let results = engine().search(&query, temp_dir.path()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let engine = engine();
        let err = engine
            .search(&SearchQuery::new("foo"), temp_dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Spawn { .. }));
        assert!(!engine.is_searching());
    }

    #[tokio::test]
    async fn test_missing_root_is_reported() {
        let err = engine()
            .search(&SearchQuery::new("foo"), Path::new("/nonexistent/polaris"))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::RootNotFound(_)));
    }
}
