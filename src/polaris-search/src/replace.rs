//! Applying replacements to files matched by an earlier content search.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::content::ContentSearchEngine;
use crate::error::{SearchError, SearchResult};
use crate::host::{TextEdit, WorkspaceFs};
use crate::result::{ReplaceOutcome, ReplacementOp, SearchQuery, SearchSnapshot};

/// A replacement resolved against the recorded search results.
#[derive(Debug, Clone)]
struct Target {
    line_number: u64,
    column: usize,
    expected: String,
    replacement: String,
}

/// Replaces recorded matches, re-checking files that changed since the search.
pub struct ReplaceCoordinator {
    engine: Arc<ContentSearchEngine>,
    fs: Arc<dyn WorkspaceFs>,
    root: PathBuf,
}

impl std::fmt::Debug for ReplaceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaceCoordinator")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl ReplaceCoordinator {
    pub fn new(
        engine: Arc<ContentSearchEngine>,
        fs: Arc<dyn WorkspaceFs>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            fs,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Replaces a single recorded match.
    ///
    /// Fails with a stale error when the match is not part of `snapshot` or is
    /// gone from the file. A file that cannot be updated is reported in
    /// `failed_paths`.
    pub async fn replace_one(
        &self,
        snapshot: &SearchSnapshot,
        op: &ReplacementOp,
    ) -> SearchResult<ReplaceOutcome> {
        let target = resolve(snapshot, op)?;

        let mut outcome = ReplaceOutcome {
            attempted_count: 1,
            ..Default::default()
        };
        match self.replace_in_file(snapshot, &op.path, vec![target]).await {
            Ok(count) => outcome.succeeded_count = count,
            Err(e) if e.is_stale() => return Err(e),
            Err(e) => {
                tracing::warn!("Replace in {} failed: {}", op.path, e);
                outcome.failed_paths.insert(op.path.clone());
            }
        }
        Ok(outcome)
    }

    /// Replaces every match of `snapshot` with `replacement_text`.
    pub async fn replace_all(
        &self,
        snapshot: &SearchSnapshot,
        replacement_text: &str,
    ) -> ReplaceOutcome {
        let ops: Vec<ReplacementOp> = snapshot
            .results
            .iter()
            .flat_map(|hit| {
                hit.spans.iter().map(|span| ReplacementOp {
                    path: hit.path.clone(),
                    line_number: span.line_number,
                    column: span.column,
                    length: span.len(),
                    replacement_text: replacement_text.to_string(),
                })
            })
            .collect();

        self.replace_batch(snapshot, ops).await
    }

    /// Applies `ops` file by file.
    ///
    /// A file that fails is skipped and named in `failed_paths`; the other
    /// files are still updated.
    pub async fn replace_batch(
        &self,
        snapshot: &SearchSnapshot,
        ops: Vec<ReplacementOp>,
    ) -> ReplaceOutcome {
        let mut outcome = ReplaceOutcome::default();
        if ops.is_empty() {
            tracing::debug!("Nothing to replace");
            return outcome;
        }

        let mut by_file: BTreeMap<String, Vec<ReplacementOp>> = BTreeMap::new();
        for op in ops {
            by_file.entry(op.path.clone()).or_default().push(op);
        }

        for (path, ops) in by_file {
            outcome.attempted_count += ops.len();

            let targets: SearchResult<Vec<Target>> =
                ops.iter().map(|op| resolve(snapshot, op)).collect();
            let result = match targets {
                Ok(targets) => self.replace_in_file(snapshot, &path, targets).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(count) => outcome.succeeded_count += count,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path, e);
                    outcome.failed_paths.insert(path);
                }
            }
        }

        if outcome.failed_paths.is_empty() {
            tracing::info!("Replaced {} matches", outcome.succeeded_count);
        } else {
            tracing::warn!(
                "Replaced {} of {} matches, {} files failed",
                outcome.succeeded_count,
                outcome.attempted_count,
                outcome.failed_paths.len()
            );
        }
        outcome
    }

    async fn replace_in_file(
        &self,
        snapshot: &SearchSnapshot,
        path: &str,
        mut targets: Vec<Target>,
    ) -> SearchResult<usize> {
        let absolute = self.root.join(path);

        let recorded = snapshot
            .results
            .iter()
            .find(|hit| hit.path == path)
            .map(|hit| hit.modified_time_millis);
        let current = self.fs.modified_millis(&absolute).await?;

        if recorded != Some(current) {
            tracing::debug!("{} changed since the search, locating matches again", path);
            targets = self.relocate(&snapshot.query, path, targets).await?;
        }

        // Later edits first so earlier offsets stay valid.
        targets.sort_by(|a, b| (b.line_number, b.column).cmp(&(a.line_number, a.column)));
        targets.dedup_by(|a, b| a.line_number == b.line_number && a.column == b.column);

        let buffer = self.fs.open_buffer_text(&absolute).await;
        let text = match &buffer {
            Some(text) => text.clone(),
            None => self.fs.read_to_string(&absolute).await?,
        };

        let edits = compute_edits(&text, path, &targets)?;

        if buffer.is_some() {
            self.fs.apply_buffer_edits(&absolute, &edits).await?;
        } else {
            let updated = apply_edits(&text, &edits).ok_or_else(|| {
                SearchError::Other(anyhow::anyhow!("Edits for {path} overlap"))
            })?;
            self.fs.write(&absolute, &updated).await?;
        }

        tracing::debug!("Replaced {} matches in {}", edits.len(), path);
        Ok(edits.len())
    }

    /// Finds the current position of each target with a search scoped to the file.
    ///
    /// A target moves to the closest fresh match on the same line with the same
    /// text. If one has none, the whole file is stale.
    async fn relocate(
        &self,
        query: &SearchQuery,
        path: &str,
        targets: Vec<Target>,
    ) -> SearchResult<Vec<Target>> {
        let fresh = self.engine.search(&query.scoped_to(path), &self.root).await?;
        let mut available: Vec<_> = fresh
            .iter()
            .filter(|hit| hit.path == path)
            .flat_map(|hit| hit.spans.iter())
            .collect();

        let mut relocated = Vec::with_capacity(targets.len());
        for target in targets {
            let closest = available
                .iter()
                .enumerate()
                .filter(|(_, span)| {
                    span.line_number == target.line_number && span.match_text == target.expected
                })
                .min_by_key(|(_, span)| span.column.abs_diff(target.column))
                .map(|(idx, _)| idx);

            let Some(idx) = closest else {
                return Err(SearchError::stale_match(path, target.line_number, target.column));
            };
            let span = available.swap_remove(idx);
            relocated.push(Target {
                column: span.column,
                ..target
            });
        }
        Ok(relocated)
    }
}

/// Looks up the recorded span a replacement refers to.
fn resolve(snapshot: &SearchSnapshot, op: &ReplacementOp) -> SearchResult<Target> {
    let stale = || SearchError::StaleReference {
        path: op.path.clone(),
        line: op.line_number,
    };

    let span = snapshot
        .results
        .iter()
        .filter(|hit| hit.path == op.path)
        .flat_map(|hit| hit.spans.iter())
        .find(|span| span.line_number == op.line_number && span.column == op.column)
        .ok_or_else(stale)?;

    if span.len() != op.length {
        return Err(stale());
    }

    Ok(Target {
        line_number: op.line_number,
        column: op.column,
        expected: span.match_text.clone(),
        replacement: op.replacement_text.clone(),
    })
}

/// Byte offset at which 1-based `line_number` starts.
fn line_start(text: &str, line_number: u64) -> Option<usize> {
    match line_number {
        0 => None,
        1 => Some(0),
        n => text
            .match_indices('\n')
            .nth((n - 2) as usize)
            .map(|(idx, _)| idx + 1),
    }
}

/// Turns targets sorted from last to first into edits, checking each one
/// still covers its recorded text.
fn compute_edits(text: &str, path: &str, targets: &[Target]) -> SearchResult<Vec<TextEdit>> {
    let mut edits: Vec<TextEdit> = Vec::with_capacity(targets.len());

    for target in targets {
        let stale = || SearchError::stale_match(path, target.line_number, target.column);

        let start = line_start(text, target.line_number).ok_or_else(stale)? + target.column;
        let range = start..start + target.expected.len();
        if text.get(range.clone()) != Some(target.expected.as_str()) {
            return Err(stale());
        }
        if edits.last().is_some_and(|prev| range.end > prev.range.start) {
            return Err(stale());
        }

        edits.push(TextEdit {
            range,
            new_text: target.replacement.clone(),
        });
    }

    Ok(edits)
}

/// Applies edits sorted from the end of `text` towards its start.
///
/// Returns `None` if an edit is out of order or splits a character.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> Option<String> {
    let mut updated = text.to_string();
    let mut limit = text.len();

    for edit in edits {
        let range = edit.range.clone();
        if range.start > range.end
            || range.end > limit
            || !updated.is_char_boundary(range.start)
            || !updated.is_char_boundary(range.end)
        {
            return None;
        }
        updated.replace_range(range.clone(), &edit.new_text);
        limit = range.start;
    }

    Some(updated)
}
