//! Search query and result types.

use std::collections::BTreeSet;
use std::ops::Range;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_MAX_RESULTS;

/// What the panel is currently searching for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchMode {
    /// Rank workspace paths against the query.
    #[default]
    FindFiles,

    /// Search file contents across the workspace.
    FindInFiles,

    /// Search the contents of the files open in the editor.
    FindInOpenFiles,
}

impl SearchMode {
    /// Returns the panel title for the mode.
    pub fn title(&self) -> &'static str {
        match self {
            Self::FindFiles => "Find Files",
            Self::FindInFiles => "Find in Files",
            Self::FindInOpenFiles => "Find in Open Files",
        }
    }

    /// Whether the mode produces content matches.
    pub fn is_content_search(&self) -> bool {
        !matches!(self, Self::FindFiles)
    }
}

/// Toggles shared by file and content searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub is_regex: bool,
}

/// A ranked workspace path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMatch {
    /// Workspace-relative path.
    pub path: String,

    /// Higher (or less negative) is better.
    pub score: i64,

    /// Byte ranges of `path` to mark, ordered and non-overlapping.
    pub highlight_ranges: Vec<Range<usize>>,

    /// `path` with the ranges wrapped in `<mark>` and the rest HTML-escaped.
    pub highlighted_path: String,
}

/// One match on a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMatchSpan {
    /// 1-based line the match starts on.
    pub line_number: u64,

    /// 0-based byte offset of the match within that line.
    pub column: usize,

    pub match_text: String,
    pub text_before_match: String,
    pub text_after_match: String,
}

impl ContentMatchSpan {
    /// Length of the matched text in bytes.
    pub fn len(&self) -> usize {
        self.match_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.match_text.is_empty()
    }
}

/// All matches found on one line of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMatch {
    /// Workspace-relative path.
    pub path: String,

    /// 1-based line number. Every span starts on this line.
    pub line_number: u64,

    /// Column of the first span.
    pub primary_column: usize,

    /// The line, without its line terminator. A multi-line match also carries
    /// the lines it runs into.
    pub line_text: String,

    /// Never empty.
    pub spans: Vec<ContentMatchSpan>,

    /// File modification time when the search ran, in milliseconds since the epoch.
    pub modified_time_millis: u64,
}

/// Parameters of one content search.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub is_regex: bool,
    pub include_globs: Vec<String>,
    pub exclude_globs: Vec<String>,

    /// Workspace-relative files to search instead of the whole workspace.
    /// Include globs are ignored when this is set.
    pub restrict_to_paths: Option<Vec<String>>,

    pub max_results: usize,

    /// Cancelled by the caller to abandon the search.
    pub cancellation: CancellationToken,
}

impl SearchQuery {
    /// Creates a query with default toggles and result cap.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            case_sensitive: false,
            whole_word: false,
            is_regex: false,
            include_globs: Vec::new(),
            exclude_globs: Vec::new(),
            restrict_to_paths: None,
            max_results: DEFAULT_MAX_RESULTS,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.case_sensitive = options.case_sensitive;
        self.whole_word = options.whole_word;
        self.is_regex = options.is_regex;
        self
    }

    pub fn include_globs(mut self, globs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.include_globs = globs.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude_globs(mut self, globs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude_globs = globs.into_iter().map(Into::into).collect();
        self
    }

    pub fn restrict_to(mut self, paths: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.restrict_to_paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// The toggles of this query.
    pub fn options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: self.case_sensitive,
            whole_word: self.whole_word,
            is_regex: self.is_regex,
        }
    }

    /// Whether the query text spans several lines.
    pub fn is_multiline(&self) -> bool {
        self.text.contains('\n')
    }

    /// The same query, limited to one file, with a fresh cancellation token.
    pub fn scoped_to(&self, path: &str) -> Self {
        Self {
            restrict_to_paths: Some(vec![path.to_string()]),
            cancellation: CancellationToken::new(),
            ..self.clone()
        }
    }
}

/// A single substitution to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementOp {
    pub path: String,
    pub line_number: u64,
    pub column: usize,
    pub length: usize,
    pub replacement_text: String,
}

/// What a replace request achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOutcome {
    /// Matches the request covered.
    pub attempted_count: usize,

    /// Matches actually replaced.
    pub succeeded_count: usize,

    /// Files left untouched because they could not be updated.
    pub failed_paths: BTreeSet<String>,
}

impl ReplaceOutcome {
    /// Whether there was nothing to replace at all.
    pub fn is_noop(&self) -> bool {
        self.attempted_count == 0
    }

    /// Whether some files failed while others succeeded.
    pub fn is_partial(&self) -> bool {
        !self.failed_paths.is_empty() && self.succeeded_count > 0
    }

    /// Whether every attempted match was replaced.
    pub fn is_complete(&self) -> bool {
        self.failed_paths.is_empty() && self.succeeded_count == self.attempted_count
    }
}

/// The last content search and what it found.
#[derive(Debug, Clone)]
pub struct SearchSnapshot {
    pub query: SearchQuery,
    pub results: Vec<ContentMatch>,
}

impl SearchSnapshot {
    /// Finds the recorded hit for a line.
    pub fn find(&self, path: &str, line_number: u64) -> Option<&ContentMatch> {
        self.results
            .iter()
            .find(|m| m.path == path && m.line_number == line_number)
    }

    /// Number of individual matches across all lines.
    pub fn total_count(&self) -> usize {
        self.results.iter().map(|m| m.spans.len()).sum()
    }
}
