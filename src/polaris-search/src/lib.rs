#![allow(
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::uninlined_format_args
)]
//! Polaris Search - file finding, content search and replace for the search panel.
//!
//! This crate drives external search tools (`fd`, `rg`) and falls back to an
//! in-process directory walk when neither is installed. Content searches run a
//! single streamed `rg --json` process that can be capped and cancelled, and
//! replacements are re-validated against the files before they are written.
//!
//! # Features
//!
//! - Tool detection with `fd`, `rg` and directory-walk strategies
//! - Fuzzy and regex file name matching using nucleo-matcher
//! - Content search with globs, whole-word, case and multiline toggles
//! - Replace one or all matches with modification-time staleness checks
//! - File previews with language detection
//!
//! # Example
//!
//! ```no_run
//! use polaris_search::{MatchOptions, SearchConfig, SearchService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = SearchService::new(SearchConfig::new("/path/to/project"));
//!
//!     for file in service.find_files("main", MatchOptions::default()).await? {
//!         println!("{}: {}", file.score, file.path);
//!     }
//!
//!     let hits = service.find_in_files(service.query("TODO")).await?;
//!     for hit in hits {
//!         println!("{}:{}: {}", hit.path, hit.line_number, hit.line_text);
//!     }
//!     Ok(())
//! }
//! ```

mod cache;
mod config;
mod content;
mod enumerate;
mod error;
mod host;
mod matcher;
mod preview;
mod process;
mod replace;
mod result;
mod ripgrep;
mod service;
mod tool;

#[cfg(test)]
mod tests;

pub use cache::{CacheEntry, CacheStats, FileCache};
pub use config::{
    DEFAULT_CANCEL_GRACE, DEFAULT_FILE_RESULT_LIMIT, DEFAULT_MAX_RESULTS, EXCLUDED_DIRS,
    SearchConfig, SearchConfigBuilder, SearchSettings,
};
pub use content::ContentSearchEngine;
pub use enumerate::{FileEnumerator, fd_args, ripgrep_args};
pub use error::{SearchError, SearchResult};
pub use host::{LocalFs, TextEdit, WorkspaceFs};
pub use matcher::{FuzzyMatcher, escape_html, highlight, matches_whole_word};
pub use preview::{FilePreview, PreviewWindow, detect_language, read_preview};
pub use process::ToolCommand;
pub use replace::{ReplaceCoordinator, apply_edits};
pub use result::{
    ContentMatch, ContentMatchSpan, FileMatch, MatchOptions, ReplaceOutcome, ReplacementOp,
    SearchMode, SearchQuery, SearchSnapshot,
};
pub use ripgrep::{MatchCollector, RgMatch, content_search_args, parse_match_line};
pub use service::SearchService;
pub use tool::{SearchTool, ToolDetector};

/// Re-export for callers that create cancellation tokens.
pub use tokio_util::sync::CancellationToken;
